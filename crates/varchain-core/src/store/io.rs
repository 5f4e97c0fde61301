use super::VariableStore;
use crate::error::{Result, VarchainError};
use crate::storage::{parse_vars, write_vars};
use std::path::{Path, PathBuf};

impl VariableStore {
    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = &self.file_path else {
            return Err(VarchainError::NoFilePath);
        };

        write_vars(path, &self.chain)?;
        self.modified = false;
        log::info!("saved {} variables to {}", self.chain.len(), path.display());
        Ok(path.clone())
    }

    /// Save to `path` and make it the current file path.
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf> {
        self.file_path = Some(path.to_path_buf());
        self.save_file()
    }

    /// Load from file, replacing the current chain.
    ///
    /// Every entry goes through the same checks as [`VariableStore::insert`].
    /// On any failure the current chain is left as it was.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let entries = parse_vars(path)?;

        let previous = std::mem::take(&mut self.chain);
        let was_modified = self.modified;
        for entry in &entries {
            if let Err(err) = self.insert(entry.id.as_str(), &entry.formula) {
                self.chain = previous;
                self.modified = was_modified;
                return Err(VarchainError::Parse {
                    line: entry.line,
                    message: err.to_string(),
                });
            }
        }

        // Pre-evaluate so values are ready after load
        self.recompute_all();

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        log::info!("loaded {} variables from {}", self.chain.len(), path.display());
        Ok(())
    }
}
