use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use varchain_core::store::{DEFAULT_CHAIN_LENGTH, DEFAULT_PREFIX};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB

/// User settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Length of a chain created by `seed`.
    pub chain_length: usize,
    /// Identifier prefix used by `seed`.
    pub prefix: String,
    /// File used when `-f` is not given.
    pub default_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chain_length: DEFAULT_CHAIN_LENGTH,
            prefix: DEFAULT_PREFIX.to_string(),
            default_file: None,
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "varchain")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

/// Load the config from `explicit` or the user config dir.
///
/// Never fails: problems are returned as warnings alongside the defaults.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = explicit.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(config) => Some(config),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

fn parse_config(content: &str) -> Result<Config, String> {
    let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
    if config.chain_length == 0 {
        return Err("chain_length must be at least 1".to_string());
    }
    Ok(config)
}
