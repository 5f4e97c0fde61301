//! Error types for Varchain core.

use thiserror::Error;
use varchain_engine::engine::VarId;

/// Errors that can occur when editing or persisting a variable store
#[derive(Error, Debug)]
pub enum VarchainError {
    #[error("Variable {0} already exists")]
    DuplicateIdentifier(VarId),

    #[error("Variable {0} not found")]
    NotFound(VarId),

    #[error("Circular reference: {}", format_path(.path))]
    CircularReference { id: VarId, path: Vec<VarId> },

    #[error("Variable {id} is referenced by {}", format_list(.by))]
    ReferencedElsewhere { id: VarId, by: Vec<VarId> },

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("No file path set")]
    NoFilePath,
}

fn format_path(path: &[VarId]) -> String {
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_list(ids: &[VarId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}

pub type Result<T> = std::result::Result<T, VarchainError>;
