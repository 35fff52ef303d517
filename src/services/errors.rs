use crate::models::ModTypeError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort processing of a single `.ini` file (or a whole run, for
/// option errors raised before any file is touched)
#[derive(Error, Debug)]
pub enum RemapError {
    #[error("The section by the name '{0}' does not exist")]
    SectionNotFound(String),

    #[error("No mod type specified when fixing the .ini file")]
    NoModType,

    #[error("Options {} cannot be used together", .0.join(", "))]
    ConflictingOptions(Vec<String>),

    #[error("Unknown mod type: {0}")]
    InvalidModType(String),

    #[error(transparent)]
    ModType(#[from] ModTypeError),

    #[error("Invalid managed resource pattern: {0}")]
    InvalidResourcePattern(#[from] regex::Error),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
