use crate::config::ConfigError;
use crate::file_organizer::TransferError;
use crate::scanner::ScanError;
use thiserror::Error;

/// Any failure that ends a run, tagged with the stage it came from.
#[derive(Error, Debug)]
pub enum SortboxError {
    #[error("Error loading extension map: {0}")]
    Config(#[from] ConfigError),

    #[error("Error scanning files: {0}")]
    Scan(#[from] ScanError),

    #[error("Error transferring files: {0}")]
    Transfer(#[from] TransferError),
}

/// Result type for sortbox operations.
pub type Result<T> = std::result::Result<T, SortboxError>;
