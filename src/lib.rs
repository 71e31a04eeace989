//! sortbox - sort files into category folders by extension
//!
//! This library loads an extension-to-category map (built in, or from a
//! JSON file beside the executable), scans a directory tree for files with
//! known extensions, and copies or moves them into `organized/<category>/`.

pub mod cli;
pub mod config;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod scanner;

pub use config::{ConfigError, ConfigSource};
pub use error::{Result, SortboxError};
pub use file_category::ExtensionMap;
pub use file_organizer::{ConflictPolicy, FileOrganizer, TransferError, TransferMode};
pub use scanner::{Classification, ScanError, Scanner};

pub use cli::{Cli, RunOptions, RunSummary, run};
