//! Recursive directory scanning and classification.
//!
//! The scanner walks a root directory, looks up each regular file's extension
//! in an [`ExtensionMap`] and collects the matches into a [`Classification`].
//! The first walk error aborts the scan; no partial result is returned.

use crate::file_category::ExtensionMap;
use glob::Pattern;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Errors that can occur while scanning a directory tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist or cannot be resolved.
    #[error("Invalid scan root {}: {source}", .path.display())]
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An entry under the root could not be read.
    #[error("Failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },

    /// An exclusion pattern is not valid glob syntax.
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },
}

/// The result of a scan: every classified file and its category.
///
/// Paths are absolute and unique. Entries are kept sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    files: BTreeMap<PathBuf, String>,
}

impl Classification {
    /// Creates an empty classification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a file under a category, replacing any previous category.
    pub fn insert(&mut self, path: PathBuf, category: impl Into<String>) {
        self.files.insert(path, category.into());
    }

    /// Returns the category assigned to a path.
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates over `(path, category)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files
            .iter()
            .map(|(path, category)| (path.as_path(), category.as_str()))
    }

    /// Counts classified files per category.
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for category in self.files.values() {
            *counts.entry(category.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Options that narrow what the scanner visits.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// A directory to leave out of the walk, typically the output root.
    pub skip_dir: Option<PathBuf>,
    /// Glob patterns for files and directories to exclude.
    pub exclude: Vec<String>,
}

/// Walks directory trees and classifies the files it finds.
#[derive(Debug)]
pub struct Scanner<'a> {
    map: &'a ExtensionMap,
    skip_dir: Option<PathBuf>,
    exclude: Vec<Pattern>,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner for the given map, compiling the exclusion patterns.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidPattern` if a pattern is not valid glob syntax.
    pub fn new(map: &'a ExtensionMap, options: &ScanOptions) -> Result<Self, ScanError> {
        let exclude = options
            .exclude
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| ScanError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            map,
            skip_dir: options.skip_dir.clone(),
            exclude,
        })
    }

    /// Recursively scans `root` and classifies every regular file whose
    /// extension is in the map.
    ///
    /// The root is canonicalized first, so every recorded path is absolute.
    /// Symbolic links are not followed.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidRoot` if the root cannot be resolved and
    /// `ScanError::Walk` on the first entry that cannot be read.
    pub fn scan(&self, root: &Path) -> Result<Classification, ScanError> {
        let root = fs::canonicalize(root).map_err(|source| ScanError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        })?;
        // The skip directory only matters if it already exists.
        let skip_dir = self
            .skip_dir
            .as_deref()
            .and_then(|dir| fs::canonicalize(dir).ok());

        log::info!("Scanning {}", root.display());

        let mut classification = Classification::new();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(&root, entry, skip_dir.as_deref()));

        for entry in walker {
            let entry = entry.map_err(|source| ScanError::Walk {
                root: root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(category) = self.map.classify(&entry.file_name().to_string_lossy()) else {
                log::trace!("Skipping unmapped file {}", entry.path().display());
                continue;
            };
            log::debug!("{} => {}", entry.path().display(), category);
            classification.insert(entry.into_path(), category);
        }

        log::info!("Classified {} files", classification.len());
        Ok(classification)
    }

    /// Decides whether an entry (and everything below it) is left out.
    fn is_pruned(&self, root: &Path, entry: &DirEntry, skip_dir: Option<&Path>) -> bool {
        if entry.depth() == 0 {
            return false;
        }

        if entry.file_type().is_dir() && skip_dir == Some(entry.path()) {
            log::debug!("Skipping output directory {}", entry.path().display());
            return true;
        }

        if self.exclude.is_empty() {
            return false;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let file_name = entry.file_name().to_string_lossy();
        let excluded = self
            .exclude
            .iter()
            .any(|pattern| pattern.matches_path(relative) || pattern.matches(&file_name));
        if excluded {
            log::debug!("Excluding {}", entry.path().display());
        }
        excluded
    }
}

/// Scans `root` with default options.
///
/// # Examples
///
/// ```no_run
/// use sortbox::file_category::ExtensionMap;
/// use sortbox::scanner::scan_and_classify;
/// use std::path::Path;
///
/// let map = ExtensionMap::builtin();
/// let classification = scan_and_classify(Path::new("."), &map)?;
/// for (path, category) in classification.iter() {
///     println!("{} => {}", path.display(), category);
/// }
/// # Ok::<(), sortbox::scanner::ScanError>(())
/// ```
pub fn scan_and_classify(root: &Path, map: &ExtensionMap) -> Result<Classification, ScanError> {
    Scanner::new(map, &ScanOptions::default())?.scan(root)
}
