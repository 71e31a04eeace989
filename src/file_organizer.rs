/// File transfer engine for relocating classified files.
///
/// This module copies or moves each classified file into
/// `<output>/<category>/<basename>`, creating category directories on demand.
/// The first failure aborts the run; files transferred before it stay where
/// they were put.
use crate::output::OutputFormatter;
use crate::scanner::Classification;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How a file is relocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode {
    /// Stream a byte-for-byte copy and leave the source in place.
    #[default]
    Copy,
    /// Rename the file, removing it from its original location.
    Move,
}

impl TransferMode {
    /// Past-tense verb used in transfer log lines.
    pub fn past_tense(&self) -> &'static str {
        match self {
            TransferMode::Copy => "Copied",
            TransferMode::Move => "Moved",
        }
    }

    /// Infinitive verb used in dry-run lines.
    pub fn verb(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}

/// What happens when the destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ConflictPolicy {
    /// Replace the existing file silently.
    #[default]
    Overwrite,
    /// Leave the existing file alone and skip the source.
    Skip,
    /// Abort the run.
    Error,
}

/// Errors that can occur during file transfer operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// Failed to open or stat the source file.
    #[error("Failed to open source file {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Failed to create the destination file.
    #[error("Failed to create destination file {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    /// Streaming the bytes failed part way.
    #[error("Failed to copy from {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// The copy finished with a different length than the source.
    #[error(
        "Incomplete copy from {} to {}: wrote {written} of {expected} bytes",
        .from.display(),
        .to.display()
    )]
    Verify {
        from: PathBuf,
        to: PathBuf,
        written: u64,
        expected: u64,
    },

    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// The source could not be removed after a cross-device move.
    #[error("Failed to remove {} after copying it to {}: {source}", .from.display(), .to.display())]
    Remove {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// The destination exists and the conflict policy forbids replacing it.
    #[error("Destination {} already exists (source {})", .to.display(), .from.display())]
    DestinationExists { from: PathBuf, to: PathBuf },

    /// The source path ends in `..` or is a root.
    #[error("Source path {} has no file name", .path.display())]
    MissingFileName { path: PathBuf },
}

/// Result type for file transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// A single file relocation, completed or planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The path of the file before the transfer.
    pub original_path: PathBuf,
    /// The path of the file after the transfer.
    pub new_path: PathBuf,
    /// The category directory the file went to.
    pub category: String,
    /// Number of bytes transferred.
    pub bytes: u64,
}

/// Why a classified file was not transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination exists and the policy is [`ConflictPolicy::Skip`].
    DestinationExists,
    /// The source already sits at its destination.
    AlreadyInPlace,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DestinationExists => write!(f, "destination already exists"),
            SkipReason::AlreadyInPlace => write!(f, "already in place"),
        }
    }
}

/// A classified file that was left where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    pub reason: SkipReason,
}

/// The result of handling one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Transferred(Operation),
    Planned(Operation),
    Skipped(SkippedFile),
}

/// Everything the transfer loop did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Files copied or moved.
    pub transferred: Vec<Operation>,
    /// Transfers a dry run would have performed.
    pub planned: Vec<Operation>,
    /// Files left untouched.
    pub skipped: Vec<SkippedFile>,
}

impl TransferReport {
    /// Total bytes written by completed transfers.
    pub fn bytes_transferred(&self) -> u64 {
        self.transferred.iter().map(|op| op.bytes).sum()
    }
}

/// Relocates classified files into category directories under an output root.
///
/// # Examples
///
/// ```no_run
/// use sortbox::file_organizer::{FileOrganizer, TransferMode};
/// use std::path::Path;
///
/// let organizer = FileOrganizer::new("organized").with_mode(TransferMode::Move);
/// let outcome = organizer.transfer_one(Path::new("/downloads/cat.jpg"), "image");
/// match outcome {
///     Ok(outcome) => println!("{:?}", outcome),
///     Err(e) => eprintln!("Transfer failed: {}", e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    output_root: PathBuf,
    mode: TransferMode,
    conflict: ConflictPolicy,
    dry_run: bool,
}

impl FileOrganizer {
    /// Creates an organizer that copies into `output_root`, overwriting conflicts.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            mode: TransferMode::default(),
            conflict: ConflictPolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_conflict_policy(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }

    /// When set, nothing on disk is changed and transfers are only reported.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Computes `<output>/<category>/<basename>` for a source file.
    pub fn destination_for(&self, source: &Path, category: &str) -> TransferResult<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| TransferError::MissingFileName {
                path: source.to_path_buf(),
            })?;
        Ok(self.output_root.join(category).join(file_name))
    }

    /// Transfers one file into its category directory.
    ///
    /// The category directory (and any missing parents) is created first.
    /// An existing destination is handled according to the conflict policy;
    /// a source that already is its own destination is always skipped.
    pub fn transfer_one(&self, source: &Path, category: &str) -> TransferResult<Outcome> {
        let destination = self.destination_for(source, category)?;

        if destination.exists() {
            if is_same_file(source, &destination) {
                return Ok(Outcome::Skipped(SkippedFile {
                    original_path: source.to_path_buf(),
                    new_path: destination,
                    reason: SkipReason::AlreadyInPlace,
                }));
            }
            match self.conflict {
                ConflictPolicy::Overwrite => {
                    log::debug!("Overwriting {}", destination.display());
                }
                ConflictPolicy::Skip => {
                    return Ok(Outcome::Skipped(SkippedFile {
                        original_path: source.to_path_buf(),
                        new_path: destination,
                        reason: SkipReason::DestinationExists,
                    }));
                }
                ConflictPolicy::Error => {
                    return Err(TransferError::DestinationExists {
                        from: source.to_path_buf(),
                        to: destination,
                    });
                }
            }
        }

        if self.dry_run {
            let bytes = fs::metadata(source)
                .map_err(|e| TransferError::Open {
                    path: source.to_path_buf(),
                    source: e,
                })?
                .len();
            return Ok(Outcome::Planned(Operation {
                original_path: source.to_path_buf(),
                new_path: destination,
                category: category.to_string(),
                bytes,
            }));
        }

        if let Some(category_dir) = destination.parent() {
            fs::create_dir_all(category_dir).map_err(|source| TransferError::CreateDir {
                path: category_dir.to_path_buf(),
                source,
            })?;
        }

        let bytes = match self.mode {
            TransferMode::Copy => copy_verified(source, &destination)?,
            TransferMode::Move => move_file(source, &destination)?,
        };

        Ok(Outcome::Transferred(Operation {
            original_path: source.to_path_buf(),
            new_path: destination,
            category: category.to_string(),
            bytes,
        }))
    }

    /// Transfers every classified file, stopping at the first failure.
    ///
    /// Prints one line per file as it is handled.
    pub fn transfer_all(&self, classification: &Classification) -> TransferResult<TransferReport> {
        let pb = OutputFormatter::create_progress_bar(classification.len() as u64);
        let mut report = TransferReport::default();

        for (path, category) in classification.iter() {
            let outcome = self
                .transfer_one(path, category)
                .inspect_err(|e| {
                    log::error!("{}", e);
                    pb.abandon();
                })?;

            match outcome {
                Outcome::Transferred(operation) => {
                    pb.suspend(|| {
                        OutputFormatter::plain(&OutputFormatter::transfer_line(
                            self.mode, &operation,
                        ))
                    });
                    report.transferred.push(operation);
                }
                Outcome::Planned(operation) => {
                    pb.suspend(|| OutputFormatter::dry_run_notice(self.mode, &operation));
                    report.planned.push(operation);
                }
                Outcome::Skipped(skipped) => {
                    pb.suspend(|| OutputFormatter::skipped(&skipped));
                    report.skipped.push(skipped);
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        log::info!(
            "{} files {}, {} skipped, {} bytes",
            report.transferred.len(),
            self.mode.past_tense().to_lowercase(),
            report.skipped.len(),
            report.bytes_transferred()
        );
        Ok(report)
    }
}

/// Streams `source` into `destination` and checks the written length.
///
/// Both handles are closed before returning, on success or failure.
pub fn copy_verified(source: &Path, destination: &Path) -> TransferResult<u64> {
    let src_file = File::open(source).map_err(|e| TransferError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;
    let expected = src_file
        .metadata()
        .map_err(|e| TransferError::Open {
            path: source.to_path_buf(),
            source: e,
        })?
        .len();

    let dest_file = File::create(destination).map_err(|e| TransferError::Create {
        path: destination.to_path_buf(),
        source: e,
    })?;

    stream_verified(src_file, dest_file, expected, source, destination)
}

/// Streams `reader` into `writer`, failing unless exactly `expected` bytes arrive.
fn stream_verified<R: Read, W: Write>(
    reader: R,
    writer: W,
    expected: u64,
    source: &Path,
    destination: &Path,
) -> TransferResult<u64> {
    let copy_error = |e: io::Error| TransferError::Copy {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };
    let mut reader = BufReader::new(reader);
    let mut writer = BufWriter::new(writer);
    let written = io::copy(&mut reader, &mut writer).map_err(copy_error)?;
    writer.flush().map_err(copy_error)?;

    if written != expected {
        return Err(TransferError::Verify {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            written,
            expected,
        });
    }
    Ok(written)
}

/// Renames `source` to `destination`.
///
/// Falls back to a verified copy plus removal when the two paths are on
/// different filesystems.
pub fn move_file(source: &Path, destination: &Path) -> TransferResult<u64> {
    move_file_with(source, destination, |from, to| fs::rename(from, to))
}

fn move_file_with<F>(source: &Path, destination: &Path, rename: F) -> TransferResult<u64>
where
    F: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let bytes = fs::metadata(source)
        .map_err(|e| TransferError::Open {
            path: source.to_path_buf(),
            source: e,
        })?
        .len();

    match rename(source, destination) {
        Ok(()) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "{} and {} are on different devices, copying instead",
                source.display(),
                destination.display()
            );
            let written = copy_verified(source, destination)?;
            fs::remove_file(source).map_err(|e| TransferError::Remove {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                source: e,
            })?;
            Ok(written)
        }
        Err(e) => Err(TransferError::Rename {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        }),
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    #[test]
    fn test_copy_creates_category_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let source = write(base, "a.txt", "hello");
        let organizer = FileOrganizer::new(base.join("organized"));

        let outcome = organizer.transfer_one(&source, "document").unwrap();

        let destination = base.join("organized").join("document").join("a.txt");
        assert!(matches!(outcome, Outcome::Transferred(ref op) if op.new_path == destination));
        assert!(source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "hello");
    }

    #[test]
    fn test_copy_uses_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("out").join("image")).unwrap();
        let source = write(base, "b.jpg", "jpeg bytes");

        let organizer = FileOrganizer::new(base.join("out"));
        organizer.transfer_one(&source, "image").unwrap();

        assert!(base.join("out/image/b.jpg").exists());
    }

    #[test]
    fn test_move_removes_source() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let source = write(base, "c.pdf", "pdf");
        let organizer = FileOrganizer::new(base.join("organized")).with_mode(TransferMode::Move);

        let outcome = organizer.transfer_one(&source, "document").unwrap();

        assert!(matches!(outcome, Outcome::Transferred(ref op) if op.bytes == 3));
        assert!(!source.exists());
        assert_eq!(
            fs::read_to_string(base.join("organized/document/c.pdf")).unwrap(),
            "pdf"
        );
    }

    #[test]
    fn test_overwrite_policy_replaces_destination() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("out/document")).unwrap();
        write(&base.join("out/document"), "a.txt", "old");
        let source = write(base, "a.txt", "new");

        FileOrganizer::new(base.join("out"))
            .transfer_one(&source, "document")
            .unwrap();

        assert_eq!(
            fs::read_to_string(base.join("out/document/a.txt")).unwrap(),
            "new"
        );
    }

    #[test]
    fn test_skip_policy_keeps_destination() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("out/document")).unwrap();
        write(&base.join("out/document"), "a.txt", "old");
        let source = write(base, "a.txt", "new");

        let outcome = FileOrganizer::new(base.join("out"))
            .with_conflict_policy(ConflictPolicy::Skip)
            .transfer_one(&source, "document")
            .unwrap();

        assert!(matches!(
            outcome,
            Outcome::Skipped(SkippedFile {
                reason: SkipReason::DestinationExists,
                ..
            })
        ));
        assert_eq!(
            fs::read_to_string(base.join("out/document/a.txt")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_error_policy_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("out/document")).unwrap();
        write(&base.join("out/document"), "a.txt", "old");
        let source = write(base, "a.txt", "new");

        let result = FileOrganizer::new(base.join("out"))
            .with_conflict_policy(ConflictPolicy::Error)
            .transfer_one(&source, "document");

        assert!(matches!(result, Err(TransferError::DestinationExists { .. })));
    }

    #[test]
    fn test_source_already_in_place_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("out/document")).unwrap();
        let source = write(&base.join("out/document"), "a.txt", "keep me");

        let outcome = FileOrganizer::new(base.join("out"))
            .transfer_one(&source, "document")
            .unwrap();

        assert!(matches!(
            outcome,
            Outcome::Skipped(SkippedFile {
                reason: SkipReason::AlreadyInPlace,
                ..
            })
        ));
        assert_eq!(fs::read_to_string(&source).unwrap(), "keep me");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let source = write(base, "a.txt", "hello");

        let outcome = FileOrganizer::new(base.join("organized"))
            .with_mode(TransferMode::Move)
            .with_dry_run(true)
            .transfer_one(&source, "document")
            .unwrap();

        assert!(matches!(outcome, Outcome::Planned(ref op) if op.bytes == 5));
        assert!(source.exists());
        assert!(!base.join("organized").exists());
    }

    #[test]
    fn test_missing_source_returns_open_error() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let result =
            FileOrganizer::new(base.join("organized")).transfer_one(&base.join("gone.txt"), "document");

        match result {
            Err(TransferError::Open { path, .. }) => assert_eq!(path, base.join("gone.txt")),
            other => panic!("expected Open error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_name() {
        let organizer = FileOrganizer::new("organized");
        let result = organizer.destination_for(Path::new("/"), "document");
        assert!(matches!(result, Err(TransferError::MissingFileName { .. })));
    }

    #[test]
    fn test_transfer_all_stops_at_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let first = write(base, "a.txt", "a");
        let mut classification = Classification::new();
        classification.insert(first.clone(), "document");
        classification.insert(base.join("b_missing.txt"), "document");
        classification.insert(write(base, "c.txt", "c"), "document");

        let result = FileOrganizer::new(base.join("out")).transfer_all(&classification);

        assert!(matches!(result, Err(TransferError::Open { .. })));
        // Sorted order: a.txt went through before the failure, c.txt never ran.
        assert!(base.join("out/document/a.txt").exists());
        assert!(!base.join("out/document/c.txt").exists());
    }

    #[test]
    fn test_transfer_all_report() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let mut classification = Classification::new();
        classification.insert(write(base, "a.txt", "aaa"), "document");
        classification.insert(write(base, "b.png", "bb"), "image");

        let report = FileOrganizer::new(base.join("out"))
            .transfer_all(&classification)
            .unwrap();

        assert_eq!(report.transferred.len(), 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.bytes_transferred(), 5);
    }

    #[test]
    fn test_copy_verified_preserves_binary_content() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("blob.bin");
        let content: Vec<u8> = (0..=255u8).cycle().take(100_000).collect();
        fs::write(&source, &content).unwrap();
        let destination = temp_dir.path().join("copy.bin");

        let written = copy_verified(&source, &destination).unwrap();

        assert_eq!(written, content.len() as u64);
        assert_eq!(fs::read(&destination).unwrap(), content);
    }

    #[test]
    fn test_dry_run_missing_source_returns_open_error() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();

        let result = FileOrganizer::new(base.join("organized"))
            .with_dry_run(true)
            .transfer_one(&base.join("gone.txt"), "document");

        assert!(matches!(result, Err(TransferError::Open { .. })));
        assert!(!base.join("organized").exists());
    }

    #[test]
    fn test_short_stream_fails_verification() {
        let mut sink = Vec::new();

        let result = stream_verified(
            &b"hello"[..],
            &mut sink,
            10,
            Path::new("a.txt"),
            Path::new("out/a.txt"),
        );

        match result {
            Err(TransferError::Verify {
                written, expected, ..
            }) => {
                assert_eq!(written, 5);
                assert_eq!(expected, 10);
            }
            other => panic!("expected Verify error, got {:?}", other),
        }
    }

    #[test]
    fn test_cross_device_move_falls_back_to_copy() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let source = write(base, "d.png", "png bytes");
        let destination = base.join("d_moved.png");

        let bytes = move_file_with(&source, &destination, |_, _| {
            Err(io::Error::from(io::ErrorKind::CrossesDevices))
        })
        .unwrap();

        assert_eq!(bytes, 9);
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "png bytes");
    }

    #[test]
    fn test_other_rename_failure_keeps_source() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let source = write(base, "e.txt", "text");
        let destination = base.join("e_moved.txt");

        let result = move_file_with(&source, &destination, |_, _| {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        });

        assert!(matches!(result, Err(TransferError::Rename { .. })));
        assert!(source.exists());
        assert!(!destination.exists());
    }
}
