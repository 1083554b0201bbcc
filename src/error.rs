//! Error types for cpytools.
//!
//! This module provides the [`Error`] enum containing all possible errors
//! raised by the install and remount operations, and the [`Result`] type
//! alias.
//!
//! # Error Categories
//!
//! | Category | Errors |
//! |----------|--------|
//! | IO | [`Error::Io`], [`Error::TempFile`], [`Error::Persist`] |
//! | Validation | [`Error::SourceNotFound`], [`Error::DestinationNotFound`], [`Error::NotADirectory`], [`Error::IsADirectory`], [`Error::LibDirMissing`] |
//! | Safety | [`Error::SymlinkLoop`] |
//! | Volumes | [`Error::VolumeNotMounted`] |
//! | Commands | [`Error::CommandSpawn`], [`Error::CommandFailed`] |

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for cpytools operations.
///
/// This is a type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Check if an IO error indicates "no space left on device".
///
/// CIRCUITPY drives are small (often 1-2 MB), so running out of space
/// halfway through an install is a realistic failure worth recognising.
///
/// # Platform Support
///
/// | Platform | Error Detection |
/// |----------|-----------------|
/// | Unix | `ENOSPC` (errno 28) |
/// | Windows | `ERROR_DISK_FULL` (0x70) |
///
/// # Example
///
/// ```no_run
/// use std::io;
/// use cpytools::is_no_space_error;
///
/// let error = io::Error::new(io::ErrorKind::StorageFull, "disk full");
/// assert!(is_no_space_error(&error));
/// ```
pub fn is_no_space_error(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::StorageFull {
        return true;
    }

    #[cfg(unix)]
    {
        if let Some(raw_error) = error.raw_os_error() {
            return raw_error == libc::ENOSPC;
        }
    }

    #[cfg(windows)]
    {
        if let Some(raw_error) = error.raw_os_error() {
            const ERROR_DISK_FULL: i32 = 112;
            return raw_error == ERROR_DISK_FULL;
        }
    }

    false
}

/// Errors that can occur during install and remount operations.
///
/// All errors include the path or command involved to aid debugging.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source path does not exist
    #[error("Source path does not exist: {0}")]
    SourceNotFound(PathBuf),

    /// Destination directory does not exist
    #[error("Destination does not exist: {0}")]
    DestinationNotFound(PathBuf),

    /// Path was expected to be a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Source is a directory where a file was expected
    #[error("Source is a directory, expected a file: {0}")]
    IsADirectory(PathBuf),

    /// A file would replace an existing directory
    #[error("Destination is a directory, refusing to replace it with a file: {0}")]
    DestinationIsDirectory(PathBuf),

    /// Destination has no library directory to install into
    #[error("Destination has no library directory: {0}")]
    LibDirMissing(PathBuf),

    /// Failed to create temporary file
    #[error("Failed to create temporary file in {path}: {source}")]
    TempFile {
        /// Directory where temp file creation was attempted
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to persist temporary file
    #[error("Failed to persist temporary file to {path}: {source}")]
    Persist {
        /// Target path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Symlink loop detected (would cause infinite recursion)
    #[error("Symlink loop detected: {0}")]
    SymlinkLoop(PathBuf),

    /// No volume is mounted at the expected mount point
    #[error("No volume named {name} is mounted at {mount_point}")]
    VolumeNotMounted {
        /// Volume name that was looked up
        name: String,
        /// Mount point that was expected
        mount_point: PathBuf,
    },

    /// An external command could not be started
    #[error("Failed to run `{program}`: {source}")]
    CommandSpawn {
        /// Program that was executed
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed ({})", describe_status(.status))]
    CommandFailed {
        /// Full command line, for display
        command: String,
        /// Exit status, `None` when terminated by a signal
        status: Option<i32>,
    },
}

impl Error {
    /// Process exit status a command-line front end should use for this error.
    ///
    /// A failed external command propagates its own exit status; everything
    /// else maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed {
                status: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Whether this error was caused by the destination running out of space.
    pub fn is_no_space(&self) -> bool {
        match self {
            Self::Io(source) | Self::TempFile { source, .. } | Self::Persist { source, .. } => {
                is_no_space_error(source)
            }
            _ => false,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match *status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_owned(),
    }
}
