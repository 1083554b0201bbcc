//! Single file copy operations.
//!
//! Files are written to a temporary file next to the destination and then
//! renamed into place, so a board that is unplugged mid-install never ends
//! up with a truncated `code.py`.

use crate::error::{Error, Result};
use crate::options::{CopyOptions, OnConflict};
use std::fs::{self, File};
use std::io;
use std::path::Path;

use super::utils::{copy_file_contents, copy_xattrs, preserve_timestamps, remove_existing};

/// Result of a single file copy operation (internal use)
#[derive(Debug, Clone, Copy)]
pub(crate) struct FileCopyResult {
    /// Whether the file was actually copied (false = skipped)
    pub copied: bool,
    /// Number of bytes copied (0 if skipped)
    pub bytes: u64,
}

impl FileCopyResult {
    pub(crate) fn copied(bytes: u64) -> Self {
        Self {
            copied: true,
            bytes,
        }
    }

    pub(crate) fn skipped() -> Self {
        Self {
            copied: false,
            bytes: 0,
        }
    }
}

/// Copy a single file atomically
///
/// Uses temp file + rename pattern to ensure no partial files on interruption.
/// In [`OnConflict::Skip`] mode the rename refuses to replace a file that
/// appeared after the existence check.
///
/// # Returns
///
/// Returns `Ok(true)` if the file was copied, `Ok(false)` if skipped.
///
/// # Errors
///
/// Returns an error if:
/// - Source does not exist ([`Error::SourceNotFound`])
/// - Source is a directory ([`Error::IsADirectory`])
/// - Overwriting and the destination is a directory ([`Error::DestinationIsDirectory`])
/// - IO operations fail ([`Error::Io`])
/// - Temp file creation fails ([`Error::TempFile`])
/// - Atomic rename fails ([`Error::Persist`])
#[must_use = "returns false if file was skipped, check the result"]
pub fn copy_file(src: &Path, dst: &Path, options: &CopyOptions) -> Result<bool> {
    copy_file_internal(src, dst, options).map(|r| r.copied)
}

/// File copy that also reports the number of bytes written.
pub(crate) fn copy_file_internal(
    src: &Path,
    dst: &Path,
    options: &CopyOptions,
) -> Result<FileCopyResult> {
    let src_meta = match fs::metadata(src) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::SourceNotFound(src.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    if src_meta.is_dir() {
        return Err(Error::IsADirectory(src.to_path_buf()));
    }

    match fs::symlink_metadata(dst) {
        Ok(dst_meta) => match options.on_conflict {
            OnConflict::Skip => {
                #[cfg(feature = "tracing")]
                tracing::debug!(dst = %dst.display(), "destination exists, skipping");
                return Ok(FileCopyResult::skipped());
            }
            OnConflict::Overwrite => {
                if dst_meta.is_dir() {
                    return Err(Error::DestinationIsDirectory(dst.to_path_buf()));
                }
                // Regular files are replaced by the rename below; anything
                // else would make the rename fail.
                if !dst_meta.is_file() {
                    remove_existing(dst)?;
                }
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let src_file = File::open(src)?;

    let dst_parent = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp_file = tempfile::Builder::new()
        .prefix(".cpytools")
        .tempfile_in(dst_parent)
        .map_err(|e| Error::TempFile {
            path: dst_parent.to_path_buf(),
            source: e,
        })?;

    let bytes_copied = copy_file_contents(&src_file, temp_file.as_file(), src_meta.len())?;

    if options.fsync {
        temp_file.as_file().sync_all()?;
    }

    if options.preserve_permissions {
        fs::set_permissions(temp_file.path(), src_meta.permissions())?;
    }

    match options.on_conflict {
        OnConflict::Overwrite => {
            temp_file.persist(dst).map_err(|e| Error::Persist {
                path: dst.to_path_buf(),
                source: e.error,
            })?;
        }
        OnConflict::Skip => {
            if let Err(e) = temp_file.persist_noclobber(dst) {
                if e.error.kind() == io::ErrorKind::AlreadyExists {
                    return Ok(FileCopyResult::skipped());
                }
                return Err(Error::Persist {
                    path: dst.to_path_buf(),
                    source: e.error,
                });
            }
        }
    }

    if options.preserve_timestamps {
        if let Err(e) = preserve_timestamps(&src_meta, dst) {
            options.warn(&format!(
                "Failed to set timestamps on {}: {}",
                dst.display(),
                e
            ));
        }
    }

    if options.preserve_xattrs {
        match copy_xattrs(src, dst) {
            Ok(rejected) if !rejected.is_empty() => options.warn(&format!(
                "Extended attributes not supported on {}: {}",
                dst.display(),
                rejected.join(", ")
            )),
            Ok(_) => {}
            Err(e) => options.warn(&format!(
                "Failed to read extended attributes of {}: {}",
                src.display(),
                e
            )),
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        src = %src.display(),
        dst = %dst.display(),
        bytes = bytes_copied,
        "copied file"
    );

    Ok(FileCopyResult::copied(bytes_copied))
}
