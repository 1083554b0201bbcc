//! Helpers shared by the file and directory copy operations.

use filetime::{FileTime, set_file_times};
use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;

// =============================================================================
// File content copying
// =============================================================================

/// Copy file contents using the best available method.
///
/// On Linux, uses `copy_file_range` so the data stays in the kernel.
/// Everywhere else this is a buffered `std::io::copy`.
pub(crate) fn copy_file_contents(src: &File, dst: &File, len: u64) -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        copy_file_range_all(src, dst, len)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = len;
        io::copy(&mut io::BufReader::new(src), &mut &*dst)
    }
}

/// Linux-specific: copy using copy_file_range(2).
///
/// Falls back to `io::copy` when the kernel or filesystem refuses before
/// anything was transferred (cross-device copies onto a vfat board hit this).
#[cfg(target_os = "linux")]
fn copy_file_range_all(src: &File, dst: &File, len: u64) -> io::Result<u64> {
    use std::os::unix::io::AsRawFd;

    const CHUNK: u64 = 16 * 1024 * 1024;

    let src_fd = src.as_raw_fd();
    let dst_fd = dst.as_raw_fd();
    let mut remaining = len;
    let mut copied: u64 = 0;

    while remaining > 0 {
        let chunk_size = remaining.min(CHUNK) as usize;

        // SAFETY: both descriptors are open for the lifetime of the borrow,
        // and null offsets make the kernel use and advance the file positions.
        let result = unsafe {
            libc::copy_file_range(
                src_fd,
                std::ptr::null_mut(),
                dst_fd,
                std::ptr::null_mut(),
                chunk_size,
                0,
            )
        };

        if result < 0 {
            let err = io::Error::last_os_error();
            if copied == 0
                && matches!(
                    err.raw_os_error(),
                    Some(libc::EXDEV | libc::ENOSYS | libc::EINVAL | libc::EOPNOTSUPP)
                )
            {
                return io::copy(&mut io::BufReader::new(src), &mut &*dst);
            }
            return Err(err);
        }

        if result == 0 {
            // Source shrank underneath us
            break;
        }

        let bytes = result as u64;
        copied += bytes;
        remaining = remaining.saturating_sub(bytes);
    }

    Ok(copied)
}

// =============================================================================
// Metadata
// =============================================================================

/// Preserve file timestamps (mtime and atime)
pub(crate) fn preserve_timestamps(src_meta: &Metadata, dst: &Path) -> io::Result<()> {
    let mtime = FileTime::from_last_modification_time(src_meta);
    let atime = FileTime::from_last_access_time(src_meta);
    set_file_times(dst, atime, mtime)
}

/// Copy extended attributes from `src` to `dst`.
///
/// Returns the names of attributes that could not be written. FAT volumes
/// on Linux reject most of them, which is not worth failing an install over.
#[cfg(any(target_os = "linux", target_os = "macos"))]
pub(crate) fn copy_xattrs(src: &Path, dst: &Path) -> io::Result<Vec<String>> {
    let mut rejected = Vec::new();
    for name in xattr::list(src)? {
        if let Some(value) = xattr::get(src, &name)? {
            if xattr::set(dst, &name, &value).is_err() {
                rejected.push(name.to_string_lossy().into_owned());
            }
        }
    }
    Ok(rejected)
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub(crate) fn copy_xattrs(_src: &Path, _dst: &Path) -> io::Result<Vec<String>> {
    Ok(Vec::new())
}

/// Remove a non-directory entry (file, symlink, fifo, ...) at `path`.
///
/// Directories are never removed; callers reject them first.
pub(crate) fn remove_existing(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

// =============================================================================
// Directory identity
// =============================================================================

/// Get a unique key for a directory based on device and inode.
///
/// Used to detect symlink loops while following links.
#[cfg(unix)]
pub(crate) fn get_dir_key(path: &Path) -> io::Result<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    let meta = fs::metadata(path)?;
    Ok((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
pub(crate) fn get_dir_key(path: &Path) -> io::Result<(u64, u64)> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let canonical = path.canonicalize()?;
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    Ok((0, hasher.finish()))
}
