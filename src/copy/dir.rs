//! Directory copy operations.
//!
//! Library folders are copied entry by entry, sequentially, stopping at the
//! first failure.

use crate::error::{Error, Result};
use crate::options::CopyOptions;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::file::copy_file_internal;
use super::utils::get_dir_key;

/// Statistics from a copy operation.
///
/// # Example
///
/// ```no_run
/// use cpytools::{copy_dir_contents, CopyOptions};
/// use std::path::Path;
///
/// let stats = copy_dir_contents(
///     Path::new("lib"),
///     Path::new("/Volumes/CIRCUITPY/lib"),
///     &CopyOptions::default(),
/// )?;
/// println!("Copied {} files, skipped {}", stats.files_copied, stats.files_skipped);
/// # Ok::<(), cpytools::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CopyStats {
    /// Number of files successfully copied
    pub files_copied: u64,
    /// Number of files skipped (already existed)
    pub files_skipped: u64,
    /// Number of directories created
    pub dirs_created: u64,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Duration of the copy operation
    pub duration: std::time::Duration,
}

impl CopyStats {
    /// Fold another set of statistics into this one.
    pub fn merge(&mut self, other: &CopyStats) {
        self.files_copied += other.files_copied;
        self.files_skipped += other.files_skipped;
        self.dirs_created += other.dirs_created;
        self.bytes_copied += other.bytes_copied;
    }
}

/// A source entry paired with where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    Dir { src: PathBuf, dst: PathBuf },
    File { src: PathBuf, dst: PathBuf },
}

/// Copy the entries of `src` into the existing directory `dst`.
///
/// Subdirectories are created as needed; files that already exist are
/// handled according to [`CopyOptions::on_conflict`]. Symlinks in the
/// source are followed, since the destination is usually FAT.
///
/// # Errors
///
/// Returns an error if:
/// - Source does not exist ([`Error::SourceNotFound`])
/// - Source or destination is not a directory ([`Error::NotADirectory`])
/// - A symlink loop is found ([`Error::SymlinkLoop`])
/// - Any individual copy fails; the first failure aborts the walk
pub fn copy_dir_contents(src: &Path, dst: &Path, options: &CopyOptions) -> Result<CopyStats> {
    let start_time = Instant::now();

    if !src.exists() {
        return Err(Error::SourceNotFound(src.to_path_buf()));
    }
    if !src.is_dir() {
        return Err(Error::NotADirectory(src.to_path_buf()));
    }
    if !dst.is_dir() {
        return Err(Error::NotADirectory(dst.to_path_buf()));
    }

    let entries = collect_entries(src, dst, options)?;
    let mut stats = CopyStats::default();

    for entry in &entries {
        match entry {
            Entry::Dir { src, dst } => {
                if dst.is_dir() {
                    continue;
                }
                fs::create_dir(dst)?;
                stats.dirs_created += 1;
                if options.preserve_permissions {
                    if let Err(e) = fs::metadata(src)
                        .and_then(|meta| fs::set_permissions(dst, meta.permissions()))
                    {
                        options.warn(&format!(
                            "Failed to set permissions on {}: {}",
                            dst.display(),
                            e
                        ));
                    }
                }
            }
            Entry::File { src, dst } => {
                let result = copy_file_internal(src, dst, options)?;
                if result.copied {
                    stats.files_copied += 1;
                    stats.bytes_copied += result.bytes;
                } else {
                    stats.files_skipped += 1;
                }
            }
        }
    }

    stats.duration = start_time.elapsed();
    Ok(stats)
}

/// List what [`copy_dir_contents`] would visit, parents before children.
///
/// Entries are sorted by name within each directory so runs are
/// reproducible.
pub(crate) fn collect_entries(
    src: &Path,
    dst: &Path,
    options: &CopyOptions,
) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut ancestors = HashSet::new();
    walk(src, dst, options, &mut entries, &mut ancestors)?;
    Ok(entries)
}

/// `ancestors` holds the directories on the current path only, so a
/// directory reached twice through sibling links is copied twice rather
/// than reported as a loop.
fn walk(
    src: &Path,
    dst: &Path,
    options: &CopyOptions,
    entries: &mut Vec<Entry>,
    ancestors: &mut HashSet<(u64, u64)>,
) -> Result<()> {
    let key = get_dir_key(src)?;
    if !ancestors.insert(key) {
        return Err(Error::SymlinkLoop(src.to_path_buf()));
    }
    let result = walk_children(src, dst, options, entries, ancestors);
    ancestors.remove(&key);
    result
}

fn walk_children(
    src: &Path,
    dst: &Path,
    options: &CopyOptions,
    entries: &mut Vec<Entry>,
    ancestors: &mut HashSet<(u64, u64)>,
) -> Result<()> {
    let mut children = fs::read_dir(src)?.collect::<std::io::Result<Vec<_>>>()?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let src_path = child.path();
        let dst_path = dst.join(child.file_name());

        // Follows symlinks
        let meta = match fs::metadata(&src_path) {
            Ok(meta) => meta,
            Err(e) => {
                options.warn(&format!(
                    "Skipping unreadable entry {}: {}",
                    src_path.display(),
                    e
                ));
                continue;
            }
        };

        if meta.is_dir() {
            entries.push(Entry::Dir {
                src: src_path.clone(),
                dst: dst_path.clone(),
            });
            walk(&src_path, &dst_path, options, entries, ancestors)?;
        } else if meta.is_file() {
            entries.push(Entry::File {
                src: src_path,
                dst: dst_path,
            });
        } else {
            options.warn(&format!("Skipping special file: {}", src_path.display()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OnConflict;
    use tempfile::tempdir;

    fn library(root: &Path) {
        fs::create_dir_all(root.join("adafruit_display_text")).unwrap();
        fs::write(root.join("neopixel.mpy"), "neopixel").unwrap();
        fs::write(root.join("adafruit_ticks.mpy"), "ticks").unwrap();
        fs::write(
            root.join("adafruit_display_text").join("label.mpy"),
            "label",
        )
        .unwrap();
    }

    #[test]
    fn test_copy_dir_contents_basic() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        library(src.path());

        let stats = copy_dir_contents(src.path(), dst.path(), &CopyOptions::default()).unwrap();

        assert_eq!(stats.files_copied, 3);
        assert_eq!(stats.files_skipped, 0);
        assert_eq!(stats.dirs_created, 1);
        assert_eq!(stats.bytes_copied, 8 + 5 + 5);
        assert_eq!(
            fs::read_to_string(dst.path().join("adafruit_display_text/label.mpy")).unwrap(),
            "label"
        );
    }

    #[test]
    fn test_copy_dir_contents_skips_existing() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        library(src.path());
        fs::create_dir(dst.path().join("adafruit_display_text")).unwrap();
        fs::write(dst.path().join("neopixel.mpy"), "patched").unwrap();
        fs::write(
            dst.path().join("adafruit_display_text").join("label.mpy"),
            "patched",
        )
        .unwrap();

        let stats = copy_dir_contents(src.path(), dst.path(), &CopyOptions::default()).unwrap();

        assert_eq!(stats.files_copied, 1);
        assert_eq!(stats.files_skipped, 2);
        assert_eq!(stats.dirs_created, 0);
        assert_eq!(
            fs::read_to_string(dst.path().join("neopixel.mpy")).unwrap(),
            "patched"
        );
        assert_eq!(
            fs::read_to_string(dst.path().join("adafruit_ticks.mpy")).unwrap(),
            "ticks"
        );
    }

    #[test]
    fn test_copy_dir_contents_overwrite() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        library(src.path());
        fs::write(dst.path().join("neopixel.mpy"), "old").unwrap();

        let options = CopyOptions::default().with_on_conflict(OnConflict::Overwrite);
        let stats = copy_dir_contents(src.path(), dst.path(), &options).unwrap();

        assert_eq!(stats.files_copied, 3);
        assert_eq!(
            fs::read_to_string(dst.path().join("neopixel.mpy")).unwrap(),
            "neopixel"
        );
    }

    #[test]
    fn test_copy_dir_contents_requires_destination() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        library(src.path());

        let missing = dst.path().join("lib");
        let result = copy_dir_contents(src.path(), &missing, &CopyOptions::default());

        assert!(matches!(result, Err(Error::NotADirectory(p)) if p == missing));
        assert!(!missing.exists());
    }

    #[test]
    fn test_copy_dir_contents_source_not_found() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();

        let result = copy_dir_contents(
            &src.path().join("lib"),
            dst.path(),
            &CopyOptions::default(),
        );

        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }

    #[test]
    fn test_collect_entries_orders_parents_first() {
        let src = tempdir().unwrap();
        let dst = Path::new("/board/lib");
        library(src.path());

        let entries = collect_entries(src.path(), dst, &CopyOptions::default()).unwrap();
        let dsts: Vec<PathBuf> = entries
            .iter()
            .map(|e| match e {
                Entry::Dir { dst, .. } | Entry::File { dst, .. } => dst.clone(),
            })
            .collect();

        assert_eq!(
            dsts,
            vec![
                dst.join("adafruit_display_text"),
                dst.join("adafruit_display_text/label.mpy"),
                dst.join("adafruit_ticks.mpy"),
                dst.join("neopixel.mpy"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_detected() {
        use std::os::unix::fs::symlink;

        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::create_dir(src.path().join("pkg")).unwrap();
        symlink(src.path(), src.path().join("pkg").join("loop")).unwrap();

        let result = copy_dir_contents(src.path(), dst.path(), &CopyOptions::default());

        assert!(matches!(result, Err(Error::SymlinkLoop(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_followed() {
        use std::os::unix::fs::symlink;

        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("real.mpy"), "real").unwrap();
        symlink(
            outside.path().join("real.mpy"),
            src.path().join("linked.mpy"),
        )
        .unwrap();

        copy_dir_contents(src.path(), dst.path(), &CopyOptions::default()).unwrap();

        let copied = dst.path().join("linked.mpy");
        assert!(!fs::symlink_metadata(&copied).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(copied).unwrap(), "real");
    }

    #[cfg(unix)]
    #[test]
    fn test_sibling_links_to_shared_dir_are_not_a_loop() {
        use std::os::unix::fs::symlink;

        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::create_dir(src.path().join("shared")).unwrap();
        fs::write(src.path().join("shared/mod.mpy"), "shared").unwrap();
        symlink(src.path().join("shared"), src.path().join("a")).unwrap();
        symlink(src.path().join("shared"), src.path().join("b")).unwrap();

        let stats = copy_dir_contents(src.path(), dst.path(), &CopyOptions::default()).unwrap();

        assert_eq!(stats.files_copied, 3);
        assert_eq!(stats.dirs_created, 3);
        for name in ["a", "b", "shared"] {
            assert_eq!(
                fs::read_to_string(dst.path().join(name).join("mod.mpy")).unwrap(),
                "shared"
            );
        }
    }
}
