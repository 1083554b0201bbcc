//! Installing an application onto a mounted board.
//!
//! An install copies the [`Manifest`] from a source directory into a
//! destination directory in three steps, stopping at the first failure:
//!
//! 1. core files, always overwritten
//! 2. the settings file, only if the board has none
//! 3. every entry of the library folder, only if missing on the board
//!
//! Nothing is rolled back when a step fails.
//!
//! # Example
//!
//! ```no_run
//! use cpytools::Installer;
//!
//! let stats = Installer::new("app", "/Volumes/CIRCUITPY").run()?;
//! println!("{} library files added", stats.lib.files_copied);
//! # Ok::<(), cpytools::Error>(())
//! ```

mod manifest;
mod plan;

pub use manifest::{CORE_FILES, LIB_DIR, Manifest, SETTINGS_FILE};
pub use plan::{PlanAction, PlanItem};

use crate::copy::{
    CopyStats, Entry, collect_entries, copy_dir_contents, copy_file, copy_file_internal,
};
use crate::error::{Error, Result};
use crate::options::{CopyOptions, OnConflict};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Outcome of a successful install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InstallStats {
    /// Absolute destination the files were written to
    pub destination: PathBuf,
    /// Core files written (all of them, unless a step failed)
    pub core: CopyStats,
    /// Whether the settings file was written
    pub settings_copied: bool,
    /// Library entries added
    pub lib: CopyStats,
    /// Wall time of the whole install
    pub duration: Duration,
}

impl InstallStats {
    /// Totals across all three steps.
    pub fn total(&self) -> CopyStats {
        let mut total = self.core.clone();
        total.merge(&self.lib);
        if self.settings_copied {
            total.files_copied += 1;
        } else {
            total.files_skipped += 1;
        }
        total.duration = self.duration;
        total
    }
}

/// Resolve the install destination to an absolute directory path.
///
/// # Errors
///
/// - [`Error::DestinationNotFound`] if the path does not exist
/// - [`Error::NotADirectory`] if it is not a directory
pub fn resolve_destination(path: &Path) -> Result<PathBuf> {
    let resolved = path.canonicalize().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::DestinationNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    if !resolved.is_dir() {
        return Err(Error::NotADirectory(resolved));
    }
    Ok(resolved)
}

fn resolve_source(path: &Path) -> Result<PathBuf> {
    let resolved = path.canonicalize().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::SourceNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    if !resolved.is_dir() {
        return Err(Error::NotADirectory(resolved));
    }
    Ok(resolved)
}

/// A configured install of a [`Manifest`] from `source` into `dest`.
#[derive(Debug, Clone)]
pub struct Installer {
    source: PathBuf,
    dest: PathBuf,
    manifest: Manifest,
    options: CopyOptions,
}

impl Installer {
    /// Create an installer for the default CircuitPython layout.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(source: P, dest: Q) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            dest: dest.as_ref().to_path_buf(),
            manifest: Manifest::default(),
            options: CopyOptions::default(),
        }
    }

    /// Install a different file set.
    #[must_use]
    pub fn manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Skip fsync before each rename.
    #[must_use]
    pub fn no_sync(mut self) -> Self {
        self.options = self.options.without_fsync();
        self
    }

    /// Route warnings (unsupported xattrs, unreadable entries) to `handler`.
    #[must_use]
    pub fn warn_handler(mut self, handler: fn(&str)) -> Self {
        self.options = self.options.with_warn_handler(handler);
        self
    }

    /// Replace the base copy options. The conflict policy is still chosen
    /// per step.
    #[must_use]
    pub fn options(mut self, options: CopyOptions) -> Self {
        self.options = options;
        self
    }

    fn with_conflict(&self, on_conflict: OnConflict) -> CopyOptions {
        self.options.clone().with_on_conflict(on_conflict)
    }

    /// Describe what [`run`](Self::run) would do, without writing anything.
    ///
    /// Fails on the same destination and library-folder checks as `run`;
    /// missing source files only show up when running.
    pub fn plan(&self) -> Result<Vec<PlanItem>> {
        let dest = resolve_destination(&self.dest)?;
        let source = resolve_source(&self.source)?;
        let mut items = Vec::new();

        for file in self.manifest.core_files() {
            items.push(PlanItem::classify(
                &source.join(file),
                &dest.join(file),
                OnConflict::Overwrite,
            ));
        }

        let settings = self.manifest.settings_file();
        items.push(PlanItem::classify(
            &source.join(settings),
            &dest.join(settings),
            OnConflict::Skip,
        ));

        let (src_lib, dst_lib) = self.lib_dirs(&source, &dest)?;
        for entry in collect_entries(&src_lib, &dst_lib, &self.options)? {
            if let Entry::File { src, dst } = entry {
                items.push(PlanItem::classify(&src, &dst, OnConflict::Skip));
            }
        }

        Ok(items)
    }

    /// Perform the install.
    ///
    /// # Errors
    ///
    /// Validation errors from [`resolve_destination`], a missing source file
    /// ([`Error::SourceNotFound`]), a destination without a library folder
    /// ([`Error::LibDirMissing`]), or the first IO failure.
    pub fn run(&self) -> Result<InstallStats> {
        let start_time = Instant::now();
        let dest = resolve_destination(&self.dest)?;
        let source = resolve_source(&self.source)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            source = %source.display(),
            dest = %dest.display(),
            "installing"
        );

        let mut stats = InstallStats {
            destination: dest.clone(),
            ..InstallStats::default()
        };

        let overwrite = self.with_conflict(OnConflict::Overwrite);
        for file in self.manifest.core_files() {
            let result = copy_file_internal(&source.join(file), &dest.join(file), &overwrite)?;
            stats.core.files_copied += 1;
            stats.core.bytes_copied += result.bytes;
        }

        let skip = self.with_conflict(OnConflict::Skip);
        let settings = self.manifest.settings_file();
        stats.settings_copied = copy_file(&source.join(settings), &dest.join(settings), &skip)?;
        #[cfg(feature = "tracing")]
        if !stats.settings_copied {
            tracing::info!("keeping existing {}", settings.display());
        }

        let (src_lib, dst_lib) = self.lib_dirs(&source, &dest)?;
        stats.lib = copy_dir_contents(&src_lib, &dst_lib, &skip)?;

        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    fn lib_dirs(&self, source: &Path, dest: &Path) -> Result<(PathBuf, PathBuf)> {
        let dst_lib = dest.join(self.manifest.lib_dir());
        if !dst_lib.is_dir() {
            return Err(Error::LibDirMissing(dst_lib));
        }
        let src_lib = source.join(self.manifest.lib_dir());
        if !src_lib.exists() {
            return Err(Error::SourceNotFound(src_lib));
        }
        Ok((src_lib, dst_lib))
    }
}
