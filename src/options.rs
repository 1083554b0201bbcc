//! Configuration options for copy operations.
//!
//! This module provides [`CopyOptions`] for configuring copy behavior and
//! [`OnConflict`] for handling destination conflicts.
//!
//! # Example
//!
//! ```
//! use cpytools::{CopyOptions, OnConflict};
//!
//! let options = CopyOptions::default()
//!     .with_on_conflict(OnConflict::Overwrite)
//!     .without_fsync();
//! ```

/// Behavior when destination file already exists.
///
/// # Default
///
/// The default is [`OnConflict::Skip`], which leaves customised files on
/// the board untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OnConflict {
    /// Skip existing files (default).
    ///
    /// If a file already exists at the destination, it is left unchanged
    /// and the copy operation continues with the next file.
    #[default]
    Skip,
    /// Overwrite existing files.
    ///
    /// If a file already exists at the destination, it is replaced with
    /// the source file content.
    Overwrite,
}

/// Options for copy operations.
///
/// Use [`Default::default()`] to get sensible defaults, then customize
/// using the builder methods.
///
/// # Default Values
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `on_conflict` | `Skip` | Skip existing files |
/// | `preserve_permissions` | `true` | Copy file permissions |
/// | `preserve_timestamps` | `true` | Copy file timestamps (mtime/atime) |
/// | `preserve_xattrs` | `true` | Copy extended attributes |
/// | `fsync` | `true` | Sync to disk after write |
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CopyOptions {
    /// Behavior when destination file already exists
    pub on_conflict: OnConflict,

    /// Whether to preserve file and directory permissions (default: true)
    pub preserve_permissions: bool,

    /// Whether to preserve file timestamps (default: true)
    ///
    /// FAT stores modification times with two second granularity, so the
    /// copy may differ from the source by up to that much.
    pub preserve_timestamps: bool,

    /// Whether to copy extended attributes (default: true)
    ///
    /// Only effective on Linux and macOS. Attributes the destination
    /// filesystem rejects are reported as warnings.
    pub preserve_xattrs: bool,

    /// Whether to sync files to disk before renaming into place (default: true)
    ///
    /// Removable boards may be unplugged right after an install, so this is
    /// on unless explicitly disabled.
    pub fsync: bool,

    /// Callback for warnings (optional)
    ///
    /// If not set and `tracing` feature is enabled, warnings are logged via tracing.
    /// Otherwise, warnings are silently ignored.
    pub warn_handler: Option<fn(&str)>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            on_conflict: OnConflict::Skip,
            preserve_permissions: true,
            preserve_timestamps: true,
            preserve_xattrs: true,
            fsync: true,
            warn_handler: None,
        }
    }
}

impl CopyOptions {
    /// Create options with a warning handler
    #[must_use]
    pub fn with_warn_handler(mut self, handler: fn(&str)) -> Self {
        self.warn_handler = Some(handler);
        self
    }

    /// Set the conflict behavior
    #[must_use]
    pub fn with_on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = on_conflict;
        self
    }

    /// Disable fsync for faster (but less durable) copies
    #[must_use]
    pub fn without_fsync(mut self) -> Self {
        self.fsync = false;
        self
    }

    /// Disable timestamp preservation
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.preserve_timestamps = false;
        self
    }

    /// Disable permission preservation
    ///
    /// By default, file permissions are copied from source to destination.
    /// Disable this if you want files to use the default umask permissions.
    #[must_use]
    pub fn without_permissions(mut self) -> Self {
        self.preserve_permissions = false;
        self
    }

    /// Disable extended attribute copying
    #[must_use]
    pub fn without_xattrs(mut self) -> Self {
        self.preserve_xattrs = false;
        self
    }

    pub(crate) fn warn(&self, msg: &str) {
        if let Some(handler) = self.warn_handler {
            handler(msg);
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("{}", msg);
        }
    }
}
