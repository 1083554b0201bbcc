//! # cpytools
//!
//! Host-side helpers for CircuitPython boards.
//!
//! ## Core Features
//!
//! - **Remount workaround**: remounts the `CIRCUITPY` volume (and a second
//!   `CIRCUITPY1` board, if present) with `noasync`, working around macOS
//!   releases that delay FAT metadata writes
//! - **Installer**: copies an application onto a board, always replacing
//!   the application files but never clobbering the user's settings file or
//!   library modules already on the board
//! - **Atomic writes**: every file lands via temp file + rename, so a board
//!   yanked mid-copy never has a truncated `code.py`
//! - **Metadata preserving**: permissions, timestamps and extended attributes
//!
//! ## Installing
//!
//! ```no_run
//! use cpytools::Installer;
//!
//! let stats = Installer::new("app", "/Volumes/CIRCUITPY").run()?;
//! println!(
//!     "{} core files written, settings {}, {} library files added",
//!     stats.core.files_copied,
//!     if stats.settings_copied { "installed" } else { "kept" },
//!     stats.lib.files_copied,
//! );
//! # Ok::<(), cpytools::Error>(())
//! ```
//!
//! ## Remounting
//!
//! ```no_run
//! use cpytools::{HostSystem, RemountOptions, remount_volumes};
//!
//! let report = remount_volumes(&mut HostSystem::new(), &RemountOptions::default())?;
//! println!("remounted {} volume(s)", report.volumes.len());
//! # Ok::<(), cpytools::Error>(())
//! ```
//!
//! Anything that talks to the OS goes through the [`MountSystem`] trait, so
//! the sequence can be driven by [`DryRunSystem`] or a test double.
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `tracing` | Structured logging with tracing crate |
//! | `serde` | `Serialize` for reports, statistics and plan items |
//! | `full` | Enable all optional features |

#![cfg_attr(docsrs, feature(doc_cfg))]

mod copy;
mod error;
mod install;
mod options;
mod remount;

pub use copy::{CopyStats, copy_dir_contents, copy_file};
pub use error::{Error, Result, is_no_space_error};
pub use install::{
    CORE_FILES, InstallStats, Installer, LIB_DIR, Manifest, PlanAction, PlanItem, SETTINGS_FILE,
    resolve_destination,
};
pub use options::{CopyOptions, OnConflict};
pub use remount::{
    DEFAULT_SETTLE_DELAY, DEFAULT_VOLUME_NAME, DEFAULT_VOLUMES_ROOT, DryRunSystem, HostSystem,
    MountEntry, MountSystem, MountTable, RemountOptions, RemountReport, RemountedVolume,
    SECONDARY_SUFFIX, SystemCommand, remount_volumes,
};
