//! Remounting CIRCUITPY with asynchronous writes disabled.
//!
//! Some macOS releases buffer writes to FAT volumes long enough that a
//! CircuitPython board reloads half-written files. Remounting the volume
//! with `noasync` avoids it. The sequence for each volume is:
//!
//! 1. look up the backing device in the mount table
//! 2. `umount` the volume
//! 3. `mkdir` the mount point again
//! 4. wait for the OS to release the device
//! 5. `mount -v -o noasync -t msdos DEVICE MOUNT_POINT`
//!
//! The primary volume (`CIRCUITPY`) must be mounted. A second board shows up
//! as `CIRCUITPY1`; it is remounted too when present. Any failure aborts.
//!
//! # Example
//!
//! ```no_run
//! use cpytools::{HostSystem, RemountOptions, remount_volumes};
//!
//! let report = remount_volumes(&mut HostSystem::new(), &RemountOptions::default())?;
//! for volume in &report.volumes {
//!     println!("{} remounted from {}", volume.name, volume.device);
//! }
//! # Ok::<(), cpytools::Error>(())
//! ```

mod system;
mod table;

pub use system::{DryRunSystem, HostSystem, MountSystem, SystemCommand};
pub use table::{MountEntry, MountTable};

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Volume label CircuitPython gives its drive.
pub const DEFAULT_VOLUME_NAME: &str = "CIRCUITPY";

/// Suffix macOS appends when a second volume with the same label appears.
pub const SECONDARY_SUFFIX: &str = "1";

/// Where macOS mounts removable volumes.
pub const DEFAULT_VOLUMES_ROOT: &str = "/Volumes";

/// Pause between recreating the mount point and mounting.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Options for [`remount_volumes`].
///
/// # Default Values
///
/// | Field | Default |
/// |-------|---------|
/// | `volume_name` | `CIRCUITPY` |
/// | `volumes_root` | `/Volumes` |
/// | `settle_delay` | 2 seconds |
/// | `fs_type` | `msdos` |
/// | `mount_options` | `noasync` |
#[derive(Debug, Clone)]
pub struct RemountOptions {
    /// Label of the primary volume; the secondary one gets [`SECONDARY_SUFFIX`]
    pub volume_name: String,
    /// Directory the volumes are mounted under
    pub volumes_root: PathBuf,
    /// Wait between recreating the mount point and mounting
    pub settle_delay: Duration,
    /// Passed to `mount -t`
    pub fs_type: String,
    /// Passed to `mount -o`
    pub mount_options: String,
    /// Callback for warnings; falls back to `tracing` when unset
    pub warn_handler: Option<fn(&str)>,
}

impl Default for RemountOptions {
    fn default() -> Self {
        Self {
            volume_name: DEFAULT_VOLUME_NAME.to_owned(),
            volumes_root: PathBuf::from(DEFAULT_VOLUMES_ROOT),
            settle_delay: DEFAULT_SETTLE_DELAY,
            fs_type: "msdos".to_owned(),
            mount_options: "noasync".to_owned(),
            warn_handler: None,
        }
    }
}

impl RemountOptions {
    #[must_use]
    pub fn with_volume_name(mut self, name: impl Into<String>) -> Self {
        self.volume_name = name.into();
        self
    }

    #[must_use]
    pub fn with_volumes_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.volumes_root = root.into();
        self
    }

    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn with_warn_handler(mut self, handler: fn(&str)) -> Self {
        self.warn_handler = Some(handler);
        self
    }

    /// Primary and secondary volume names, in processing order.
    pub fn volume_names(&self) -> [String; 2] {
        [
            self.volume_name.clone(),
            format!("{}{}", self.volume_name, SECONDARY_SUFFIX),
        ]
    }

    pub fn mount_point(&self, name: &str) -> PathBuf {
        self.volumes_root.join(name)
    }

    fn warn(&self, msg: &str) {
        if let Some(handler) = self.warn_handler {
            handler(msg);
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("{}", msg);
        }
    }
}

/// A volume that was unmounted and mounted again.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RemountedVolume {
    pub name: String,
    pub device: String,
    pub mount_point: PathBuf,
}

/// Volumes handled by [`remount_volumes`], in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RemountReport {
    pub volumes: Vec<RemountedVolume>,
}

/// Remount the primary volume and, if present, the secondary one.
///
/// The mount table is read again before each volume.
///
/// # Errors
///
/// - [`Error::VolumeNotMounted`] if the primary volume is absent; nothing is
///   run in that case
/// - [`Error::CommandSpawn`] / [`Error::CommandFailed`] from the first
///   command that fails
pub fn remount_volumes<S>(system: &mut S, options: &RemountOptions) -> Result<RemountReport>
where
    S: MountSystem + ?Sized,
{
    let [primary, secondary] = options.volume_names();
    let mut report = RemountReport::default();

    let primary_point = options.mount_point(&primary);
    let entry = system
        .mount_table()?
        .find(&primary_point)
        .cloned()
        .ok_or_else(|| Error::VolumeNotMounted {
            name: primary.clone(),
            mount_point: primary_point,
        })?;
    report
        .volumes
        .push(remount_one(system, options, primary, entry)?);

    let secondary_point = options.mount_point(&secondary);
    match system.mount_table()?.find(&secondary_point).cloned() {
        Some(entry) => report
            .volumes
            .push(remount_one(system, options, secondary, entry)?),
        None => {
            #[cfg(feature = "tracing")]
            tracing::debug!("{} not mounted, nothing more to do", secondary);
        }
    }

    Ok(report)
}

fn remount_one<S>(
    system: &mut S,
    options: &RemountOptions,
    name: String,
    entry: MountEntry,
) -> Result<RemountedVolume>
where
    S: MountSystem + ?Sized,
{
    let mount_point = entry.mount_point.clone();

    if entry.fs_type.is_some() && !entry.is_fat() {
        options.warn(&format!(
            "{} is mounted as {}, remounting as {} anyway",
            mount_point.display(),
            entry.fs_type.as_deref().unwrap_or_default(),
            options.fs_type
        ));
    }

    #[cfg(feature = "tracing")]
    tracing::info!(device = %entry.device, "remounting {}", name);

    system.run(&SystemCommand::unmount(&mount_point))?;
    system.run(&SystemCommand::make_mount_point(&mount_point))?;
    system.settle(options.settle_delay);
    system.run(&SystemCommand::mount(
        &entry.device,
        &mount_point,
        &options.fs_type,
        &options.mount_options,
    ))?;

    Ok(RemountedVolume {
        name,
        device: entry.device,
        mount_point,
    })
}
