//! The boundary between the remount sequence and the operating system.

use super::table::MountTable;
use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// An external command the remount sequence wants run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SystemCommand {
    program: String,
    args: Vec<String>,
}

impl SystemCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `umount MOUNT_POINT`
    pub fn unmount(mount_point: &Path) -> Self {
        Self::new("umount", [path_arg(mount_point)])
    }

    /// `mkdir MOUNT_POINT`
    pub fn make_mount_point(mount_point: &Path) -> Self {
        Self::new("mkdir", [path_arg(mount_point)])
    }

    /// `mount -v -o OPTIONS -t FS_TYPE DEVICE MOUNT_POINT`
    pub fn mount(device: &str, mount_point: &Path, fs_type: &str, options: &str) -> Self {
        Self::new(
            "mount",
            [
                "-v".to_owned(),
                "-o".to_owned(),
                options.to_owned(),
                "-t".to_owned(),
                fs_type.to_owned(),
                device.to_owned(),
                path_arg(mount_point),
            ],
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Operations the remount sequence needs from the host.
///
/// [`HostSystem`] talks to the real OS; [`DryRunSystem`] wraps another
/// implementation and only records what would be run.
pub trait MountSystem {
    /// Current mounted filesystems.
    fn mount_table(&mut self) -> Result<MountTable>;

    /// Run `command`, failing if it exits unsuccessfully.
    fn run(&mut self, command: &SystemCommand) -> Result<()>;

    /// Give the OS time to release the device after an unmount.
    fn settle(&mut self, delay: Duration);
}

/// Runs commands on the local machine.
///
/// Unmounting and mounting under `/Volumes` needs root, so commands are run
/// through `sudo` unless the process already is root. Standard streams are
/// inherited: `sudo` can prompt, and a failing command's own message reaches
/// the terminal.
#[derive(Debug, Clone)]
pub struct HostSystem {
    elevate: bool,
}

impl HostSystem {
    pub fn new() -> Self {
        Self {
            elevate: !is_root(),
        }
    }

    /// Never prefix commands with `sudo`.
    #[must_use]
    pub fn without_elevation(mut self) -> Self {
        self.elevate = false;
        self
    }

    pub fn elevates(&self) -> bool {
        self.elevate
    }

    fn command_for(&self, command: &SystemCommand) -> Command {
        if self.elevate {
            let mut cmd = Command::new("sudo");
            cmd.arg(command.program()).args(command.args());
            cmd
        } else {
            let mut cmd = Command::new(command.program());
            cmd.args(command.args());
            cmd
        }
    }
}

impl Default for HostSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MountSystem for HostSystem {
    fn mount_table(&mut self) -> Result<MountTable> {
        let output = Command::new("mount")
            .output()
            .map_err(|source| Error::CommandSpawn {
                program: "mount".to_owned(),
                source,
            })?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: "mount".to_owned(),
                status: output.status.code(),
            });
        }
        Ok(MountTable::parse(&String::from_utf8_lossy(&output.stdout)))
    }

    fn run(&mut self, command: &SystemCommand) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::info!(elevated = self.elevate, "running {}", command);

        let status = self
            .command_for(command)
            .status()
            .map_err(|source| Error::CommandSpawn {
                program: if self.elevate {
                    "sudo".to_owned()
                } else {
                    command.program().to_owned()
                },
                source,
            })?;
        if !status.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                status: status.code(),
            });
        }
        Ok(())
    }

    fn settle(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// Reads the real mount table but only records the commands.
#[derive(Debug)]
pub struct DryRunSystem<S> {
    inner: S,
    commands: Vec<SystemCommand>,
}

impl<S: MountSystem> DryRunSystem<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            commands: Vec::new(),
        }
    }

    /// Commands that would have been run, in order.
    pub fn commands(&self) -> &[SystemCommand] {
        &self.commands
    }
}

impl<S: MountSystem> MountSystem for DryRunSystem<S> {
    fn mount_table(&mut self) -> Result<MountTable> {
        self.inner.mount_table()
    }

    fn run(&mut self, command: &SystemCommand) -> Result<()> {
        self.commands.push(command.clone());
        Ok(())
    }

    fn settle(&mut self, _delay: Duration) {}
}
