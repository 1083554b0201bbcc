//! Parsing the output of `mount`.
//!
//! Two line shapes are understood:
//!
//! ```text
//! /dev/disk4s1 on /Volumes/CIRCUITPY (msdos, local, nodev, nosuid, noowners)
//! /dev/sdb1 on /media/user/CIRCUITPY type vfat (rw,nosuid,nodev,relatime)
//! ```
//!
//! The first is what macOS and the BSDs print, the second is util-linux.

use std::path::{Path, PathBuf};

/// One mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Backing device, e.g. `/dev/disk4s1`
    pub device: String,
    /// Where the filesystem is mounted
    pub mount_point: PathBuf,
    /// Filesystem type when the listing reports one
    pub fs_type: Option<String>,
    /// Mount flags, e.g. `local`, `nodev`, `rw`
    pub options: Vec<String>,
}

impl MountEntry {
    /// Whether the entry reports a FAT filesystem.
    pub fn is_fat(&self) -> bool {
        matches!(
            self.fs_type.as_deref(),
            Some("msdos" | "vfat" | "fat" | "msdosfs")
        )
    }
}

/// Snapshot of the mounted filesystems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// Parse `mount` output. Lines that fit neither shape are ignored.
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text.lines().filter_map(parse_line).collect(),
        }
    }

    pub fn entries(&self) -> &[MountEntry] {
        &self.entries
    }

    /// Look up the entry mounted exactly at `mount_point`.
    ///
    /// Matching is on the whole path, so `/Volumes/CIRCUITPY` never matches
    /// `/Volumes/CIRCUITPY1` or `/Users/me/CIRCUITPY-backup`. If something is
    /// mounted over the same point twice, the last (topmost) entry wins.
    pub fn find(&self, mount_point: &Path) -> Option<&MountEntry> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.mount_point == mount_point)
    }
}

fn parse_line(line: &str) -> Option<MountEntry> {
    let (device, rest) = line.trim_end().split_once(" on ")?;
    if device.is_empty() {
        return None;
    }

    let (head, paren) = match rest.rfind(" (") {
        Some(idx) if rest.ends_with(')') => (&rest[..idx], &rest[idx + 2..rest.len() - 1]),
        _ => (rest, ""),
    };
    let mut fields: Vec<String> = paren
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_owned)
        .collect();

    let (mount_point, fs_type) = match head.rsplit_once(" type ") {
        Some((path, fs_type)) => (path, Some(fs_type.to_owned())),
        None if fields.is_empty() => (head, None),
        // BSD puts the filesystem type first inside the parentheses
        None => (head, Some(fields.remove(0))),
    };
    if mount_point.is_empty() {
        return None;
    }

    Some(MountEntry {
        device: device.to_owned(),
        mount_point: PathBuf::from(mount_point),
        fs_type,
        options: fields,
    })
}
