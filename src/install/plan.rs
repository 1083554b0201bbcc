//! Dry-run view of an install.

use crate::options::OnConflict;
use std::fmt;
use std::path::{Path, PathBuf};

/// What an install would do with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanAction {
    /// Destination is missing; the file will be written
    Copy,
    /// Destination exists and will be replaced
    Overwrite,
    /// Destination exists and will be left alone
    Skip,
}

impl PlanAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an install plan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlanItem {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: PlanAction,
    /// `"exists"` or `"not_exists"`
    pub reason: &'static str,
}

impl PlanItem {
    pub(crate) fn classify(source: &Path, destination: &Path, on_conflict: OnConflict) -> Self {
        let exists = destination.symlink_metadata().is_ok();
        let (action, reason) = match (exists, on_conflict) {
            (false, _) => (PlanAction::Copy, "not_exists"),
            (true, OnConflict::Overwrite) => (PlanAction::Overwrite, "exists"),
            (true, OnConflict::Skip) => (PlanAction::Skip, "exists"),
        };
        Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            action,
            reason,
        }
    }
}
