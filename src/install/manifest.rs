//! The fixed file set copied onto a board.

use std::path::{Path, PathBuf};

/// Application files that are always overwritten on the board.
pub const CORE_FILES: &[&str] = &[
    "code.py",
    "classes.py",
    "common.py",
    "defaults.py",
    "terms.py",
    "utils.py",
];

/// User settings; only copied when the board has none.
pub const SETTINGS_FILE: &str = "settings.py";

/// Library folder; each entry only copied when missing on the board.
pub const LIB_DIR: &str = "lib";

/// What gets installed, relative to both the source and destination roots.
///
/// [`Manifest::default`] is the CircuitPython application layout described
/// by [`CORE_FILES`], [`SETTINGS_FILE`] and [`LIB_DIR`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    core_files: Vec<PathBuf>,
    settings_file: PathBuf,
    lib_dir: PathBuf,
}

impl Manifest {
    /// Build a manifest from explicit relative paths.
    pub fn new<I, P>(core_files: I, settings_file: impl AsRef<Path>, lib_dir: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            core_files: core_files
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
            settings_file: settings_file.as_ref().to_path_buf(),
            lib_dir: lib_dir.as_ref().to_path_buf(),
        }
    }

    /// The default CircuitPython application layout.
    pub fn circuitpython() -> Self {
        Self::new(CORE_FILES.iter().copied(), SETTINGS_FILE, LIB_DIR)
    }

    pub fn core_files(&self) -> &[PathBuf] {
        &self.core_files
    }

    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    pub fn lib_dir(&self) -> &Path {
        &self.lib_dir
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::circuitpython()
    }
}
