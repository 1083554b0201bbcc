//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CORE_FILES: [&str; 6] = [
    "code.py",
    "classes.py",
    "common.py",
    "defaults.py",
    "terms.py",
    "utils.py",
];

/// An application directory and a fake board to install it onto.
pub struct BoardFixture {
    pub app: TempDir,
    pub board: TempDir,
}

impl BoardFixture {
    /// A complete application and an empty board that already has `lib/`.
    pub fn new() -> Self {
        let fixture = Self {
            app: TempDir::new().expect("Failed to create temp app dir"),
            board: TempDir::new().expect("Failed to create temp board dir"),
        };
        for name in CORE_FILES {
            fixture.write_app(name, &format!("# app {name}"));
        }
        fixture.write_app("settings.py", "volume = 5");
        fixture.write_app("lib/neopixel.mpy", "app neopixel");
        fixture.write_app("lib/adafruit_hid/keyboard.mpy", "app keyboard");
        fs::create_dir_all(fixture.board.path().join("lib")).expect("Failed to create board lib");
        fixture
    }

    pub fn app_path(&self) -> &Path {
        self.app.path()
    }

    pub fn board_path(&self) -> &Path {
        self.board.path()
    }

    pub fn on_board(&self, rel: &str) -> PathBuf {
        self.board.path().join(rel)
    }

    /// Write `rel` under the application directory, creating parents.
    pub fn write_app(&self, rel: &str, content: &str) {
        write_file(&self.app.path().join(rel), content);
    }

    /// Write `rel` onto the board, creating parents.
    pub fn write_board(&self, rel: &str, content: &str) {
        write_file(&self.board.path().join(rel), content);
    }

    /// Check if a board file exists and has the expected content.
    pub fn assert_board_content(&self, rel: &str, expected: &str) {
        let path = self.on_board(rel);
        assert!(path.exists(), "File does not exist: {:?}", path);
        let actual = fs::read_to_string(&path).expect("Failed to read file");
        assert_eq!(actual, expected, "File content mismatch for {rel}");
    }

    /// Count all files on the board recursively.
    pub fn count_board_files(&self) -> usize {
        count_files_recursive(self.board.path())
    }
}

impl Default for BoardFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(path, content).expect("Failed to write file");
}

fn count_files_recursive(dir: &Path) -> usize {
    let mut count = 0;
    for entry in fs::read_dir(dir).expect("Failed to read directory") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            count += count_files_recursive(&path);
        } else {
            count += 1;
        }
    }
    count
}

/// Check if a command is available on the system.
pub fn command_exists(cmd: &str) -> bool {
    std::process::Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
