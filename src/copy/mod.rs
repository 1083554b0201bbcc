//! Core copy operations.
//!
//! Atomic single-file copies and sequential directory copies used by the
//! installer.

mod dir;
mod file;
mod utils;

pub use dir::{CopyStats, copy_dir_contents};
pub use file::copy_file;

pub(crate) use dir::{Entry, collect_entries};
pub(crate) use file::copy_file_internal;
