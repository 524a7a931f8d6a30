//! File System Module
//!
//! The in-memory staging filesystem a bundle editor session operates on.
//! One instance per session, built from wire entries by the bundle codec,
//! never persisted directly.

pub mod memory_fs;
pub mod types;

pub use memory_fs::{dirname, normalize_path, MemoryFileSystem};
pub use types::*;
