//! Bundle Module
//!
//! Wire entry types and the codec between the flat entry list and the
//! in-memory staging tree.

pub mod codec;
pub mod types;

pub use codec::{export, import, BundleImport};
pub use types::*;
