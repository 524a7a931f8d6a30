//! Status Module
//!
//! Best-effort decoding of display-only container status data.

pub mod docker;

pub use docker::{decode_container_statuses, ContainerStatus};
