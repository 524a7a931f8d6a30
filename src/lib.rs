//! bundlefs - In-memory staging area for box file bundles
//!
//! A file bundle is a flat list of path + content + permission entries
//! attached to a box or volume spec. This crate builds an editable
//! POSIX-like tree from that list, supports the usual tree operations
//! (stat, read/write, mkdir, rmdir, unlink, symlink, chown/chmod, readdir),
//! and flattens the tree back into the wire list for submission. It also
//! carries the small best-effort decoders the surrounding views need:
//! the docker `ps` status blob and the static tax-ID reference table.
//!
//! Nothing here touches the network or the disk; the tree lives for one
//! editor session and is rebuilt from its source entries on every change.

pub mod bundle;
pub mod fs;
pub mod reference;
pub mod status;

pub use bundle::{export, import, BundleFileEntry, BundleImport, ImportWarning};
pub use fs::{FileContent, FsError, MemoryFileSystem, Metadata, MkdirOptions, RmdirOptions};
pub use status::{decode_container_statuses, ContainerStatus};
