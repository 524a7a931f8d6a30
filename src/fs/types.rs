//! File System Types
//!
//! Core types for the in-memory bundle staging filesystem.

use thiserror::Error;

/// Permission bits exposed to callers. Anything above this range is stripped
/// when a mode enters the tree, so `stat` never reports stray high bits.
pub const PERM_MASK: u32 = 0o777;

/// Default mode for file nodes.
pub const DEFAULT_FILE_MODE: u32 = 0o644;
/// Default mode for directory nodes.
pub const DEFAULT_DIR_MODE: u32 = 0o755;
/// Default mode for symlink nodes.
pub const DEFAULT_SYMLINK_MODE: u32 = 0o777;

/// Filesystem errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("ENOENT: parent directory does not exist, {operation} '{path}'")]
    ParentNotFound { path: String, operation: String },

    #[error("ENOTDIR: parent is not a directory, {operation} '{path}'")]
    ParentNotDirectory { path: String, operation: String },

    #[error("EEXIST: file already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("EISDIR: illegal operation on a directory, {operation} '{path}'")]
    IsDirectory { path: String, operation: String },

    #[error("ENOTDIR: not a directory, {operation} '{path}'")]
    NotDirectory { path: String, operation: String },

    #[error("EINVAL: not a regular file, {operation} '{path}'")]
    NotFile { path: String, operation: String },

    #[error("EINVAL: not a symbolic link, {operation} '{path}'")]
    NotSymlink { path: String, operation: String },

    #[error("ENOTEMPTY: directory not empty, {operation} '{path}'")]
    NotEmpty { path: String, operation: String },

    #[error("EPERM: operation not permitted on root, {operation} '/'")]
    RootForbidden { operation: String },
}

/// Node kinds in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Dir,
    Symlink,
}

impl NodeKind {
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Dir)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, NodeKind::Symlink)
    }
}

/// File content. The variant is the text/binary tag: text content round-trips
/// as UTF-8 through the wire `stringData` field, binary content as base64
/// through `data`. The tag lives here, never in the mode bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    /// Content length in bytes.
    pub fn len(&self) -> usize {
        match self {
            FileContent::Text(s) => s.len(),
            FileContent::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the content as raw bytes regardless of the tag.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(s) => s.as_bytes(),
            FileContent::Binary(b) => b,
        }
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        FileContent::Text(s)
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        FileContent::Text(s.to_string())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(v: Vec<u8>) -> Self {
        FileContent::Binary(v)
    }
}

impl From<&[u8]> for FileContent {
    fn from(v: &[u8]) -> Self {
        FileContent::Binary(v.to_vec())
    }
}

/// Tree node. Mode is always stored masked to [`PERM_MASK`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsNode {
    File {
        content: FileContent,
        uid: u32,
        gid: u32,
        mode: u32,
    },
    Dir {
        uid: u32,
        gid: u32,
        mode: u32,
    },
    Symlink {
        target: String,
        uid: u32,
        gid: u32,
        mode: u32,
    },
}

impl FsNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            FsNode::File { .. } => NodeKind::File,
            FsNode::Dir { .. } => NodeKind::Dir,
            FsNode::Symlink { .. } => NodeKind::Symlink,
        }
    }

    pub fn uid(&self) -> u32 {
        match self {
            FsNode::File { uid, .. } => *uid,
            FsNode::Dir { uid, .. } => *uid,
            FsNode::Symlink { uid, .. } => *uid,
        }
    }

    pub fn gid(&self) -> u32 {
        match self {
            FsNode::File { gid, .. } => *gid,
            FsNode::Dir { gid, .. } => *gid,
            FsNode::Symlink { gid, .. } => *gid,
        }
    }

    pub fn mode(&self) -> u32 {
        match self {
            FsNode::File { mode, .. } => *mode,
            FsNode::Dir { mode, .. } => *mode,
            FsNode::Symlink { mode, .. } => *mode,
        }
    }

    /// Stats for this node.
    pub fn stats(&self) -> NodeStats {
        let size = match self {
            FsNode::File { content, .. } => content.len() as u64,
            FsNode::Symlink { target, .. } => target.len() as u64,
            FsNode::Dir { .. } => 0,
        };
        NodeStats {
            kind: self.kind(),
            uid: self.uid(),
            gid: self.gid(),
            mode: self.mode() & PERM_MASK,
            size,
        }
    }
}

/// Node status information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStats {
    pub kind: NodeKind,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
    pub size: u64,
}

/// Directory entry: a child name plus its stats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub stats: NodeStats,
}

/// Optional ownership/permission metadata for node creation. Unset fields
/// fall back to the per-kind defaults (uid 0, gid 0, kind-specific mode).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub mode: Option<u32>,
}

impl Metadata {
    pub fn new(uid: u32, gid: u32, mode: u32) -> Self {
        Self {
            uid: Some(uid),
            gid: Some(gid),
            mode: Some(mode),
        }
    }
}

/// Options for mkdir.
#[derive(Debug, Clone, Copy, Default)]
pub struct MkdirOptions {
    pub recursive: bool,
    pub metadata: Metadata,
}

/// Options for rmdir.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmdirOptions {
    pub recursive: bool,
}
