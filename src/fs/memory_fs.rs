//! In-Memory File System
//!
//! A transient, path-addressed tree used as an editable staging area for a
//! file bundle. One instance is owned by one editor session: built from the
//! wire entries, mutated in place, then flattened back (or discarded). No
//! I/O, no persistence, no sharing.

use std::collections::HashMap;

use super::types::*;

/// In-memory virtual file system keyed by normalized absolute path.
///
/// The root `/` always exists and is always a directory. Symlink targets are
/// stored as opaque strings and never traversed, so the structure is a tree
/// by construction.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    nodes: HashMap<String, FsNode>,
}

impl MemoryFileSystem {
    /// Create a filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            "/".to_string(),
            FsNode::Dir {
                uid: 0,
                gid: 0,
                mode: DEFAULT_DIR_MODE,
            },
        );
        Self { nodes }
    }

    /// Stats for the node at `path`, or `None` if nothing is there. Callers
    /// are expected to check before acting; absence is not an error.
    pub fn stat(&self, path: &str) -> Option<NodeStats> {
        self.nodes.get(&normalize_path(path)).map(FsNode::stats)
    }

    /// True iff a node is registered at the normalized path.
    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(&normalize_path(path))
    }

    /// Read the content of a file node.
    pub fn read_file(&self, path: &str) -> Result<&FileContent, FsError> {
        let normalized = normalize_path(path);
        match self.nodes.get(&normalized) {
            Some(FsNode::File { content, .. }) => Ok(content),
            Some(FsNode::Dir { .. }) => Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "read".to_string(),
            }),
            Some(FsNode::Symlink { .. }) => Err(FsError::NotFile {
                path: path.to_string(),
                operation: "read".to_string(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "open".to_string(),
            }),
        }
    }

    /// Create or overwrite a file node. The immediate parent must already be
    /// a directory; ancestor synthesis is the bundle codec's job, not this
    /// primitive's. Overwriting keeps the existing ownership and mode unless
    /// `metadata` overrides them.
    pub fn write_file(
        &mut self,
        path: &str,
        content: impl Into<FileContent>,
        metadata: &Metadata,
    ) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        if normalized == "/" {
            return Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "write".to_string(),
            });
        }
        if let Some(FsNode::Dir { .. }) = self.nodes.get(&normalized) {
            return Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "write".to_string(),
            });
        }
        self.check_parent(&normalized, path, "write")?;

        let (uid, gid, mode) = match self.nodes.get(&normalized) {
            Some(existing) => (
                metadata.uid.unwrap_or_else(|| existing.uid()),
                metadata.gid.unwrap_or_else(|| existing.gid()),
                metadata.mode.unwrap_or_else(|| existing.mode()),
            ),
            None => (
                metadata.uid.unwrap_or(0),
                metadata.gid.unwrap_or(0),
                metadata.mode.unwrap_or(DEFAULT_FILE_MODE),
            ),
        };
        self.nodes.insert(
            normalized,
            FsNode::File {
                content: content.into(),
                uid,
                gid,
                mode: mode & PERM_MASK,
            },
        );
        Ok(())
    }

    /// Create a directory node.
    pub fn mkdir(&mut self, path: &str, options: &MkdirOptions) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        match self.nodes.get(&normalized) {
            Some(FsNode::Dir { .. }) => {
                // Existing directory: tolerated when recursive.
                if options.recursive {
                    return Ok(());
                }
                return Err(FsError::AlreadyExists {
                    path: path.to_string(),
                    operation: "mkdir".to_string(),
                });
            }
            Some(_) => {
                return Err(FsError::AlreadyExists {
                    path: path.to_string(),
                    operation: "mkdir".to_string(),
                });
            }
            None => {}
        }

        if options.recursive {
            let mut current = String::new();
            let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
            for (i, part) in parts.iter().enumerate() {
                current = format!("{}/{}", current, part);
                match self.nodes.get(&current) {
                    Some(FsNode::Dir { .. }) => {}
                    Some(_) => {
                        return Err(FsError::AlreadyExists {
                            path: current.clone(),
                            operation: "mkdir".to_string(),
                        });
                    }
                    None => {
                        let metadata = if i == parts.len() - 1 {
                            options.metadata
                        } else {
                            Metadata::default()
                        };
                        self.nodes.insert(current.clone(), dir_node(&metadata));
                    }
                }
            }
            return Ok(());
        }

        self.check_parent(&normalized, path, "mkdir")?;
        self.nodes.insert(normalized, dir_node(&options.metadata));
        Ok(())
    }

    /// Remove a directory. Without `recursive` the directory must be empty;
    /// with it the whole subtree is removed. Root is protected.
    pub fn rmdir(&mut self, path: &str, options: &RmdirOptions) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        if normalized == "/" {
            return Err(FsError::RootForbidden {
                operation: "rmdir".to_string(),
            });
        }
        match self.nodes.get(&normalized) {
            Some(FsNode::Dir { .. }) => {}
            Some(_) => {
                return Err(FsError::NotDirectory {
                    path: path.to_string(),
                    operation: "rmdir".to_string(),
                });
            }
            None => {
                return Err(FsError::NotFound {
                    path: path.to_string(),
                    operation: "rmdir".to_string(),
                });
            }
        }

        let prefix = format!("{}/", normalized);
        let descendants: Vec<String> = self
            .nodes
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();

        if !descendants.is_empty() && !options.recursive {
            return Err(FsError::NotEmpty {
                path: path.to_string(),
                operation: "rmdir".to_string(),
            });
        }
        for key in descendants {
            self.nodes.remove(&key);
        }
        self.nodes.remove(&normalized);
        Ok(())
    }

    /// Remove a file or symlink node.
    pub fn unlink(&mut self, path: &str) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        match self.nodes.get(&normalized) {
            Some(FsNode::Dir { .. }) => Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: "unlink".to_string(),
            }),
            Some(_) => {
                self.nodes.remove(&normalized);
                Ok(())
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "unlink".to_string(),
            }),
        }
    }

    /// Create a symlink node. `target` is stored verbatim and never resolved.
    pub fn symlink(
        &mut self,
        target: &str,
        path: &str,
        metadata: &Metadata,
    ) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        if normalized == "/" || self.nodes.contains_key(&normalized) {
            return Err(FsError::AlreadyExists {
                path: path.to_string(),
                operation: "symlink".to_string(),
            });
        }
        self.check_parent(&normalized, path, "symlink")?;
        self.nodes.insert(
            normalized,
            FsNode::Symlink {
                target: target.to_string(),
                uid: metadata.uid.unwrap_or(0),
                gid: metadata.gid.unwrap_or(0),
                mode: metadata.mode.unwrap_or(DEFAULT_SYMLINK_MODE) & PERM_MASK,
            },
        );
        Ok(())
    }

    /// Read the stored target of a symlink node.
    pub fn readlink(&self, path: &str) -> Result<&str, FsError> {
        let normalized = normalize_path(path);
        match self.nodes.get(&normalized) {
            Some(FsNode::Symlink { target, .. }) => Ok(target),
            Some(_) => Err(FsError::NotSymlink {
                path: path.to_string(),
                operation: "readlink".to_string(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "readlink".to_string(),
            }),
        }
    }

    /// List the immediate children of a directory, sorted by name.
    pub fn readdir(&self, path: &str) -> Result<Vec<DirEntry>, FsError> {
        let normalized = normalize_path(path);
        match self.nodes.get(&normalized) {
            Some(FsNode::Dir { .. }) => {}
            Some(_) => {
                return Err(FsError::NotDirectory {
                    path: path.to_string(),
                    operation: "scandir".to_string(),
                });
            }
            None => {
                return Err(FsError::NotFound {
                    path: path.to_string(),
                    operation: "scandir".to_string(),
                });
            }
        }

        let prefix = if normalized == "/" {
            "/".to_string()
        } else {
            format!("{}/", normalized)
        };

        let mut entries: Vec<DirEntry> = self
            .nodes
            .iter()
            .filter_map(|(p, node)| {
                let rest = p.strip_prefix(&prefix)?;
                if rest.is_empty() || rest.contains('/') {
                    return None;
                }
                Some(DirEntry {
                    name: rest.to_string(),
                    stats: node.stats(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Update ownership metadata in place.
    pub fn chown(&mut self, path: &str, uid: u32, gid: u32) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        match self.nodes.get_mut(&normalized) {
            Some(FsNode::File { uid: u, gid: g, .. })
            | Some(FsNode::Dir { uid: u, gid: g, .. })
            | Some(FsNode::Symlink { uid: u, gid: g, .. }) => {
                *u = uid;
                *g = gid;
                Ok(())
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "chown".to_string(),
            }),
        }
    }

    /// Update permission bits in place. The stored mode is masked to
    /// [`PERM_MASK`]; content and the text/binary tag are untouched.
    pub fn chmod(&mut self, path: &str, mode: u32) -> Result<(), FsError> {
        let normalized = normalize_path(path);
        match self.nodes.get_mut(&normalized) {
            Some(FsNode::File { mode: m, .. })
            | Some(FsNode::Dir { mode: m, .. })
            | Some(FsNode::Symlink { mode: m, .. }) => {
                *m = mode & PERM_MASK;
                Ok(())
            }
            None => Err(FsError::NotFound {
                path: path.to_string(),
                operation: "chmod".to_string(),
            }),
        }
    }

    /// All registered paths, sorted. Root comes first.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.nodes.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // Root is always present; "empty" means nothing else is.
        self.nodes.len() <= 1
    }

    fn check_parent(&self, normalized: &str, path: &str, operation: &str) -> Result<(), FsError> {
        let parent = dirname(normalized);
        match self.nodes.get(&parent) {
            Some(FsNode::Dir { .. }) => Ok(()),
            Some(_) => Err(FsError::ParentNotDirectory {
                path: path.to_string(),
                operation: operation.to_string(),
            }),
            None => Err(FsError::ParentNotFound {
                path: path.to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn dir_node(metadata: &Metadata) -> FsNode {
    FsNode::Dir {
        uid: metadata.uid.unwrap_or(0),
        gid: metadata.gid.unwrap_or(0),
        mode: metadata.mode.unwrap_or(DEFAULT_DIR_MODE) & PERM_MASK,
    }
}

// ============================================================================
// Path utilities
// ============================================================================

/// Normalize to an absolute, slash-separated path with no trailing slash
/// (except root), resolving `.` and `..` components.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    let parts = path.split('/').filter(|p| !p.is_empty() && *p != ".");
    let mut resolved: Vec<&str> = Vec::new();
    for part in parts {
        if part == ".." {
            resolved.pop();
        } else {
            resolved.push(part);
        }
    }
    if resolved.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", resolved.join("/"))
    }
}

/// Parent of a normalized path. The parent of `/` is `/`.
pub fn dirname(path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized == "/" {
        return "/".to_string();
    }
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(pos) => normalized[..pos].to_string(),
        None => "/".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
