//! Bundle Entry Codec
//!
//! Bidirectional conversion between the flat wire entry list and a
//! [`MemoryFileSystem`]. Import is order-insensitive (entries are sorted so
//! ancestors materialize first) and never aborts as a whole: entries that
//! fail validation or collide with a different node kind are skipped and
//! reported in the returned warning list. Export walks the tree depth-first,
//! parent before child, so a straight re-import round-trips.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;

use super::types::{
    format_mode, BundleFileEntry, EntryPayload, ImportWarning, ParsedEntry,
};
use crate::fs::{
    dirname, FileContent, FsError, MemoryFileSystem, Metadata, MkdirOptions, NodeKind, NodeStats,
};

/// Result of importing a bundle: the constructed tree plus one warning per
/// skipped entry.
#[derive(Debug)]
pub struct BundleImport {
    pub fs: MemoryFileSystem,
    pub warnings: Vec<ImportWarning>,
}

/// Build a tree from a flat entry list.
///
/// Entries are deduplicated by normalized path and kind (the last occurrence
/// wins, input order otherwise preserved), then applied dirs first, files
/// second, symlinks last, shallower paths before deeper ones. Entries of
/// different kinds claiming the same path are all applied, so the loser of
/// such a collision is reported in the warning list rather than silently
/// dropped. Missing ancestor directories are synthesized with default
/// metadata.
pub fn import(entries: &[BundleFileEntry]) -> BundleImport {
    let mut warnings = Vec::new();

    let mut parsed: IndexMap<(String, NodeKind), ParsedEntry> = IndexMap::new();
    for entry in entries {
        match entry.parse() {
            Ok(p) => {
                parsed.insert((p.path.clone(), p.payload.kind()), p);
            }
            Err(e) => warnings.push(ImportWarning {
                path: entry.path.clone(),
                error: e.into(),
            }),
        }
    }

    let mut ordered: Vec<ParsedEntry> = parsed.into_values().collect();
    ordered.sort_by_key(|e| (kind_rank(e.payload.kind()), depth(&e.path)));

    let mut fs = MemoryFileSystem::new();
    for entry in &ordered {
        if let Err(e) = apply_entry(&mut fs, entry) {
            warnings.push(ImportWarning {
                path: entry.path.clone(),
                error: e.into(),
            });
        }
    }

    BundleImport { fs, warnings }
}

/// Flatten a tree back into the wire entry list, depth-first with children
/// in name order. Root itself is not emitted.
pub fn export(fs: &MemoryFileSystem) -> Vec<BundleFileEntry> {
    let mut out = Vec::new();
    export_dir(fs, "/", &mut out);
    out
}

fn apply_entry(fs: &mut MemoryFileSystem, entry: &ParsedEntry) -> Result<(), FsError> {
    let parent = dirname(&entry.path);
    if parent != "/" {
        fs.mkdir(
            &parent,
            &MkdirOptions {
                recursive: true,
                metadata: Metadata::default(),
            },
        )?;
    }

    let metadata = Metadata::new(entry.uid, entry.gid, entry.mode);
    match &entry.payload {
        // Explicit dirs sort shallow-first and ahead of files/symlinks, so
        // this path cannot have been synthesized as an ancestor yet.
        EntryPayload::Dir => fs.mkdir(
            &entry.path,
            &MkdirOptions {
                recursive: false,
                metadata,
            },
        ),
        EntryPayload::File(content) => fs.write_file(&entry.path, content.clone(), &metadata),
        EntryPayload::Symlink { target } => fs.symlink(target, &entry.path, &metadata),
    }
}

fn export_dir(fs: &MemoryFileSystem, dir: &str, out: &mut Vec<BundleFileEntry>) {
    let Ok(children) = fs.readdir(dir) else {
        return;
    };
    for child in children {
        let path = join(dir, &child.name);
        out.push(wire_entry(fs, &path, &child.stats));
        if child.stats.kind.is_dir() {
            export_dir(fs, &path, out);
        }
    }
}

fn wire_entry(fs: &MemoryFileSystem, path: &str, stats: &NodeStats) -> BundleFileEntry {
    let mut entry = BundleFileEntry {
        path: path.to_string(),
        kind: kind_str(stats.kind).to_string(),
        uid: stats.uid,
        gid: stats.gid,
        mode: format_mode(stats.mode),
        string_data: None,
        data: None,
    };
    match stats.kind {
        NodeKind::Dir => {}
        NodeKind::File => match fs.read_file(path) {
            Ok(FileContent::Text(text)) => entry.string_data = Some(text.clone()),
            Ok(FileContent::Binary(bytes)) => entry.data = Some(STANDARD.encode(bytes)),
            Err(_) => {}
        },
        NodeKind::Symlink => {
            if let Ok(target) = fs.readlink(path) {
                entry.string_data = Some(target.to_string());
            }
        }
    }
    entry
}

fn kind_rank(kind: NodeKind) -> u8 {
    match kind {
        NodeKind::Dir => 0,
        NodeKind::File => 1,
        NodeKind::Symlink => 2,
    }
}

fn kind_str(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::File => "file",
        NodeKind::Dir => "dir",
        NodeKind::Symlink => "symlink",
    }
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::types::{EntryError, ImportError};

    fn file(path: &str, text: &str, mode: &str) -> BundleFileEntry {
        BundleFileEntry {
            path: path.to_string(),
            kind: "file".to_string(),
            mode: mode.to_string(),
            string_data: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn dir(path: &str, mode: &str) -> BundleFileEntry {
        BundleFileEntry {
            path: path.to_string(),
            kind: "dir".to_string(),
            mode: mode.to_string(),
            ..Default::default()
        }
    }

    fn symlink(path: &str, target: &str) -> BundleFileEntry {
        BundleFileEntry {
            path: path.to_string(),
            kind: "symlink".to_string(),
            string_data: Some(target.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_example_scenario() {
        // Single entry /cfg/app.yaml: /cfg is synthesized, export yields
        // exactly the two non-root nodes.
        let entries = vec![file("/cfg/app.yaml", "a: 1", "0644")];
        let result = import(&entries);
        assert!(result.warnings.is_empty());

        let fs = &result.fs;
        assert!(fs.stat("/").unwrap().kind.is_dir());
        assert!(fs.stat("/cfg").unwrap().kind.is_dir());
        assert_eq!(
            fs.read_file("/cfg/app.yaml").unwrap(),
            &FileContent::Text("a: 1".to_string())
        );

        let exported = export(fs);
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].path, "/cfg");
        assert_eq!(exported[0].kind, "dir");
        assert_eq!(exported[1].path, "/cfg/app.yaml");
        assert_eq!(exported[1].mode, "0644");
        assert_eq!(exported[1].string_data.as_deref(), Some("a: 1"));
        assert_eq!(exported[1].data, None);
    }

    #[test]
    fn test_ancestor_auto_creation() {
        let result = import(&[file("/a/b/c.txt", "x", "0644")]);
        assert!(result.warnings.is_empty());
        assert!(result.fs.stat("/a").unwrap().kind.is_dir());
        assert!(result.fs.stat("/a/b").unwrap().kind.is_dir());
        assert_eq!(result.fs.stat("/a").unwrap().mode, 0o755);
    }

    #[test]
    fn test_import_order_insensitive() {
        // Deeper and later-kind entries listed first; sorting fixes it.
        let entries = vec![
            symlink("/a/b/link", "/a/b/f.txt"),
            file("/a/b/f.txt", "data", "0600"),
            dir("/a/b", "0700"),
            dir("/a", "0750"),
        ];
        let result = import(&entries);
        assert!(result.warnings.is_empty());
        let fs = &result.fs;
        assert_eq!(fs.stat("/a").unwrap().mode, 0o750);
        assert_eq!(fs.stat("/a/b").unwrap().mode, 0o700);
        assert_eq!(fs.stat("/a/b/f.txt").unwrap().mode, 0o600);
        assert_eq!(fs.readlink("/a/b/link").unwrap(), "/a/b/f.txt");
    }

    #[test]
    fn test_explicit_dir_entry_overrides_synthesized_metadata() {
        // Dirs apply before files, so the explicit /cfg entry owns its
        // metadata regardless of input order.
        let entries = vec![
            file("/cfg/app.yaml", "a: 1", "0644"),
            BundleFileEntry {
                path: "/cfg".to_string(),
                kind: "dir".to_string(),
                uid: 7,
                gid: 8,
                mode: "0700".to_string(),
                ..Default::default()
            },
        ];
        let result = import(&entries);
        assert!(result.warnings.is_empty());
        let stats = result.fs.stat("/cfg").unwrap();
        assert_eq!((stats.uid, stats.gid, stats.mode), (7, 8, 0o700));
    }

    #[test]
    fn test_duplicate_paths_last_wins() {
        let entries = vec![file("/f", "first", "0644"), file("/f", "second", "0600")];
        let result = import(&entries);
        assert!(result.warnings.is_empty());
        assert_eq!(
            result.fs.read_file("/f").unwrap(),
            &FileContent::Text("second".to_string())
        );
        assert_eq!(result.fs.stat("/f").unwrap().mode, 0o600);
    }

    #[test]
    fn test_malformed_entry_skipped_with_warning() {
        let entries = vec![
            file("/good.txt", "ok", "0644"),
            BundleFileEntry {
                path: "/bad.bin".to_string(),
                data: Some("%%%".to_string()),
                ..Default::default()
            },
        ];
        let result = import(&entries);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "/bad.bin");
        assert!(matches!(
            result.warnings[0].error,
            ImportError::Entry(EntryError::InvalidBase64(_))
        ));
        // The rest of the bundle still loads.
        assert!(result.fs.exists("/good.txt"));
        assert!(!result.fs.exists("/bad.bin"));
    }

    #[test]
    fn test_kind_collision_skipped_with_warning() {
        // A file entry whose path an explicit dir entry also claims: dirs
        // apply first, the file collides and is reported.
        let entries = vec![dir("/clash", "0755"), file("/clash", "x", "0644")];
        let result = import(&entries);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "/clash");
        assert!(matches!(
            result.warnings[0].error,
            ImportError::Fs(FsError::IsDirectory { .. })
        ));
        assert!(result.fs.stat("/clash").unwrap().kind.is_dir());
    }

    #[test]
    fn test_dir_entry_not_discarded_by_later_file_entry() {
        // A file entry listed after a dir entry for the same path must not
        // swallow the dir during deduplication: the dir applies, the file
        // collides and lands in the warning list.
        let entries = vec![dir("/shared", "0700"), file("/shared", "x", "0644")];
        let result = import(&entries);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "/shared");
        assert!(matches!(
            result.warnings[0].error,
            ImportError::Fs(FsError::IsDirectory { .. })
        ));
        let stats = result.fs.stat("/shared").unwrap();
        assert!(stats.kind.is_dir());
        assert_eq!(stats.mode, 0o700);

        // Same outcome with the listing order reversed.
        let entries = vec![file("/shared", "x", "0644"), dir("/shared", "0700")];
        let result = import(&entries);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.fs.stat("/shared").unwrap().kind.is_dir());
    }

    #[test]
    fn test_duplicate_symlinks_last_wins() {
        let entries = vec![symlink("/l", "/old"), symlink("/l", "/new")];
        let result = import(&entries);
        assert!(result.warnings.is_empty());
        assert_eq!(result.fs.readlink("/l").unwrap(), "/new");
    }

    #[test]
    fn test_file_blocking_ancestor_reported() {
        let entries = vec![file("/a", "i am a file", "0644"), file("/a/b", "x", "0644")];
        let result = import(&entries);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "/a/b");
        assert!(!result.fs.exists("/a/b"));
    }

    #[test]
    fn test_round_trip_law() {
        let entries = vec![
            dir("/etc", "0755"),
            file("/etc/app.conf", "key=value\n", "0640"),
            BundleFileEntry {
                path: "/etc/blob".to_string(),
                uid: 3,
                gid: 4,
                mode: "0600".to_string(),
                data: Some(STANDARD.encode([0u8, 255, 128, 7])),
                ..Default::default()
            },
            symlink("/etc/link", "app.conf"),
            file("/var/log/empty.log", "", "0644"),
        ];
        let first = import(&entries);
        assert!(first.warnings.is_empty());
        let exported = export(&first.fs);

        // Parent always precedes child in the exported order.
        for (i, entry) in exported.iter().enumerate() {
            let parent = dirname(&entry.path);
            if parent != "/" {
                assert!(
                    exported[..i].iter().any(|e| e.path == parent),
                    "parent {} must precede {}",
                    parent,
                    entry.path
                );
            }
        }

        let second = import(&exported);
        assert!(second.warnings.is_empty());
        for path in first.fs.paths() {
            let a = first.fs.stat(&path).unwrap();
            let b = second.fs.stat(&path).unwrap();
            assert_eq!(a, b, "stats differ at {}", path);
        }
        assert_eq!(first.fs.paths(), second.fs.paths());
        assert_eq!(
            second.fs.read_file("/etc/blob").unwrap(),
            &FileContent::Binary(vec![0, 255, 128, 7])
        );
        assert_eq!(
            second.fs.read_file("/etc/app.conf").unwrap(),
            &FileContent::Text("key=value\n".to_string())
        );
        assert_eq!(second.fs.readlink("/etc/link").unwrap(), "app.conf");
    }

    #[test]
    fn test_export_binary_as_base64() {
        let result = import(&[BundleFileEntry {
            path: "/b".to_string(),
            data: Some(STANDARD.encode(b"raw")),
            ..Default::default()
        }]);
        let exported = export(&result.fs);
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].data.as_deref(), Some(STANDARD.encode(b"raw").as_str()));
        assert_eq!(exported[0].string_data, None);
    }

    #[test]
    fn test_export_symlink_target_in_string_data() {
        let result = import(&[symlink("/link", "/somewhere/else")]);
        let exported = export(&result.fs);
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].kind, "symlink");
        assert_eq!(exported[0].string_data.as_deref(), Some("/somewhere/else"));
        assert_eq!(exported[0].mode, "0777");
    }

    #[test]
    fn test_empty_bundle() {
        let result = import(&[]);
        assert!(result.warnings.is_empty());
        assert!(result.fs.is_empty());
        assert!(export(&result.fs).is_empty());
    }
}
