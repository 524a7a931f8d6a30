//! Bundle Entry Types
//!
//! The flat wire shape of a file bundle entry and its validated in-crate
//! form. Wire entries are duck-shaped (which optional fields are present
//! decides their meaning), so each one is converted to a tagged payload
//! immediately on decode; nothing downstream inspects optional fields.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs::{
    normalize_path, FileContent, FsError, NodeKind, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE,
    DEFAULT_SYMLINK_MODE, PERM_MASK,
};

/// One entry of a file bundle as it travels over the wire.
///
/// `mode` is an octal string (e.g. `"0644"`). An absent or empty `type`
/// means `file` for backward compatibility. A file entry with neither
/// `stringData` nor `data` is an empty file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleFileEntry {
    pub path: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub uid: u32,
    pub gid: u32,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Per-entry validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry path is empty or resolves to root")]
    EmptyPath,

    #[error("unknown entry type '{kind}'")]
    UnknownKind { kind: String },

    #[error("invalid octal mode '{mode}'")]
    InvalidMode { mode: String },

    #[error("invalid base64 in data field: {0}")]
    InvalidBase64(String),

    #[error("symlink entry carries no target")]
    MissingSymlinkTarget,

    #[error("symlink target is not valid UTF-8")]
    InvalidSymlinkTarget,
}

/// Reasons an entry was skipped during import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Fs(#[from] FsError),
}

/// One skipped entry. Import never aborts as a whole; callers decide whether
/// to surface these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    pub path: String,
    pub error: ImportError,
}

/// Validated payload of a wire entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPayload {
    File(FileContent),
    Dir,
    Symlink { target: String },
}

impl EntryPayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            EntryPayload::File(_) => NodeKind::File,
            EntryPayload::Dir => NodeKind::Dir,
            EntryPayload::Symlink { .. } => NodeKind::Symlink,
        }
    }
}

/// A wire entry after validation: normalized path, numeric mode, tagged
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub path: String,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
    pub payload: EntryPayload,
}

impl BundleFileEntry {
    /// Validate and convert to the tagged form.
    pub fn parse(&self) -> Result<ParsedEntry, EntryError> {
        let path = normalize_path(self.path.trim());
        if path == "/" {
            return Err(EntryError::EmptyPath);
        }

        let payload = match self.kind.trim() {
            "" | "file" => EntryPayload::File(self.file_content()?),
            "dir" => EntryPayload::Dir,
            "symlink" => EntryPayload::Symlink {
                target: self.symlink_target()?,
            },
            other => {
                return Err(EntryError::UnknownKind {
                    kind: other.to_string(),
                })
            }
        };

        let default_mode = match payload.kind() {
            NodeKind::File => DEFAULT_FILE_MODE,
            NodeKind::Dir => DEFAULT_DIR_MODE,
            NodeKind::Symlink => DEFAULT_SYMLINK_MODE,
        };
        let mode = parse_mode(&self.mode, default_mode)?;

        Ok(ParsedEntry {
            path,
            uid: self.uid,
            gid: self.gid,
            mode,
            payload,
        })
    }

    fn file_content(&self) -> Result<FileContent, EntryError> {
        if let Some(text) = &self.string_data {
            return Ok(FileContent::Text(text.clone()));
        }
        if let Some(data) = &self.data {
            return Ok(FileContent::Binary(decode_base64(data)?));
        }
        Ok(FileContent::Text(String::new()))
    }

    fn symlink_target(&self) -> Result<String, EntryError> {
        if let Some(text) = &self.string_data {
            return Ok(text.clone());
        }
        if let Some(data) = &self.data {
            let bytes = decode_base64(data)?;
            return String::from_utf8(bytes).map_err(|_| EntryError::InvalidSymlinkTarget);
        }
        Err(EntryError::MissingSymlinkTarget)
    }
}

/// Parse an octal mode string, tolerating surrounding whitespace. An empty
/// string falls back to `default`. The result is masked to the permission
/// range, which also strips the legacy in-band text marker bit some older
/// bundles carry above 0o777.
pub fn parse_mode(mode: &str, default: u32) -> Result<u32, EntryError> {
    let trimmed = mode.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    u32::from_str_radix(trimmed, 8)
        .map(|m| m & PERM_MASK)
        .map_err(|_| EntryError::InvalidMode {
            mode: mode.to_string(),
        })
}

/// Render a mode as the wire's 4-digit octal string, e.g. `0644`.
pub fn format_mode(mode: u32) -> String {
    format!("{:04o}", mode & PERM_MASK)
}

/// Base64 decode tolerating embedded whitespace (wire blobs are sometimes
/// line-wrapped).
pub(crate) fn decode_base64(data: &str) -> Result<Vec<u8>, EntryError> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| EntryError::InvalidBase64(e.to_string()))
}
