//! Docker Status Decompressor
//!
//! Decodes the base64+gzip blob of newline-delimited JSON container records
//! the agent attaches to a box for display. Best-effort by contract: a line
//! that fails to parse is skipped, and a blob that fails to decode or
//! decompress yields an empty list, since the consuming widget treats "no
//! data" as a normal state.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

/// One container record as emitted by `docker ps --format json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Names")]
    pub names: String,
    #[serde(rename = "Command")]
    pub command: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "CreatedAt")]
    pub created_at: String,
    #[serde(rename = "Ports")]
    pub ports: String,
}

/// Decode a base64+gzip blob of JSON-lines container records.
pub fn decode_container_statuses(blob: &str) -> Vec<ContainerStatus> {
    let Some(text) = decompress_blob(blob) else {
        return Vec::new();
    };
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

/// Check if data starts with gzip magic bytes.
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

fn decompress_blob(blob: &str) -> Option<String> {
    let cleaned: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
    let compressed = STANDARD.decode(cleaned.as_bytes()).ok()?;
    if !is_gzip(&compressed) {
        return None;
    }
    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut text = String::new();
    decoder.read_to_string(&mut text).ok()?;
    Some(text)
}

// ============================================================================
// Tests
// ============================================================================
