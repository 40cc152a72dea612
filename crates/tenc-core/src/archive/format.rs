//! # Container Layout
//!
//! ```text
//! Header (5 bytes):
//! - Magic: "TENZ" (4 bytes)
//! - Version (1 byte)
//!
//! Data section:
//! - zlib-compressed streams, back to back, in append order
//!
//! Manifest:
//! - postcard-serialized ArchiveManifest
//!
//! Trailer (12 bytes):
//! - Manifest length (u64, little-endian)
//! - Seal marker: "TZOK" (4 bytes)
//! ```
//!
//! The manifest sits at the end so that streams can be compressed straight
//! into the file without knowing their sizes up front. The seal marker is
//! written last; a file without it was never sealed.

use crate::TencError;
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, SEAL_MARKER};
use serde::{Deserialize, Serialize};

/// Size of the file header.
pub const HEADER_SIZE: u64 = 5;

/// Size of the trailer (manifest length + seal marker).
pub const TRAILER_SIZE: u64 = 12;

/// Location of one stream inside the data section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Canonical stream name.
    pub name: String,
    /// Absolute file offset of the compressed bytes.
    pub offset: u64,
    /// Size of the compressed bytes.
    pub compressed_len: u64,
    /// Size of the stream after decompression.
    pub raw_len: u64,
}

/// Directory of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    /// Base name the archive was created with.
    pub base_name: String,
    /// Optional output prefix.
    pub prefix: Option<String>,
    /// Streams in append order.
    pub entries: Vec<ManifestEntry>,
}

impl ArchiveManifest {
    /// Find a stream by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Serialize with postcard.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TencError> {
        postcard::to_stdvec(self).map_err(|e| TencError::format("manifest", e.to_string()))
    }

    /// Deserialize with postcard.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TencError> {
        postcard::from_bytes(bytes).map_err(|e| {
            TencError::format("manifest", format!("Failed to deserialize manifest: {}", e))
        })
    }
}

/// Header bytes for the current format version.
#[must_use]
pub fn header_bytes() -> [u8; 5] {
    let mut bytes = [0u8; 5];
    bytes[0..4].copy_from_slice(MAGIC_BYTES);
    bytes[4] = FORMAT_VERSION;
    bytes
}

/// Validate a header read from `archive`.
pub fn validate_header(bytes: &[u8; 5], archive: &str) -> Result<(), TencError> {
    if &bytes[0..4] != MAGIC_BYTES {
        return Err(TencError::format(archive, "Invalid magic bytes"));
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(TencError::format(
            archive,
            format!(
                "Unsupported version: {} (expected {})",
                bytes[4], FORMAT_VERSION
            ),
        ));
    }
    Ok(())
}

/// Trailer bytes for a manifest of `manifest_len` bytes.
#[must_use]
pub fn trailer_bytes(manifest_len: u64) -> [u8; 12] {
    let mut bytes = [0u8; 12];
    bytes[0..8].copy_from_slice(&manifest_len.to_le_bytes());
    bytes[8..12].copy_from_slice(SEAL_MARKER);
    bytes
}

/// Parse a trailer, returning the manifest length.
///
/// A missing seal marker is a lifecycle error (`TencError::State`): the
/// archive was never sealed, e.g. because the run that wrote it was aborted.
pub fn parse_trailer(bytes: &[u8; 12], archive: &str) -> Result<u64, TencError> {
    if &bytes[8..12] != SEAL_MARKER {
        return Err(TencError::State(format!(
            "archive {} was never sealed",
            archive
        )));
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[0..8]);
    Ok(u64::from_le_bytes(len))
}
