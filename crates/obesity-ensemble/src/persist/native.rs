//! Native `.sav` artifact format.
//!
//! A 32-byte header followed by a Postcard-encoded payload.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Header (32 bytes)                        │
//! ├────────────────────────────────────────────────────────────┤
//! │                    Payload (variable)                       │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::io::{Read, Write};

use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying an artifact file.
pub const MAGIC: &[u8; 4] = b"OBES";

/// Current format version (major).
pub const CURRENT_VERSION_MAJOR: u8 = 1;

/// Current format version (minor).
pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 32;

// ============================================================================
// Format Flags
// ============================================================================

/// Bitfield flags for format features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags(u16);

impl FormatFlags {
    /// Payload carries a fitted feature transformer.
    pub const HAS_TRANSFORMER: u16 = 1 << 0;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// 32-byte artifact header.
///
/// # Layout
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     Magic ("OBES")
/// 4       1     Version major
/// 5       1     Version minor
/// 6       2     Reserved
/// 8       2     Flags (bitfield)
/// 10      2     Reserved
/// 12      4     Payload size (bytes)
/// 16      4     CRC32 checksum of payload
/// 20      4     Number of features
/// 24      4     Number of classes
/// 28      4     Number of ensemble members
/// ```
///
/// All integers are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub flags: FormatFlags,
    pub payload_size: u32,
    pub checksum: u32,
    pub num_features: u32,
    pub num_classes: u32,
    pub num_members: u32,
}

impl FormatHeader {
    /// Create a header with the current version.
    pub fn new(num_features: u32, num_classes: u32, num_members: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            flags: FormatFlags::empty(),
            payload_size: 0,
            checksum: 0,
            num_features,
            num_classes,
            num_members,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[8..10].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[12..16].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.checksum.to_le_bytes());
        buf[20..24].copy_from_slice(&self.num_features.to_le_bytes());
        buf[24..28].copy_from_slice(&self.num_classes.to_le_bytes());
        buf[28..32].copy_from_slice(&self.num_members.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DeserializeError> {
        if &buf[0..4] != MAGIC {
            return Err(DeserializeError::NotAnArtifact);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(DeserializeError::UnsupportedVersion { major: version_major, minor: version_minor });
        }

        let u32_at = |offset: usize| u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]]);

        Ok(Self {
            version_major,
            version_minor,
            flags: FormatFlags::from_bits(u16::from_le_bytes([buf[8], buf[9]])),
            payload_size: u32_at(12),
            checksum: u32_at(16),
            num_features: u32_at(20),
            num_classes: u32_at(24),
            num_members: u32_at(28),
        })
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while writing an artifact.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("payload of {0} bytes exceeds the format limit")]
    PayloadTooLarge(usize),
}

/// Errors that can occur while reading an artifact.
#[derive(Debug, Error)]
pub enum DeserializeError {
    /// Wrong magic bytes.
    #[error("not a model artifact")]
    NotAnArtifact,

    #[error("artifact requires format {major}.{minor} or later")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Payload decodes but violates a structural invariant.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),
}

// ============================================================================
// CRC32 Helper
// ============================================================================

/// CRC32 checksum of `data`.
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// ============================================================================
// Native Codec
// ============================================================================

/// Write header and payload to a writer.
///
/// Fills in the header's payload size and checksum.
pub fn write_to<W: Write>(writer: &mut W, header: &mut FormatHeader, payload: &[u8]) -> Result<(), SerializeError> {
    header.payload_size = u32::try_from(payload.len()).map_err(|_| SerializeError::PayloadTooLarge(payload.len()))?;
    header.checksum = compute_checksum(payload);

    writer.write_all(&header.to_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

/// Read header and payload from a reader, verifying the checksum.
pub fn read_from<R: Read>(reader: &mut R) -> Result<(FormatHeader, Vec<u8>), DeserializeError> {
    let mut header_buf = [0u8; HEADER_SIZE];
    let got = read_up_to(reader, &mut header_buf)?;
    if got < HEADER_SIZE {
        return Err(DeserializeError::Truncated { expected: HEADER_SIZE, actual: got });
    }
    let header = FormatHeader::from_bytes(&header_buf)?;

    let expected = header.payload_size as usize;
    let mut payload = Vec::with_capacity(expected.min(1 << 24));
    reader.by_ref().take(expected as u64).read_to_end(&mut payload)?;
    if payload.len() < expected {
        return Err(DeserializeError::Truncated {
            expected: HEADER_SIZE + expected,
            actual: HEADER_SIZE + payload.len(),
        });
    }

    let actual = compute_checksum(&payload);
    if actual != header.checksum {
        return Err(DeserializeError::ChecksumMismatch { expected: header.checksum, actual });
    }
    Ok((header, payload))
}

/// Encode `payload` with postcard behind a header.
pub fn serialize<T: serde::Serialize>(mut header: FormatHeader, payload: &T) -> Result<Vec<u8>, SerializeError> {
    let payload_bytes = postcard::to_allocvec(payload)?;
    let mut output = Vec::with_capacity(HEADER_SIZE + payload_bytes.len());
    write_to(&mut output, &mut header, &payload_bytes)?;
    Ok(output)
}

/// Decode a header and postcard payload from bytes.
///
/// Bytes after the payload are rejected.
pub fn deserialize<T: for<'de> serde::Deserialize<'de>>(bytes: &[u8]) -> Result<(FormatHeader, T), DeserializeError> {
    let mut cursor = bytes;
    let (header, payload_bytes) = read_from(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(DeserializeError::CorruptPayload(format!("{} trailing bytes", cursor.len())));
    }
    let payload = postcard::from_bytes(&payload_bytes)?;
    Ok((header, payload))
}

/// Fill `buf` as far as the reader allows; returns the bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ============================================================================
// Tests
// ============================================================================
