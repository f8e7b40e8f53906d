use tracing::debug;

use crate::encode::VERSION;
use crate::error::{WireError, WireResult};
use crate::reader::BlobReader;
use crate::writer::BlobWriter;

pub(crate) const ENVELOPE_MAGIC: &[u8; 4] = b"SOMZ";

/// Tuning for the compressed envelope.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeConfig {
    /// zstd compression level.
    pub level: i32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self { level: 3 }
    }
}

/// Wrap bytes in a compressed envelope at the default level.
pub fn compress(bytes: &[u8]) -> WireResult<Vec<u8>> {
    compress_with(bytes, &EnvelopeConfig::default())
}

/// Wrap bytes in a compressed envelope: magic, version, declared raw
/// length, zstd stream, CRC32 over the zstd stream.
pub fn compress_with(bytes: &[u8], config: &EnvelopeConfig) -> WireResult<Vec<u8>> {
    let compressed =
        zstd::encode_all(bytes, config.level).map_err(|e| WireError::Compression(e.to_string()))?;
    debug!(
        raw_len = bytes.len(),
        compressed_len = compressed.len(),
        "wrapping blob in compressed envelope"
    );
    let mut w = BlobWriter::new();
    w.put_raw(ENVELOPE_MAGIC);
    w.put_u32(VERSION);
    w.put_varint(bytes.len() as u64);
    let crc = crc32fast::hash(&compressed);
    w.put_raw(&compressed);
    w.put_u32(crc);
    Ok(w.into_inner())
}

/// Returns `true` if the bytes start with the envelope magic.
pub fn is_compressed(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == ENVELOPE_MAGIC
}

/// Unwrap a compressed envelope back to the raw bytes.
pub fn decompress(bytes: &[u8]) -> WireResult<Vec<u8>> {
    if bytes.len() < 8 {
        return Err(WireError::Truncated {
            offset: bytes.len() as u64,
        });
    }
    if &bytes[0..4] != ENVELOPE_MAGIC {
        return Err(WireError::InvalidMagic {
            expected: String::from_utf8_lossy(ENVELOPE_MAGIC).into(),
            actual: String::from_utf8_lossy(&bytes[0..4]).into(),
        });
    }
    let mut r = BlobReader::new(bytes);
    r.read_exact(4)?;
    let version = r.read_u32()?;
    if version != VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    let raw_len = r.read_varint()?;
    if r.remaining() < 4 {
        return Err(WireError::Truncated { offset: r.offset() });
    }
    let zstd_len = r.remaining() - 4;
    let zstd_bytes = r.read_exact(zstd_len)?;
    let crc = r.read_u32()?;
    if crc32fast::hash(zstd_bytes) != crc {
        return Err(WireError::ChecksumMismatch);
    }
    let raw = zstd::decode_all(zstd_bytes).map_err(|e| WireError::Compression(e.to_string()))?;
    if raw.len() as u64 != raw_len {
        return Err(WireError::Corrupt {
            offset: 8,
            reason: format!("declared length {raw_len} but decompressed {}", raw.len()),
        });
    }
    Ok(raw)
}
