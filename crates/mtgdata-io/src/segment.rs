//! Dataset segment file format.
//!
//! Layout on disk:
//! [ magic: u32 ][ version: u16 ][ codec: u8 ][ reserved: u8 ]
//! [ uncompressed_len: u64 ][ compressed_len: u64 ][ checksum: 32 bytes ]
//! [ payload bytes … ]
//!
//! The payload is the codec-compressed JSON encoding of a `Dataset`; the
//! checksum is blake3 over the payload. Any mismatch (short file, wrong
//! magic, bad checksum) is an error, which the cache turns into a miss.

use mtgdata_core::dataset::Dataset;
use mtgdata_core::hash::hash_bytes;

use crate::codec::{self, Codec};
use crate::error::{Error, Result};

pub const MAGIC: u32 = 0x4D544743; // "MTGC"
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 8 + 8 + 32;

/// Upper bound on a decoded payload; guards against corrupted length fields.
pub const MAX_PAYLOAD_BYTES: u64 = 4 * 1024 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    pub magic: u32,
    pub version: u16,
    pub codec: Codec,
    pub uncompressed_len: u64,
    pub compressed_len: u64,
    pub checksum: [u8; 32],
}

impl SegmentHeader {
    pub fn new(codec: Codec, uncompressed_len: u64, payload: &[u8]) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            codec,
            uncompressed_len,
            compressed_len: payload.len() as u64,
            checksum: hash_bytes(payload).0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.push(self.codec as u8);
        out.push(0u8); // reserved
        out.extend_from_slice(&self.uncompressed_len.to_le_bytes());
        out.extend_from_slice(&self.compressed_len.to_le_bytes());
        out.extend_from_slice(&self.checksum);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Storage("short header".into()));
        }
        let magic = u32::from_le_bytes(le_array(&bytes[0..4])?);
        let version = u16::from_le_bytes(le_array(&bytes[4..6])?);
        if magic != MAGIC || version != VERSION {
            return Err(Error::Storage("bad magic/version".into()));
        }
        let codec = Codec::from_u8(bytes[6])?;
        // bytes[7] reserved
        let uncompressed_len = u64::from_le_bytes(le_array(&bytes[8..16])?);
        let compressed_len = u64::from_le_bytes(le_array(&bytes[16..24])?);
        let checksum: [u8; 32] = le_array(&bytes[24..56])?;

        Ok(Self {
            magic,
            version,
            codec,
            uncompressed_len,
            compressed_len,
            checksum,
        })
    }

    /// Validate that the sizes in the header are reasonable.
    pub fn validate_sizes(&self, max: u64) -> Result<()> {
        if self.uncompressed_len > max || self.compressed_len > max {
            return Err(Error::Storage(format!(
                "segment lengths ({} / {}) exceed max {max}",
                self.uncompressed_len, self.compressed_len
            )));
        }
        if self.codec == Codec::None && self.compressed_len != self.uncompressed_len {
            return Err(Error::Storage(
                "uncompressed segment with mismatched lengths".into(),
            ));
        }
        Ok(())
    }
}

fn le_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| Error::Storage(format!("expected {N} header bytes")))
}

/// Serialize and frame a dataset.
pub fn encode(dataset: &Dataset, codec: Codec) -> Result<Vec<u8>> {
    let uncompressed = serde_json::to_vec(dataset)?;
    let payload = codec::compress(codec, &uncompressed)?;
    let header = SegmentHeader::new(codec, uncompressed.len() as u64, &payload);

    let mut out = header.to_bytes();
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Verify and decode a framed dataset.
pub fn decode(bytes: &[u8]) -> Result<Dataset> {
    let header = SegmentHeader::from_bytes(bytes)?;
    header.validate_sizes(MAX_PAYLOAD_BYTES)?;

    let payload = &bytes[HEADER_LEN..];
    if payload.len() as u64 != header.compressed_len {
        return Err(Error::Storage(format!(
            "segment truncated: payload {} bytes, header says {}",
            payload.len(),
            header.compressed_len
        )));
    }
    let computed: [u8; 32] = hash_bytes(payload).0;
    if computed != header.checksum {
        return Err(Error::ChecksumMismatch);
    }

    let uncompressed = codec::decompress(header.codec, payload)?;
    if uncompressed.len() as u64 != header.uncompressed_len {
        return Err(Error::Codec("decompressed length mismatch".into()));
    }
    let dataset: Dataset = serde_json::from_slice(&uncompressed)?;
    dataset.validate()?;
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtgdata_core::schema::{DataType, Field, Schema};
    use mtgdata_core::types::Scalar;

    fn dataset() -> Dataset {
        let mut ds = Dataset::empty(Schema::new(vec![
            Field::new("name", DataType::Utf8),
            Field::new("types", DataType::list(DataType::Utf8)),
        ]));
        ds.batch
            .push_row(vec![
                Scalar::Str("Opt".into()),
                Scalar::List(vec![Scalar::Str("Instant".into())]),
            ])
            .unwrap();
        ds
    }

    #[test]
    fn test_header_roundtrip() {
        let h = SegmentHeader::new(Codec::None, 3, b"abc");
        let parsed = SegmentHeader::from_bytes(&h.to_bytes()).unwrap();
        assert_eq!(parsed, h);
        assert_eq!(h.to_bytes().len(), HEADER_LEN);
    }

    #[test]
    fn test_encode_decode() {
        let bytes = encode(&dataset(), Codec::None).unwrap();
        assert_eq!(decode(&bytes).unwrap(), dataset());
    }

    #[test]
    fn test_flipped_payload_byte_fails_checksum() {
        let mut bytes = encode(&dataset(), Codec::None).unwrap();
        let last = bytes.len() - 2;
        bytes[last] ^= 0xFF;
        assert!(matches!(decode(&bytes), Err(Error::ChecksumMismatch)));
    }

    #[test]
    fn test_truncated_segment_is_rejected() {
        let bytes = encode(&dataset(), Codec::None).unwrap();
        assert!(decode(&bytes[..bytes.len() - 10]).is_err());
        assert!(decode(&bytes[..HEADER_LEN - 1]).is_err());
        assert!(decode(b"not a segment at all").is_err());
    }
}
