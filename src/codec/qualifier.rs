//! Column qualifier layout.
//!
//! ```text
//! +-----------------+--------+-----------------+
//! | offset u16 (BE) | len u8 | tag (len bytes) |
//! +-----------------+--------+-----------------+
//! ```
//!
//! Several fields recorded at the same instant share an offset and differ by tag.
//! Readers skip tags they do not recognise.

use crate::codec::OFFSET_LEN;
use crate::store::StoreError;
use crate::{Error, Result};

/// Tag of the volume field, the only field currently written.
pub const VOLUME_TAG: &str = "v";

/// Qualifier split into its offset and tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qualifier<'a> {
    pub offset: u16,
    pub tag: &'a [u8],
}

impl<'a> Qualifier<'a> {
    pub fn encode(offset: u16, tag: &str) -> Result<Vec<u8>> {
        let tag = tag.as_bytes();
        let tag_len = u8::try_from(tag.len())
            .map_err(|_| Error::invariant(format!("qualifier tag is {} bytes", tag.len())))?;

        let mut out = Vec::with_capacity(OFFSET_LEN + 1 + tag.len());
        out.extend_from_slice(&offset.to_be_bytes());
        out.push(tag_len);
        out.extend_from_slice(tag);
        if out.len() != OFFSET_LEN + 1 + tag.len() {
            return Err(Error::invariant("qualifier length mismatch"));
        }
        Ok(out)
    }

    /// Bytes past the tag are ignored so later layouts can extend the qualifier.
    pub fn decode(bytes: &'a [u8]) -> std::result::Result<Self, StoreError> {
        if bytes.len() < OFFSET_LEN + 1 {
            return Err(StoreError::Corrupt(format!(
                "qualifier too short: {} bytes",
                bytes.len()
            )));
        }
        let offset = u16::from_be_bytes([bytes[0], bytes[1]]);
        let tag_len = bytes[OFFSET_LEN] as usize;
        let tag_start = OFFSET_LEN + 1;
        let tag = bytes
            .get(tag_start..tag_start + tag_len)
            .ok_or_else(|| StoreError::Corrupt("qualifier tag truncated".to_string()))?;
        Ok(Self { offset, tag })
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag == tag.as_bytes()
    }
}
