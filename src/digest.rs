//! Device identity digest used as the row-key prefix.
//!
//! Device identifiers tend to be sequential or share long prefixes. Hashing them
//! spreads rows for different devices evenly over the keyspace. The digest is never
//! reversed: queries always carry the cleartext device key.

use std::fmt;

use crate::codec::DIGEST_LEN;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceDigest([u8; DIGEST_LEN]);

impl DeviceDigest {
    /// BLAKE3 of the UTF-8 device key, truncated to the row-key prefix width.
    pub fn of(device_key: &str) -> Self {
        let hash = blake3::hash(device_key.as_bytes());
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&hash.as_bytes()[..DIGEST_LEN]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Display for DeviceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DeviceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceDigest({self})")
    }
}
