use std::fmt;

use serde::{Deserialize, Serialize};

/// Domain tag mixed into every type-name hash. Bumping it invalidates all
/// previously derived ids, so it changes only with the wire format.
const TYPE_ID_DOMAIN: &str = "som-type-v1";

/// Stable identifier for a class or enumeration type.
///
/// A `TypeId` is derived from the qualified type name: the name is hashed
/// with domain-separated BLAKE3 and the first 8 bytes of the digest are
/// taken big-endian. Independently built repositories therefore agree on
/// the id of every type, which is what lets blobs carry ids instead of
/// names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u64);

impl TypeId {
    /// Derive the id for a qualified type name.
    pub fn derive(name: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TYPE_ID_DOMAIN.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest.as_bytes()[..8]);
        Self(u64::from_be_bytes(raw))
    }

    /// Wrap a raw id, e.g. one read back from a blob header.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Hex-encoded representation (16 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.to_hex())
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<u64> for TypeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<TypeId> for u64 {
    fn from(id: TypeId) -> Self {
        id.0
    }
}
