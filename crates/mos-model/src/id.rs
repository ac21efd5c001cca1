//! Placement identity
//!
//! Provides [`PlacementId`], a strongly-typed 16-byte identity used to key
//! placements within a session index.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of a placement (16 bytes)
///
/// Derived by hashing an allocation tag, never from the placed object's content:
/// two placements of the very same object carry distinct identities.
/// Immutable and cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlacementId([u8; 16]);

impl PlacementId {
    /// Create a PlacementId from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Allocate a fresh identity
    ///
    /// The allocation tag combines a random v4 UUID with a process-wide
    /// sequence number, so identities are never handed out twice while
    /// the process lives.
    #[must_use]
    pub fn fresh() -> Self {
        let seq = ALLOCATION_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(uuid::Uuid::new_v4().as_bytes());
        hasher.update(&seq.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest.as_bytes()[..16]);
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Create identity from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 16 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| ModelError::InvalidIdLength {
            expected: 16,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Short string representation (first 8 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl Display for PlacementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for PlacementId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8; 16]> for PlacementId {
    fn as_ref(&self) -> &[u8; 16] {
        &self.0
    }
}

// Serde implementations for compact serialization
impl serde::Serialize for PlacementId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> serde::Deserialize<'de> for PlacementId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PlacementIdVisitor;

        impl<'de> serde::de::Visitor<'de> for PlacementIdVisitor {
            type Value = PlacementId;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a 16-byte placement id as hex string or byte array")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(serde::de::Error::custom)
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                PlacementId::from_slice(value).map_err(serde::de::Error::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(PlacementIdVisitor)
        } else {
            deserializer.deserialize_bytes(PlacementIdVisitor)
        }
    }
}

/// Errors raised by the object model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Invalid identity length
    #[error("invalid placement id length: expected {expected}, got {actual}")]
    InvalidIdLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
