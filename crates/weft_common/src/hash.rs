//! Structure hashes for bucketing routing blocks by shape.
//!
//! A value is hashed through its canonical JSON encoding, so two blocks with
//! the same ports, tracks and interconnect land in the same bucket no matter
//! where they sit on the grid. A bucket only nominates candidates; callers
//! compare full signatures before sharing a module.

use crate::result::{InternalError, WeftResult};
use serde::Serialize;
use std::fmt;

/// XXH3-128 hash of a structure encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Hashes raw encoding bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data))
    }

    /// Hashes the canonical JSON encoding of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> WeftResult<Self> {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            InternalError::new(format!(
                "cannot encode {} for hashing: {e}",
                std::any::type_name::<T>()
            ))
        })?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Low 32 bits, enough to tell buckets apart in debug logs.
    pub fn short(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Side {
        tracks: Vec<&'static str>,
        opins: usize,
    }

    #[test]
    fn equal_shapes_share_a_bucket() {
        let a = Side { tracks: vec!["out", "in", "out", "in"], opins: 2 };
        let b = Side { tracks: vec!["out", "in", "out", "in"], opins: 2 };
        assert_eq!(ContentHash::of(&a).unwrap(), ContentHash::of(&b).unwrap());
    }

    #[test]
    fn track_direction_changes_the_bucket() {
        let a = Side { tracks: vec!["out", "in"], opins: 2 };
        let b = Side { tracks: vec!["in", "out"], opins: 2 };
        assert_ne!(ContentHash::of(&a).unwrap(), ContentHash::of(&b).unwrap());
    }

    #[test]
    fn hashes_the_json_encoding() {
        let side = Side { tracks: vec!["out"], opins: 0 };
        assert_eq!(
            ContentHash::of(&side).unwrap(),
            ContentHash::from_bytes(br#"{"tracks":["out"],"opins":0}"#)
        );
    }

    #[test]
    fn display_is_zero_padded() {
        let text = ContentHash(0xab).to_string();
        assert_eq!(text.len(), 32);
        assert!(text.ends_with("ab"));
        assert_eq!(ContentHash(0x1_0000_00ab).short(), 0xab);
    }
}
