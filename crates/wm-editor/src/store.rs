//! Session persistence collaborator.
//!
//! The editor only needs a key-value store; where the bytes go (a browser
//! database, a file, memory) is the host's business. The record itself is
//! MessagePack via `rmp-serde`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wm_core::{StorageError, ViewportState, Waypoint};

/// Key under which the current map session is stored.
pub const SESSION_KEY: &str = "currentPGM";

/// External key-value persistence.
pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process store, used headless and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

// ─── Record ──────────────────────────────────────────────────────────────

/// Drawing-layer pixels as straight RGBA bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSnapshot {
    pub width: u32,
    pub height: u32,
    #[serde(with = "raw_bytes")]
    pub rgba: Vec<u8>,
}

/// Everything needed to bring a session back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRecord {
    /// The original file bytes, re-decoded on restore.
    #[serde(with = "raw_bytes")]
    pub file: Vec<u8>,
    pub file_name: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
    pub viewer_state: ViewportState,
    #[serde(default)]
    pub drawing: Option<DrawingSnapshot>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl MapRecord {
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        rmp_serde::to_vec_named(self).map_err(|e| StorageError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        rmp_serde::from_slice(bytes).map_err(|e| StorageError::Decode(e.to_string()))
    }
}

/// Serialize `Vec<u8>` as a MessagePack bin rather than an integer array.
mod raw_bytes {
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        deserializer.deserialize_byte_buf(BytesVisitor)
    }

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte buffer")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Vec<u8>, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
            Ok(v)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<u8>, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1 << 20));
            while let Some(b) = seq.next_element::<u8>()? {
                out.push(b);
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> MapRecord {
        MapRecord {
            file: b"P5 1 1 255\n\x80".to_vec(),
            file_name: "map.pgm".into(),
            last_modified: 1_700_000_000_000,
            viewer_state: ViewportState {
                scale: 0.75,
                scroll_left: 12.0,
                scroll_top: 3.5,
            },
            drawing: Some(DrawingSnapshot {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            }),
            waypoints: vec![Waypoint::new(1.0, 2.0, -3.0)],
        }
    }

    #[test]
    fn record_survives_messagepack() {
        let bytes = record().encode().unwrap();
        assert_eq!(MapRecord::decode(&bytes).unwrap(), record());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(MapRecord::decode(b"\xc1nope"), Err(StorageError::Decode(_))));
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(SESSION_KEY).unwrap(), None);
        store.put(SESSION_KEY, vec![1, 2]).unwrap();
        assert_eq!(store.get(SESSION_KEY).unwrap(), Some(vec![1, 2]));
        store.delete(SESSION_KEY).unwrap();
        assert!(store.is_empty());
    }
}
