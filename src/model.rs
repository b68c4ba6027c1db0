use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Nanoseconds since the Unix epoch. Within one conversion run no two
/// timestamps anywhere in the output collection are equal.
pub type Timestamp = i64;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A 32-byte object identifier, lowercase hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Encoded length: 32 raw bytes as hex.
    pub const LEN: usize = 64;

    /// The reserved all-zero id of the fabricated root directory.
    pub fn root() -> ObjectId {
        ObjectId("0".repeat(Self::LEN))
    }

    /// Accepts exactly 64 lowercase hex characters.
    pub fn parse(raw: &str) -> Option<ObjectId> {
        if raw.len() != Self::LEN {
            return None;
        }
        if !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return None;
        }
        Some(ObjectId(raw.to_string()))
    }

    /// A fresh identifier drawn from the OS RNG.
    pub fn random() -> ObjectId {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let mut encoded = String::with_capacity(Self::LEN);
        for byte in bytes {
            let _ = write!(encoded, "{byte:02x}");
        }
        ObjectId(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timestamped snapshot of an entry's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub time: Timestamp,
    pub data: BTreeMap<String, String>,
}

/// A mutation recorded in a directory's history.
///
/// External tagging gives the wire shapes `{"Rename": "..."}` and
/// `{"Add": "<id>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryAction {
    Rename(String),
    Add(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub action: DirectoryAction,
    pub time: Timestamp,
}

/// A credential record with its full value history, time-ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryObject {
    pub id: ObjectId,
    pub history: Vec<HistoryRecord>,
    pub time_created: Timestamp,
}

/// A container whose membership and name are reconstructed from its recorded
/// events, time-ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryObject {
    pub id: ObjectId,
    pub history: Vec<DirectoryRecord>,
    pub time_created: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DatabaseObject {
    Entry(EntryObject),
    Directory(DirectoryObject),
}

impl DatabaseObject {
    pub fn id(&self) -> &ObjectId {
        match self {
            DatabaseObject::Entry(entry) => &entry.id,
            DatabaseObject::Directory(directory) => &directory.id,
        }
    }

    pub fn time_created(&self) -> Timestamp {
        match self {
            DatabaseObject::Entry(entry) => entry.time_created,
            DatabaseObject::Directory(directory) => directory.time_created,
        }
    }

    /// Every event timestamp in this object's own history.
    pub fn history_times(&self) -> Vec<Timestamp> {
        match self {
            DatabaseObject::Entry(entry) => entry.history.iter().map(|r| r.time).collect(),
            DatabaseObject::Directory(directory) => {
                directory.history.iter().map(|r| r.time).collect()
            }
        }
    }
}

/// Only `username` is known at migration time; the consuming application
/// fills in the remaining sync parameters on first load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncParameters {
    pub username: String,
}

/// The complete v2 payload handed to the external serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub objects: Vec<DatabaseObject>,
    pub sync_parameters: SyncParameters,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_accepts_lowercase_hex_only() {
        let valid = "ab".repeat(32);
        assert!(ObjectId::parse(&valid).is_some());
        assert!(ObjectId::parse(&"ab".repeat(31)).is_none());
        assert!(ObjectId::parse(&format!("{}xy", "ab".repeat(31))).is_none());
        assert!(ObjectId::parse(&"AB".repeat(32)).is_none());
        assert!(ObjectId::parse("").is_none());
    }

    #[test]
    fn root_id_is_all_zeroes() {
        assert_eq!(ObjectId::root().as_str(), "0".repeat(64));
        assert_eq!(ObjectId::parse(&"0".repeat(64)), Some(ObjectId::root()));
    }

    #[test]
    fn random_ids_are_well_formed_and_distinct() {
        let a = ObjectId::random();
        let b = ObjectId::random();
        assert!(ObjectId::parse(a.as_str()).is_some());
        assert_ne!(a, b);
    }

    #[test]
    fn objects_serialize_with_type_tag() {
        let entry = DatabaseObject::Entry(EntryObject {
            id: ObjectId::parse(&"aa".repeat(32)).unwrap(),
            history: vec![HistoryRecord {
                time: 5,
                data: BTreeMap::from([("title".to_string(), "x".to_string())]),
            }],
            time_created: 5,
        });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "Entry");
        assert_eq!(value["history"][0]["data"]["title"], "x");
    }

    #[test]
    fn actions_serialize_externally_tagged() {
        let rename = DirectoryAction::Rename("My Passwords".to_string());
        assert_eq!(
            serde_json::to_value(&rename).unwrap(),
            json!({ "Rename": "My Passwords" })
        );

        let add = DirectoryAction::Add(ObjectId::root());
        assert_eq!(
            serde_json::to_value(&add).unwrap(),
            json!({ "Add": "0".repeat(64) })
        );
    }
}
