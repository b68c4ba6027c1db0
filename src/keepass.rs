//! KeePass XML intake.
//!
//! Walks the `Group`/`Entry` tree of a KeePass export and emits v1-shaped
//! intake entries: fresh random ids, one snapshot per entry stamped at import
//! time. The conversion is lossy by design: attachments, prior history and
//! the group structure are all dropped, and missing fields default to the
//! empty string rather than being rejected.

use chrono::Utc;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ObjectId;

/// Subtrees with this group name are skipped entirely.
pub const RECYCLE_BIN: &str = "Recycle Bin";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to parse XML document: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("document has no `Root` element")]
    MissingRoot,
}

/// Serializes to the v1 database shape consumed by the migration pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeDatabase {
    pub entries: Vec<IntakeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeEntry {
    pub id: ObjectId,
    pub history: Vec<IntakeSnapshot>,
}

/// A single-snapshot history record. All five fields are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeSnapshot {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
    pub time_created: i64,
}

/// Imports a KeePass XML export, stamping every snapshot at the current time.
pub fn import_document(xml: &str) -> Result<IntakeDatabase, ImportError> {
    import_document_at(xml, Utc::now().timestamp())
}

/// Same as [`import_document`] with an explicit snapshot timestamp (seconds).
pub fn import_document_at(xml: &str, time_created: i64) -> Result<IntakeDatabase, ImportError> {
    let document = Document::parse(xml)?;
    let root = document
        .root_element()
        .children()
        .find(|node| node.has_tag_name("Root"))
        .ok_or(ImportError::MissingRoot)?;

    let mut entries = Vec::new();
    collect_group(root, time_created, &mut entries);
    tracing::debug!(entries = entries.len(), "imported KeePass entries");
    Ok(IntakeDatabase { entries })
}

fn collect_group(group: Node<'_, '_>, time_created: i64, entries: &mut Vec<IntakeEntry>) {
    if child_text(group, "Name") == Some(RECYCLE_BIN) {
        return;
    }

    for child in group.children().filter(|node| node.has_tag_name("Group")) {
        collect_group(child, time_created, entries);
    }
    for child in group.children().filter(|node| node.has_tag_name("Entry")) {
        entries.push(import_entry(child, time_created));
    }
}

fn import_entry(node: Node<'_, '_>, time_created: i64) -> IntakeEntry {
    let mut snapshot = IntakeSnapshot {
        title: String::new(),
        username: String::new(),
        password: String::new(),
        url: String::new(),
        notes: String::new(),
        time_created,
    };

    for field in node.children().filter(|n| n.has_tag_name("String")) {
        let Some(key) = child_text(field, "Key") else {
            continue;
        };
        let value = child_text(field, "Value").unwrap_or("").to_string();
        match key {
            "Title" => snapshot.title = value,
            "UserName" => snapshot.username = value,
            "Password" => snapshot.password = value,
            "URL" => snapshot.url = value,
            "Notes" => snapshot.notes = value,
            _ => {}
        }
    }

    IntakeEntry {
        id: ObjectId::random(),
        history: vec![snapshot],
    }
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"
        <KeePassFile>
          <Root>
            <Group>
              <Name>Database</Name>
              <Entry>
                <String><Key>Title</Key><Value>mail</Value></String>
                <String><Key>UserName</Key><Value>alice</Value></String>
                <String><Key>Password</Key><Value>hunter2</Value></String>
                <String><Key>URL</Key><Value>https://mail.example</Value></String>
                <String><Key>Notes</Key><Value>personal</Value></String>
              </Entry>
              <Group>
                <Name>Work</Name>
                <Entry>
                  <String><Key>Title</Key><Value>vpn</Value></String>
                  <String><Key>Custom</Key><Value>ignored</Value></String>
                </Entry>
              </Group>
              <Group>
                <Name>Recycle Bin</Name>
                <Entry>
                  <String><Key>Title</Key><Value>deleted</Value></String>
                </Entry>
              </Group>
            </Group>
          </Root>
        </KeePassFile>
    "#;

    #[test]
    fn imports_entries_and_skips_recycle_bin() {
        let database = import_document_at(EXPORT, 1234).unwrap();
        assert_eq!(database.entries.len(), 2);
        let titles: Vec<&str> = database
            .entries
            .iter()
            .map(|entry| entry.history[0].title.as_str())
            .collect();
        assert!(titles.contains(&"mail"));
        assert!(titles.contains(&"vpn"));
        assert!(!titles.contains(&"deleted"));
    }

    #[test]
    fn missing_fields_default_to_empty_strings() {
        let database = import_document_at(EXPORT, 1234).unwrap();
        let vpn = database
            .entries
            .iter()
            .find(|entry| entry.history[0].title == "vpn")
            .unwrap();
        let snapshot = &vpn.history[0];
        assert_eq!(snapshot.username, "");
        assert_eq!(snapshot.password, "");
        assert_eq!(snapshot.url, "");
        assert_eq!(snapshot.notes, "");
        assert_eq!(snapshot.time_created, 1234);
    }

    #[test]
    fn entries_get_fresh_well_formed_ids() {
        let database = import_document_at(EXPORT, 1234).unwrap();
        assert_ne!(database.entries[0].id, database.entries[1].id);
        for entry in &database.entries {
            assert!(ObjectId::parse(entry.id.as_str()).is_some());
            assert_eq!(entry.history.len(), 1);
        }
    }

    #[test]
    fn intake_output_feeds_the_migration_pipeline() {
        let database = import_document_at(EXPORT, 1234).unwrap();
        let value = serde_json::to_value(&database).unwrap();
        let migrated = crate::convert::convert_database(&value, "alice").unwrap();
        assert_eq!(migrated.objects.len(), database.entries.len() + 1);
    }

    #[test]
    fn document_without_root_is_rejected() {
        let err = import_document_at("<KeePassFile></KeePassFile>", 1).unwrap_err();
        assert!(matches!(err, ImportError::MissingRoot));

        let err = import_document_at("not xml", 1).unwrap_err();
        assert!(matches!(err, ImportError::Xml(_)));
    }
}
