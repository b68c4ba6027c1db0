//! The v1 → v2 conversion pipeline.
//!
//! v1 stores a loosely-validated, second-resolution history list per entry.
//! v2 requires a strictly-validated, nanosecond-resolution, globally
//! time-ordered object graph in which every object is reachable from a root
//! via recorded events. Conversion therefore normalizes every history record,
//! re-sorts each entry's history, and fabricates a synthetic root directory
//! whose `Add` events replay the creation of every entry.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{MigrateError, SchemaViolation};
use crate::model::{
    Database, DatabaseObject, DirectoryAction, DirectoryObject, DirectoryRecord, EntryObject,
    HistoryRecord, ObjectId, SyncParameters, Timestamp, NANOS_PER_SECOND,
};
use crate::v1;

/// Name given to the fabricated root. v1 had no concept of a named container,
/// so the name is recorded as the very first event in the root's lifecycle.
pub const ROOT_DIRECTORY_NAME: &str = "My Passwords";

/// Hands out the low-order tie-break ticks appended to second-resolution
/// timestamps. One tick is consumed per normalized history record and the
/// sequence is never reset between entries, which is what makes every
/// timestamp in a run unique even when source records share a second.
///
/// Ticks must stay below one second's worth of nanoseconds, or ordering
/// between consecutive seconds could invert; the allocator fails once that
/// budget is spent.
#[derive(Debug, Default)]
pub struct TimestampAllocator {
    next: i64,
}

impl TimestampAllocator {
    pub fn new() -> TimestampAllocator {
        TimestampAllocator { next: 0 }
    }

    pub fn allocate(&mut self, seconds: i64, context: &str) -> Result<Timestamp, MigrateError> {
        let tick = self.next;
        self.next += 1;
        if self.next >= NANOS_PER_SECOND {
            return Err(MigrateError::CounterExhausted);
        }
        let time = seconds
            .checked_mul(NANOS_PER_SECOND)
            .and_then(|nanos| nanos.checked_add(tick))
            .ok_or_else(|| SchemaViolation::TimestampOutOfRange {
                context: context.to_string(),
                value: seconds,
            })?;
        Ok(time)
    }
}

/// Normalizes one v1 history record into a v2 record.
///
/// The record must be a non-empty object holding an integer `time_created`
/// plus any of the five recognized string fields and nothing else. The
/// timestamp moves out of the payload; what remains becomes `data`.
pub fn convert_history_item(
    record: &Value,
    alloc: &mut TimestampAllocator,
    context: &str,
) -> Result<HistoryRecord, MigrateError> {
    let record = v1::object(record, "history record", context)?;
    if record.is_empty() {
        return Err(SchemaViolation::EmptyRecord {
            context: context.to_string(),
        }
        .into());
    }

    let seconds = record
        .get("time_created")
        .ok_or_else(|| SchemaViolation::MissingField {
            context: context.to_string(),
            field: "time_created",
        })?
        .as_i64()
        .ok_or_else(|| SchemaViolation::WrongType {
            context: context.to_string(),
            field: "time_created".to_string(),
            expected: "an integer",
        })?;

    let mut data = BTreeMap::new();
    for (key, value) in record {
        if key == "time_created" {
            continue;
        }
        if !v1::HISTORY_FIELDS.contains(&key.as_str()) {
            return Err(SchemaViolation::UnexpectedField {
                context: context.to_string(),
                field: key.clone(),
            }
            .into());
        }
        let text = value.as_str().ok_or_else(|| SchemaViolation::WrongType {
            context: context.to_string(),
            field: key.clone(),
            expected: "a string",
        })?;
        data.insert(key.clone(), text.to_string());
    }

    let time = alloc.allocate(seconds, context)?;
    Ok(HistoryRecord { time, data })
}

/// Converts one v1 entry into a v2 entry object.
///
/// History records are normalized in source order, then sorted ascending.
/// Tick assignment follows conversion order, so of two records sharing a
/// second the earlier one in the source ends up with the smaller time. Times
/// are unique by construction, so no secondary sort key is needed.
pub fn convert_entry(
    entry: &Value,
    index: usize,
    alloc: &mut TimestampAllocator,
) -> Result<EntryObject, MigrateError> {
    let label = format!("entries[{index}]");
    let map = v1::object(entry, "entry", &label)?;

    for key in map.keys() {
        if key != "id" && key != "history" {
            return Err(SchemaViolation::UnexpectedField {
                context: label.clone(),
                field: key.clone(),
            }
            .into());
        }
    }

    let raw_id = map
        .get("id")
        .ok_or_else(|| SchemaViolation::MissingField {
            context: label.clone(),
            field: "id",
        })?
        .as_str()
        .ok_or_else(|| SchemaViolation::WrongType {
            context: label.clone(),
            field: "id".to_string(),
            expected: "a string",
        })?;
    let id = ObjectId::parse(raw_id).ok_or_else(|| SchemaViolation::MalformedId {
        context: label.clone(),
        id: raw_id.to_string(),
    })?;

    let records = map
        .get("history")
        .ok_or_else(|| SchemaViolation::MissingField {
            context: label.clone(),
            field: "history",
        })
        .and_then(|value| v1::array(value, "history", &label))?;

    let context = format!("entry {id}");
    if records.is_empty() {
        return Err(SchemaViolation::EmptyHistory { context }.into());
    }

    let mut history = records
        .iter()
        .map(|record| convert_history_item(record, alloc, &context))
        .collect::<Result<Vec<_>, _>>()?;
    history.sort_unstable_by_key(|record| record.time);
    let time_created = history[0].time;

    Ok(EntryObject {
        id,
        history,
        time_created,
    })
}

/// Synthesizes the root directory from the converted entries.
///
/// Every entry's creation is replayed as an `Add` at that entry's own
/// `time_created`, and a `Rename` anchored one nanosecond before the earliest
/// `Add` guarantees the naming event is strictly first. The anchor is
/// undefined for an empty vault, which is rejected outright.
pub fn fabricate_root(entries: &[EntryObject]) -> Result<DirectoryObject, MigrateError> {
    if entries.is_empty() {
        return Err(SchemaViolation::EmptyEntries.into());
    }

    let mut history: Vec<DirectoryRecord> = entries
        .iter()
        .map(|entry| DirectoryRecord {
            action: DirectoryAction::Add(entry.id.clone()),
            time: entry.time_created,
        })
        .collect();
    history.sort_unstable_by_key(|record| record.time);

    let anchor =
        history[0]
            .time
            .checked_sub(1)
            .ok_or_else(|| SchemaViolation::TimestampOutOfRange {
                context: "root directory".to_string(),
                value: history[0].time,
            })?;
    history.insert(
        0,
        DirectoryRecord {
            action: DirectoryAction::Rename(ROOT_DIRECTORY_NAME.to_string()),
            time: anchor,
        },
    );

    Ok(DirectoryObject {
        id: ObjectId::root(),
        history,
        time_created: anchor,
    })
}

/// Converts a full v1 database. Fail-fast: the first violation anywhere in
/// the input aborts the run and nothing is emitted.
pub fn convert_database(input: &Value, username: &str) -> Result<Database, MigrateError> {
    let map = v1::object(input, "database", "database")?;
    for key in map.keys() {
        if key != "entries" {
            return Err(SchemaViolation::UnexpectedField {
                context: "database".to_string(),
                field: key.clone(),
            }
            .into());
        }
    }
    let entries = map
        .get("entries")
        .ok_or_else(|| SchemaViolation::MissingField {
            context: "database".to_string(),
            field: "entries",
        })
        .and_then(|value| v1::array(value, "entries", "database"))?;

    let mut alloc = TimestampAllocator::new();
    let converted = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| convert_entry(entry, index, &mut alloc))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(entries = converted.len(), "converted v1 entries");

    let root = fabricate_root(&converted)?;

    let mut objects: Vec<DatabaseObject> =
        converted.into_iter().map(DatabaseObject::Entry).collect();
    objects.push(DatabaseObject::Directory(root));

    Ok(Database {
        objects,
        sync_parameters: SyncParameters {
            username: username.to_string(),
        },
    })
}
