//! Offline migration toolkit for Strongroom vault databases.
//!
//! Two independent pipelines, with no shared state across runs:
//!
//! - [`convert`] rewrites a decrypted v1 vault into the event-sourced v2
//!   schema, fabricating the root directory that v1 never had so that every
//!   object becomes reachable from a root via recorded events.
//! - [`keepass`] ingests a KeePass XML export into v1-shaped intake JSON.
//!   It is lossy and best-effort by design.
//!
//! Both pipelines print a single JSON document to stdout; the v2 payload is
//! expected to be compressed and encrypted by external tooling before it is
//! persisted. A conversion either succeeds completely or fails with a
//! diagnostic; a half-migrated vault is never emitted.

pub mod convert;
pub mod error;
pub mod keepass;
pub mod model;
pub mod v1;
