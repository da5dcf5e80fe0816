//! Roster reconciliation engine behind a teacher's record entry panel.
//!
//! The library narrows a teaching-session catalog down to a scope
//! (class, subject, period), loads the authoritative student roster for
//! it, reconciles previously stored records into an editable baseline,
//! and persists edits back as independent per-student upserts. The
//! `rollbookd` binary exposes all of it to a UI shell as a JSON-lines
//! sidecar.

pub mod cascade;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ipc;
pub mod logging;
pub mod reconcile;
pub mod roster;
pub mod scope;
pub mod service;
pub mod submit;
pub mod tracker;
pub mod workbench;
