//! External data integrations for Tally.
//!
//! - [`source`] - Patient and provider sources (trait-based)
//!
//! # Design Pattern
//!
//! Adapters isolate the storage of patient data from report generation. The
//! core only sees the [`source::PatientSource`] trait, so tests can feed
//! in-memory snapshots:
//!
//! ```rust
//! use tally::adapters::source::{PatientSource, SnapshotSource};
//!
//! let source = SnapshotSource::new(Vec::new(), Vec::new());
//! assert!(source.providers().unwrap().is_empty());
//! ```

pub mod source;
