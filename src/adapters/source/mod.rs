//! Patient sources
//!
//! The collator pulls providers and patients through the [`PatientSource`]
//! trait. Two file-backed adapters are provided:
//!
//! - [`SnapshotSource`] - one JSON document loaded into memory
//! - [`JsonlSource`] - providers JSON plus a JSON Lines patient file streamed on every query

pub mod factory;
pub mod jsonl;
pub mod snapshot;
pub mod traits;

pub use factory::create_patient_source;
pub use jsonl::JsonlSource;
pub use snapshot::SnapshotSource;
pub use traits::{PatientCriteria, PatientIter, PatientSource, ProviderRelationship};
