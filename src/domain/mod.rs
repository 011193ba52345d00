//! Domain models and types for Tally.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RuleId`], [`PlanId`], [`ProviderId`], [`PatientId`])
//! - **Patient data** ([`PatientRecord`], [`Provider`]) as delivered by a patient source
//! - **Rule definitions** ([`RuleDefinition`], [`Criterion`], [`RuleSet`], [`Plan`])
//! - **Result rows** ([`ResultRow`]) flowing from aggregation to emission
//! - **Error types** ([`TallyError`], [`SourceError`], [`RateError`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, TallyError>`]:
//!
//! ```rust
//! use tally::domain::{RuleId, Result, TallyError};
//!
//! fn parse_rule(id: &str) -> Result<RuleId> {
//!     RuleId::new(id).map_err(TallyError::Validation)
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod patient;
pub mod result;
pub mod row;
pub mod rule;

// Re-export commonly used types for convenience
pub use errors::{RateError, SourceError, TallyError};
pub use ids::{PatientId, PlanId, ProviderId, RuleId, RuleSetId};
pub use patient::{
    ClinicalEntry, Encounter, EntryKind, PatientBatch, PatientRecord, Provider, Sex, VitalField,
    VitalReading,
};
pub use result::Result;
pub use row::{MeasureRow, PlanRow, ProviderRow, Rate, ResultRow, RowOrigin, RowTag};
pub use rule::{
    Criterion, MeasureCodes, Numerator, Plan, Population, RuleAction, RuleCategory,
    RuleDefinition, RuleSet, Window,
};
