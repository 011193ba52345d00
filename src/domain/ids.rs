//! Domain identifier types with validation
//!
//! Newtype wrappers keep rule, plan, provider and patient identifiers from
//! being mixed up. Every identifier rejects empty strings, including when it
//! is deserialized from a snapshot or catalog file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " from a string")]
            ///
            /// # Returns
            ///
            /// Returns `Err` if the identifier is empty or only whitespace
            pub fn new(id: impl Into<String>) -> Result<Self, String> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(concat!($label, " cannot be empty").to_string());
                }
                Ok(Self(id))
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes self and returns the inner String
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Clinical rule identifier, e.g. `rule_influenza_ge_50_cqm`
    ///
    /// # Examples
    ///
    /// ```
    /// use tally::domain::ids::RuleId;
    /// use std::str::FromStr;
    ///
    /// let rule_id = RuleId::from_str("rule_dm_eye_cqm").unwrap();
    /// assert_eq!(rule_id.as_str(), "rule_dm_eye_cqm");
    /// ```
    RuleId,
    "Rule ID"
);

string_id!(
    /// Rule set identifier, e.g. `cqm_2011`
    RuleSetId,
    "Rule set ID"
);

string_id!(
    /// Clinical plan identifier, e.g. `dm_plan_cqm`
    PlanId,
    "Plan ID"
);

string_id!(
    /// Provider identifier as known to the patient source
    ProviderId,
    "Provider ID"
);

string_id!(
    /// Patient identifier (pid)
    PatientId,
    "Patient ID"
);

impl RuleId {
    /// Shorthand for building ids from static strings in the built-in catalog
    pub(crate) fn from_static(id: &'static str) -> Self {
        Self(id.to_string())
    }
}

impl PlanId {
    pub(crate) fn from_static(id: &'static str) -> Self {
        Self(id.to_string())
    }
}

impl RuleSetId {
    pub(crate) fn from_static(id: &'static str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_id_valid() {
        let id = RuleId::new("rule_htn_bp_measure_cqm").unwrap();
        assert_eq!(id.as_str(), "rule_htn_bp_measure_cqm");
        assert_eq!(id.to_string(), "rule_htn_bp_measure_cqm");
    }

    #[test]
    fn test_ids_reject_empty() {
        assert!(RuleId::new("").is_err());
        assert!(PlanId::new("   ").is_err());
        assert!(ProviderId::new("").is_err());
        assert!(PatientId::new("").is_err());
        assert!(RuleSetId::new("").is_err());
    }

    #[test]
    fn test_empty_id_error_message() {
        let err = PatientId::new("").unwrap_err();
        assert_eq!(err, "Patient ID cannot be empty");
    }

    #[test]
    fn test_id_deserialize_validates() {
        let ok: ProviderId = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(ok.as_str(), "12");

        let err = serde_json::from_str::<ProviderId>("\"\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_id_serialize_as_plain_string() {
        let id = PlanId::new("dm_plan_cqm").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dm_plan_cqm\"");
    }
}
