//! Rule, plan and rule-set definitions
//!
//! A [`RuleDefinition`] describes a quality measure declaratively: one or more
//! populations, each with an initial-population, denominator and optional
//! exclusion [`Criterion`], plus one or more numerators. Definitions are plain
//! data so that catalogs can be extended from TOML files.

use super::ids::{PlanId, RuleId, RuleSetId};
use super::patient::{EntryKind, Sex, VitalField};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule category; selects the evaluator that runs the rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Clinical quality measure
    Cqm,
    /// Automated measure calculation
    Amc,
    /// Clinical decision support reminder rule; not reportable
    Standard,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Cqm => "cqm",
            RuleCategory::Amc => "amc",
            RuleCategory::Standard => "standard",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cqm" => Ok(Self::Cqm),
            "amc" => Ok(Self::Amc),
            "standard" => Ok(Self::Standard),
            _ => Err(format!(
                "Invalid rule category: {s}. Expected 'cqm', 'amc' or 'standard'"
            )),
        }
    }
}

/// External measure codes of a rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureCodes {
    #[serde(default)]
    pub pqri: Option<String>,

    #[serde(default)]
    pub nqf: Option<String>,

    #[serde(default)]
    pub amc: Option<String>,
}

impl MeasureCodes {
    /// Registry measure number: the PQRI code, else the NQF code, else empty
    pub fn measure_number(&self) -> &str {
        self.pqri
            .as_deref()
            .filter(|c| !c.is_empty())
            .or_else(|| self.nqf.as_deref().filter(|c| !c.is_empty()))
            .unwrap_or("")
    }
}

/// Time window a criterion looks into, relative to the measurement period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// Any time up to the end of the measurement period
    Ever,
    /// Dated inside the measurement period
    #[default]
    MeasurementPeriod,
    /// Entry span overlaps the measurement period
    ActiveInPeriod,
    /// Dated within N months before the end of the measurement period
    MonthsBeforeEnd(u32),
}

/// Predicate over a patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Criterion {
    Always,

    /// Age at the start of the measurement period, inclusive bounds
    Age {
        #[serde(default)]
        min: Option<u32>,
        #[serde(default)]
        max: Option<u32>,
    },

    Sex { sex: Sex },

    /// At least `min` encounters inside the window, optionally filtered by code
    Encounters {
        min: usize,
        #[serde(default)]
        codes: Vec<String>,
        #[serde(default)]
        window: Window,
    },

    /// A clinical entry of `kind` with a matching code inside the window
    Entry {
        kind: EntryKind,
        #[serde(default)]
        codes: Vec<String>,
        #[serde(default)]
        window: Window,
    },

    /// The most recent reading of `field` inside the window, optionally bounded
    Vital {
        field: VitalField,
        #[serde(default)]
        window: Window,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },

    All { of: Vec<Criterion> },

    Any { of: Vec<Criterion> },

    Not { criterion: Box<Criterion> },
}

impl Criterion {
    pub fn age(min: Option<u32>, max: Option<u32>) -> Self {
        Criterion::Age { min, max }
    }

    pub fn encounters(min: usize) -> Self {
        Criterion::Encounters {
            min,
            codes: Vec::new(),
            window: Window::MeasurementPeriod,
        }
    }

    pub fn entry(kind: EntryKind, codes: &[&str], window: Window) -> Self {
        Criterion::Entry {
            kind,
            codes: codes.iter().map(|c| c.to_string()).collect(),
            window,
        }
    }

    pub fn vital(field: VitalField, window: Window) -> Self {
        Criterion::Vital {
            field,
            window,
            min: None,
            max: None,
        }
    }

    pub fn all(of: Vec<Criterion>) -> Self {
        Criterion::All { of }
    }

    pub fn any(of: Vec<Criterion>) -> Self {
        Criterion::Any { of }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(criterion: Criterion) -> Self {
        Criterion::Not {
            criterion: Box::new(criterion),
        }
    }
}

/// A numerator of a population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Numerator {
    /// Label such as `Numerator 2`; the trailing number is reported
    #[serde(default)]
    pub label: String,

    pub criterion: Criterion,
}

/// A reported population of a measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    /// Label such as `Population Criteria 1`; the trailing number is reported
    #[serde(default)]
    pub label: String,

    /// Patients counted in the total population
    #[serde(default = "always")]
    pub initial: Criterion,

    /// Eligible patients, checked after the initial population
    #[serde(default = "always")]
    pub denominator: Criterion,

    /// Denominator exclusions
    #[serde(default)]
    pub exclusion: Option<Criterion>,

    pub numerators: Vec<Numerator>,
}

/// An itemized action of a rule, reported as a `sub` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub category: String,
    pub item: String,
    pub criterion: Criterion,
}

impl RuleAction {
    /// Label in `Category: Item` form
    pub fn label(&self) -> String {
        format!("{}: {}", self.category, self.item)
    }
}

/// A measure definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: RuleId,
    pub category: RuleCategory,
    pub title: String,

    #[serde(default)]
    pub codes: MeasureCodes,

    #[serde(default)]
    pub populations: Vec<Population>,

    #[serde(default)]
    pub actions: Vec<RuleAction>,
}

/// A clinical plan: a named group of rules reported as one measure group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub title: String,

    /// Registry measure-group identifier, e.g. `A`
    pub measure_group: String,

    pub rules: Vec<RuleId>,
}

/// A reportable set of rules, optionally organized into plans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: RuleSetId,
    pub title: String,
    pub rules: Vec<RuleId>,

    #[serde(default)]
    pub plans: Vec<Plan>,
}

fn always() -> Criterion {
    Criterion::Always
}
