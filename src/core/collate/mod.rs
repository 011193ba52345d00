//! Patient batch collation
//!
//! Collation turns a rule set and a patient source into one forward-only
//! stream of scope markers and patient batches:
//!
//! ```text
//! outer:  Provider(p1) Batch.. Provider(p2) Batch..
//! inner:  Plan(A) Provider(p1) Batch.. Provider(p2) Batch.. Plan(D) Provider(p1) ..
//! ```
//!
//! Every provider marker carries the rules its batches are evaluated
//! against. Patients are pulled from the source on demand, so at most one
//! batch of records is held at a time.

use crate::adapters::source::{PatientCriteria, PatientIter, PatientSource, ProviderRelationship};
use crate::core::catalog::RuleCatalog;
use crate::domain::{
    PatientBatch, PlanRow, Provider, ProviderId, ProviderRow, Result, RuleId, RuleSetId,
    SourceError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Organization of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollationMode {
    /// Providers at the top level, evaluated against every rule of the set
    #[default]
    Outer,
    /// Plans at the top level, providers nested inside each plan
    Inner,
}

impl CollationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollationMode::Outer => "outer",
            CollationMode::Inner => "inner",
        }
    }
}

impl fmt::Display for CollationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outer" => Ok(Self::Outer),
            "inner" => Ok(Self::Inner),
            _ => Err(format!(
                "Invalid collation mode: {s}. Expected 'outer' or 'inner'"
            )),
        }
    }
}

/// Which patients belong to which provider, and which providers to report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    pub relationship: ProviderRelationship,

    /// Report only these providers; empty means all
    pub providers: Vec<ProviderId>,
}

/// Collation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateOptions {
    pub mode: CollationMode,
    pub grouping: Grouping,
    pub batch_size: usize,
}

/// An element of the collated stream
#[derive(Debug, Clone)]
pub enum CollatedItem {
    /// Start of a plan scope (inner mode only)
    Plan(PlanRow),

    /// Start of a provider scope, with the rules its batches are evaluated against
    Provider {
        row: ProviderRow,
        rules: Arc<[RuleId]>,
    },

    /// Patients of the current provider scope
    Batch(PatientBatch),
}

/// Top-level scope: a plan in inner mode, the whole rule set in outer mode
struct Scope {
    plan: Option<PlanRow>,
    rules: Arc<[RuleId]>,
}

struct ScopeCursor {
    rules: Arc<[RuleId]>,
    next_provider: usize,
}

/// Lazy, one-shot stream of collated items
///
/// The stream is fused: after the first error it ends.
pub struct Collation<'a> {
    source: &'a dyn PatientSource,
    scopes: std::vec::IntoIter<Scope>,
    providers: Vec<Provider>,
    relationship: ProviderRelationship,
    batch_size: usize,
    current: Option<ScopeCursor>,
    patients: Option<PatientIter<'a>>,
    done: bool,
}

impl<'a> Collation<'a> {
    /// Number of providers each scope iterates over
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    fn next_batch(&mut self) -> Option<Result<PatientBatch>> {
        let patients = self.patients.as_mut()?;
        let mut batch = Vec::with_capacity(self.batch_size);

        while batch.len() < self.batch_size {
            match patients.next() {
                Some(Ok(patient)) => batch.push(patient),
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.patients = None;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(PatientBatch::new(batch)))
        }
    }

    fn advance(&mut self) -> Option<Result<CollatedItem>> {
        loop {
            if self.patients.is_some() {
                match self.next_batch() {
                    Some(Ok(batch)) => return Some(Ok(CollatedItem::Batch(batch))),
                    Some(Err(e)) => return Some(Err(e)),
                    None => continue,
                }
            }

            if let Some(cursor) = self.current.as_mut() {
                if let Some(provider) = self.providers.get(cursor.next_provider) {
                    cursor.next_provider += 1;
                    let criteria = PatientCriteria::new(provider.id.clone(), self.relationship);
                    let source = self.source;
                    match source.query_patients(&criteria) {
                        Ok(patients) => self.patients = Some(patients),
                        Err(e) => return Some(Err(e)),
                    }
                    return Some(Ok(CollatedItem::Provider {
                        row: ProviderRow {
                            provider: provider.clone(),
                        },
                        rules: Arc::clone(&cursor.rules),
                    }));
                }
                self.current = None;
            }

            let scope = self.scopes.next()?;
            self.current = Some(ScopeCursor {
                rules: scope.rules,
                next_provider: 0,
            });
            if let Some(plan) = scope.plan {
                return Some(Ok(CollatedItem::Plan(plan)));
            }
        }
    }
}

impl Iterator for Collation<'_> {
    type Item = Result<CollatedItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.advance();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Starts collating a rule set
///
/// The provider list is read eagerly; patients are read as the stream is
/// consumed.
///
/// # Errors
///
/// Returns [`TallyError::UnknownRuleSet`](crate::domain::TallyError::UnknownRuleSet)
/// if the rule set is not registered, and a source error if the providers
/// cannot be read or a provider in the filter does not exist.
pub fn collate<'a>(
    catalog: &RuleCatalog,
    rule_set_id: &RuleSetId,
    source: &'a dyn PatientSource,
    options: &CollateOptions,
) -> Result<Collation<'a>> {
    let rule_set = catalog.rule_set(rule_set_id)?;

    let scopes: Vec<Scope> = match options.mode {
        CollationMode::Outer => vec![Scope {
            plan: None,
            rules: rule_set.rules.clone().into(),
        }],
        CollationMode::Inner => {
            if rule_set.plans.is_empty() {
                tracing::warn!(
                    rule_set = %rule_set_id,
                    "Rule set has no plans, inner collation yields no measure groups"
                );
            }
            rule_set
                .plans
                .iter()
                .map(|plan| Scope {
                    plan: Some(PlanRow {
                        plan_id: plan.id.clone(),
                        title: plan.title.clone(),
                        measure_group: plan.measure_group.clone(),
                    }),
                    rules: plan.rules.clone().into(),
                })
                .collect()
        }
    };

    let mut providers = source.providers()?;
    let filter = &options.grouping.providers;
    if !filter.is_empty() {
        if let Some(missing) = filter.iter().find(|id| !providers.iter().any(|p| &p.id == *id)) {
            return Err(SourceError::ProviderNotFound(missing.to_string()).into());
        }
        providers.retain(|p| filter.contains(&p.id));
    }

    tracing::debug!(
        rule_set = %rule_set_id,
        mode = %options.mode,
        scopes = scopes.len(),
        providers = providers.len(),
        batch_size = options.batch_size,
        source = source.name(),
        "Collation started"
    );

    Ok(Collation {
        source,
        scopes: scopes.into_iter(),
        providers,
        relationship: options.grouping.relationship,
        batch_size: options.batch_size.max(1),
        current: None,
        patients: None,
        done: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::source::SnapshotSource;
    use crate::domain::{PatientId, PatientRecord, TallyError};
    use chrono::NaiveDate;

    fn provider(id: &str) -> Provider {
        Provider {
            id: ProviderId::new(id).unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            npi: None,
            federal_tax_id: None,
        }
    }

    fn patient(pid: &str, provider: &str) -> PatientRecord {
        let mut p = PatientRecord::new(
            PatientId::new(pid).unwrap(),
            NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(),
        );
        p.provider_id = Some(ProviderId::new(provider).unwrap());
        p
    }

    fn source() -> SnapshotSource {
        SnapshotSource::new(
            vec![provider("1"), provider("2")],
            vec![
                patient("10", "1"),
                patient("11", "1"),
                patient("12", "1"),
                patient("20", "2"),
            ],
        )
    }

    fn options(mode: CollationMode) -> CollateOptions {
        CollateOptions {
            mode,
            grouping: Grouping::default(),
            batch_size: 2,
        }
    }

    fn shape(items: Vec<CollatedItem>) -> Vec<String> {
        items
            .into_iter()
            .map(|item| match item {
                CollatedItem::Plan(plan) => format!("plan:{}", plan.measure_group),
                CollatedItem::Provider { row, .. } => format!("provider:{}", row.provider.id),
                CollatedItem::Batch(batch) => format!("batch:{}", batch.len()),
            })
            .collect()
    }

    #[test]
    fn test_collate_outer() {
        let catalog = RuleCatalog::builtin();
        let source = source();
        let items: Vec<_> = collate(
            &catalog,
            &RuleSetId::new("cqm_2011").unwrap(),
            &source,
            &options(CollationMode::Outer),
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

        assert_eq!(
            shape(items),
            vec!["provider:1", "batch:2", "batch:1", "provider:2", "batch:1"]
        );
    }

    #[test]
    fn test_collate_inner_groups_by_plan() {
        let catalog = RuleCatalog::builtin();
        let source = source();
        let items: Vec<_> = collate(
            &catalog,
            &RuleSetId::new("cqm_2011").unwrap(),
            &source,
            &options(CollationMode::Inner),
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();

        let rules: Vec<usize> = items
            .iter()
            .filter_map(|item| match item {
                CollatedItem::Provider { rules, .. } => Some(rules.len()),
                _ => None,
            })
            .collect();
        assert_eq!(rules, vec![3, 3, 5, 5]);

        assert_eq!(
            shape(items),
            vec![
                "plan:A",
                "provider:1",
                "batch:2",
                "batch:1",
                "provider:2",
                "batch:1",
                "plan:D",
                "provider:1",
                "batch:2",
                "batch:1",
                "provider:2",
                "batch:1",
            ]
        );
    }

    #[test]
    fn test_collate_provider_filter() {
        let catalog = RuleCatalog::builtin();
        let source = source();
        let mut opts = options(CollationMode::Outer);
        opts.grouping.providers = vec![ProviderId::new("2").unwrap()];

        let items: Vec<_> = collate(&catalog, &RuleSetId::new("cqm_2011").unwrap(), &source, &opts)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(shape(items), vec!["provider:2", "batch:1"]);

        opts.grouping.providers = vec![ProviderId::new("9").unwrap()];
        let err = collate(&catalog, &RuleSetId::new("cqm_2011").unwrap(), &source, &opts)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TallyError::Source(SourceError::ProviderNotFound(_))
        ));
    }

    #[test]
    fn test_collate_provider_without_patients() {
        let catalog = RuleCatalog::builtin();
        let source = SnapshotSource::new(vec![provider("1")], Vec::new());
        let items: Vec<_> = collate(
            &catalog,
            &RuleSetId::new("amc_2011").unwrap(),
            &source,
            &options(CollationMode::Outer),
        )
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
        assert_eq!(shape(items), vec!["provider:1"]);
    }

    #[test]
    fn test_collate_unknown_rule_set() {
        let catalog = RuleCatalog::builtin();
        let source = source();
        let err = collate(
            &catalog,
            &RuleSetId::new("nope").unwrap(),
            &source,
            &options(CollationMode::Outer),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TallyError::UnknownRuleSet(_)));
    }

    #[test]
    fn test_collation_mode_from_str() {
        assert_eq!(CollationMode::from_str("INNER").unwrap(), CollationMode::Inner);
        assert!(CollationMode::from_str("nested").is_err());
    }
}
