//! Time-bounded version chains for recurring household costs.
//!
//! Each edit closes the version in effect and appends a new one, so "what were
//! the terms on date D" stays answerable after any number of edits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{frequency::RecurrenceFrequency, normalize::Normalized, split::SplitPolicy};
use crate::errors::{EngineError, Result};

/// The editable terms of a cost, independent of when they apply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostTerms {
    pub amount: f64,
    pub frequency: RecurrenceFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<Uuid>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub split_policy: SplitPolicy,
}

impl CostTerms {
    pub fn new(amount: f64, frequency: RecurrenceFrequency) -> Self {
        Self {
            amount,
            frequency,
            payer_id: None,
            is_shared: false,
            split_policy: SplitPolicy::Equal,
        }
    }

    pub fn paid_by(mut self, payer_id: Uuid) -> Self {
        self.payer_id = Some(payer_id);
        self
    }

    pub fn shared(mut self, policy: SplitPolicy) -> Self {
        self.is_shared = true;
        self.split_policy = policy;
        self
    }
}

/// Terms in effect over `[valid_from, valid_until)`; an absent end is open-ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostVersion {
    pub cost_id: Uuid,
    pub valid_from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    pub amount: f64,
    pub frequency: RecurrenceFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<Uuid>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub split_policy: SplitPolicy,
}

impl CostVersion {
    pub fn from_terms(cost_id: Uuid, valid_from: NaiveDate, terms: CostTerms) -> Self {
        Self {
            cost_id,
            valid_from,
            valid_until: None,
            amount: terms.amount,
            frequency: terms.frequency,
            payer_id: terms.payer_id,
            is_shared: terms.is_shared,
            split_policy: terms.split_policy,
        }
    }

    pub fn terms(&self) -> CostTerms {
        CostTerms {
            amount: self.amount,
            frequency: self.frequency,
            payer_id: self.payer_id,
            is_shared: self.is_shared,
            split_policy: self.split_policy.clone(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_until.map_or(true, |until| date < until)
    }
}

impl Normalized for CostVersion {
    fn monthly_equivalent(&self) -> f64 {
        super::normalize::monthly_equivalent(self.amount, self.frequency)
    }
}

/// A broken chain invariant, reported by [`VersionChain::violations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainViolation {
    Empty,
    ForeignVersion { index: usize },
    EmptyRange { index: usize },
    Gap { index: usize },
    Overlap { index: usize },
    OpenBeforeLast { index: usize },
}

/// Ordered, non-overlapping versions of one logical cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionChain {
    pub cost_id: Uuid,
    versions: Vec<CostVersion>,
}

impl VersionChain {
    /// Starts a chain with a single open version from `created_on`.
    pub fn new(cost_id: Uuid, created_on: NaiveDate, terms: CostTerms) -> Self {
        Self {
            cost_id,
            versions: vec![CostVersion::from_terms(cost_id, created_on, terms)],
        }
    }

    /// Wraps a stored snapshot, sorting by `valid_from`. Use [`Self::violations`]
    /// to check the snapshot before trusting it.
    pub fn from_versions(cost_id: Uuid, mut versions: Vec<CostVersion>) -> Self {
        versions.sort_by_key(|version| version.valid_from);
        Self { cost_id, versions }
    }

    pub fn versions(&self) -> &[CostVersion] {
        &self.versions
    }

    pub fn created_on(&self) -> Option<NaiveDate> {
        self.versions.first().map(|version| version.valid_from)
    }

    /// The open-ended last version, if the cost has not been closed.
    pub fn current(&self) -> Option<&CostVersion> {
        self.versions
            .last()
            .filter(|version| version.valid_until.is_none())
    }

    pub fn is_closed(&self) -> bool {
        self.versions
            .last()
            .is_some_and(|version| version.valid_until.is_some())
    }

    /// Version whose `[valid_from, valid_until)` contains `date`.
    pub fn version_at(&self, date: NaiveDate) -> Option<&CostVersion> {
        let idx = self
            .versions
            .partition_point(|version| version.valid_from <= date);
        if idx == 0 {
            return None;
        }
        self.versions
            .get(idx - 1)
            .filter(|version| version.contains(date))
    }

    /// Returns the chain with `new_terms` in effect from `effective_from` onward.
    ///
    /// Versions starting on or after `effective_from` are discarded, the
    /// remaining last version is closed at `effective_from`, and a new open
    /// version is appended.
    pub fn apply_edit(&self, new_terms: CostTerms, effective_from: NaiveDate) -> Result<Self> {
        let Some(chain_start) = self.created_on() else {
            return Ok(Self::new(self.cost_id, effective_from, new_terms));
        };
        if effective_from < chain_start {
            return Err(EngineError::InvalidEffectiveDate {
                effective_from,
                chain_start,
            });
        }

        let mut versions: Vec<CostVersion> = self
            .versions
            .iter()
            .filter(|version| version.valid_from < effective_from)
            .cloned()
            .collect();
        let superseded = self.versions.len() - versions.len();
        if let Some(last) = versions.last_mut() {
            last.valid_until = Some(effective_from);
        }
        versions.push(CostVersion::from_terms(
            self.cost_id,
            effective_from,
            new_terms,
        ));
        debug!(
            cost_id = %self.cost_id,
            %effective_from,
            superseded,
            versions = versions.len(),
            "applied cost edit"
        );
        Ok(Self {
            cost_id: self.cost_id,
            versions,
        })
    }

    /// Returns the chain with its last version ending at `end_date`.
    pub fn close(&self, end_date: NaiveDate) -> Result<Self> {
        let mut versions = self.versions.clone();
        if let Some(last) = versions.last_mut() {
            if end_date < last.valid_from {
                return Err(EngineError::InvalidEffectiveDate {
                    effective_from: end_date,
                    chain_start: last.valid_from,
                });
            }
            last.valid_until = Some(end_date);
        }
        debug!(cost_id = %self.cost_id, %end_date, "closed cost chain");
        Ok(Self {
            cost_id: self.cost_id,
            versions,
        })
    }

    /// Lists every broken ordering, coverage or ownership invariant.
    pub fn violations(&self) -> Vec<ChainViolation> {
        if self.versions.is_empty() {
            return vec![ChainViolation::Empty];
        }
        let mut found = Vec::new();
        let last_index = self.versions.len() - 1;
        for (index, version) in self.versions.iter().enumerate() {
            if version.cost_id != self.cost_id {
                found.push(ChainViolation::ForeignVersion { index });
            }
            if version
                .valid_until
                .is_some_and(|until| until <= version.valid_from)
            {
                found.push(ChainViolation::EmptyRange { index });
            }
            if index == last_index {
                continue;
            }
            let next = &self.versions[index + 1];
            match version.valid_until {
                None => found.push(ChainViolation::OpenBeforeLast { index }),
                Some(until) if until < next.valid_from => {
                    found.push(ChainViolation::Gap { index })
                }
                Some(until) if until > next.valid_from => {
                    found.push(ChainViolation::Overlap { index })
                }
                Some(_) => {}
            }
        }
        found
    }

    pub fn is_consistent(&self) -> bool {
        self.violations().is_empty()
    }
}
