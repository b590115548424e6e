use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::EngineConfig,
    currency::MinorUnits,
    errors::{EngineError, Result},
};

/// Payer id used when an unshared cost has no configured payer.
pub const HOUSEHOLD_PAYER_ID: Uuid = Uuid::nil();

const PERCENT_TOLERANCE: f64 = 0.01;
const FLOAT_SLACK: f64 = 1e-9;
const FIXED_AMOUNT_TOLERANCE_MINOR: i64 = 1;

/// Rule for dividing a shared cost between members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "policy", content = "parameters", rename_all = "snake_case")]
pub enum SplitPolicy {
    #[default]
    Equal,
    /// Share percentage per member; must total 100.
    Weighted(BTreeMap<Uuid, f64>),
    /// Fixed major-unit amount per member; must total the occurrence amount.
    FixedAmount(BTreeMap<Uuid, f64>),
    /// Free-form percentage per member; must total 100.
    Custom(BTreeMap<Uuid, f64>),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayerKind {
    #[default]
    Resident,
    External,
}

/// A household member or outside payer that can carry a share.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub kind: PayerKind,
}

impl Member {
    pub fn resident(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: PayerKind::Resident,
        }
    }

    pub fn external(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: PayerKind::External,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.kind, PayerKind::External)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplitShare {
    pub member_id: Uuid,
    pub amount: f64,
    pub minor_units: i64,
}

/// Shares of one occurrence; `minor_units` always sum to `total_minor`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplitAllocation {
    pub shares: Vec<SplitShare>,
    pub total_minor: i64,
    pub total: f64,
}

impl SplitAllocation {
    fn from_minor(units: MinorUnits, total_minor: i64, parts: Vec<(Uuid, i64)>) -> Self {
        let shares = parts
            .into_iter()
            .map(|(member_id, minor_units)| SplitShare {
                member_id,
                amount: units.to_major(minor_units),
                minor_units,
            })
            .collect();
        Self {
            shares,
            total_minor,
            total: units.to_major(total_minor),
        }
    }

    pub fn share_for(&self, member_id: Uuid) -> Option<&SplitShare> {
        self.shares.iter().find(|share| share.member_id == member_id)
    }

    pub fn allocated_minor(&self) -> i64 {
        self.shares.iter().map(|share| share.minor_units).sum()
    }

    /// Portion carried by members marked [`PayerKind::External`].
    pub fn external_total(&self, members: &[Member]) -> f64 {
        self.shares
            .iter()
            .filter(|share| {
                members
                    .iter()
                    .any(|member| member.id == share.member_id && member.is_external())
            })
            .map(|share| share.amount)
            .sum()
    }

    /// Occurrence total minus whatever external payers cover.
    pub fn resident_net_total(&self, members: &[Member]) -> f64 {
        self.total - self.external_total(members)
    }
}

/// Divides occurrence amounts between members in exact minor units.
#[derive(Debug, Clone, Copy)]
pub struct SplitAllocator {
    units: MinorUnits,
    percent_tolerance: f64,
}

impl Default for SplitAllocator {
    fn default() -> Self {
        Self {
            units: MinorUnits::default(),
            percent_tolerance: PERCENT_TOLERANCE,
        }
    }
}

impl SplitAllocator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            units: MinorUnits::from_config(config),
            percent_tolerance: config.percent_tolerance,
        }
    }

    pub fn units(&self) -> MinorUnits {
        self.units
    }

    /// Splits `occurrence_amount` between `members` according to `policy`.
    ///
    /// Rounding residue goes to the first member with a positive share so the
    /// shares add up to the occurrence amount exactly.
    pub fn allocate(
        &self,
        occurrence_amount: f64,
        policy: &SplitPolicy,
        members: &[Member],
    ) -> Result<SplitAllocation> {
        if members.is_empty() {
            return Err(EngineError::InvalidSplitConfiguration(
                "no members to split between".into(),
            ));
        }
        let total = self.units.to_minor(occurrence_amount);
        let parts = match policy {
            SplitPolicy::Equal => equal_parts(total, members),
            SplitPolicy::Weighted(percents) | SplitPolicy::Custom(percents) => {
                self.percent_parts(total, percents, members)?
            }
            SplitPolicy::FixedAmount(amounts) => self.fixed_parts(total, amounts, members)?,
        };
        debug!(
            total_minor = total,
            members = members.len(),
            policy = policy_name(policy),
            "allocated shared cost"
        );
        Ok(SplitAllocation::from_minor(self.units, total, parts))
    }

    /// Allocation for an unshared cost: everything goes to one payer, or to the
    /// implicit household payer when none is configured.
    pub fn sole_payer(&self, occurrence_amount: f64, payer_id: Option<Uuid>) -> SplitAllocation {
        let total = self.units.to_minor(occurrence_amount);
        let payer = payer_id.unwrap_or(HOUSEHOLD_PAYER_ID);
        SplitAllocation::from_minor(self.units, total, vec![(payer, total)])
    }

    fn percent_parts(
        &self,
        total: i64,
        percents: &BTreeMap<Uuid, f64>,
        members: &[Member],
    ) -> Result<Vec<(Uuid, i64)>> {
        ensure_known_members(percents, members)?;
        if let Some((id, value)) = percents.iter().find(|(_, value)| **value < 0.0) {
            return Err(EngineError::InvalidSplitConfiguration(format!(
                "negative percentage {value} for member {id}"
            )));
        }
        let weights: Vec<(Uuid, f64)> = members
            .iter()
            .map(|member| (member.id, percents.get(&member.id).copied().unwrap_or(0.0)))
            .collect();
        let percent_sum: f64 = weights.iter().map(|(_, percent)| percent).sum();
        if (percent_sum - 100.0).abs() > self.percent_tolerance + FLOAT_SLACK {
            return Err(EngineError::InvalidSplitConfiguration(format!(
                "percentages sum to {percent_sum}, expected 100"
            )));
        }
        // Floored shares never exceed the total, so the residue is non-negative.
        let mut parts: Vec<(Uuid, i64)> = weights
            .iter()
            .map(|(id, percent)| (*id, (total as f64 * percent / percent_sum).floor() as i64))
            .collect();
        let allocated: i64 = parts.iter().map(|(_, minor)| minor).sum();
        let recipient = weights
            .iter()
            .position(|(_, percent)| *percent > 0.0)
            .unwrap_or(0);
        if let Some((_, share)) = parts.get_mut(recipient) {
            *share += total - allocated;
        }
        Ok(parts)
    }

    fn fixed_parts(
        &self,
        total: i64,
        amounts: &BTreeMap<Uuid, f64>,
        members: &[Member],
    ) -> Result<Vec<(Uuid, i64)>> {
        ensure_known_members(amounts, members)?;
        if let Some((id, value)) = amounts.iter().find(|(_, value)| **value < 0.0) {
            return Err(EngineError::InvalidSplitConfiguration(format!(
                "negative fixed amount {value} for member {id}"
            )));
        }
        let parts: Vec<(Uuid, i64)> = members
            .iter()
            .map(|member| {
                let amount = amounts.get(&member.id).copied().unwrap_or(0.0);
                (member.id, self.units.to_minor(amount))
            })
            .collect();
        let configured: i64 = parts.iter().map(|(_, minor)| minor).sum();
        if (configured - total).abs() > FIXED_AMOUNT_TOLERANCE_MINOR {
            return Err(EngineError::InvalidSplitConfiguration(format!(
                "fixed amounts sum to {}, expected {}",
                self.units.to_major(configured),
                self.units.to_major(total)
            )));
        }
        Ok(with_residue_on_first(total, parts))
    }
}

fn equal_parts(total: i64, members: &[Member]) -> Vec<(Uuid, i64)> {
    let count = members.len() as i64;
    let base = total.div_euclid(count);
    let parts = members.iter().map(|member| (member.id, base)).collect();
    with_residue_on_first(total, parts)
}

/// Settles the rounding residue on the first member holding a positive share,
/// or on the first member when nobody does.
fn with_residue_on_first(total: i64, mut parts: Vec<(Uuid, i64)>) -> Vec<(Uuid, i64)> {
    let allocated: i64 = parts.iter().map(|(_, minor)| minor).sum();
    let recipient = parts.iter().position(|(_, minor)| *minor > 0).unwrap_or(0);
    if let Some((_, share)) = parts.get_mut(recipient) {
        *share += total - allocated;
    }
    parts
}

fn ensure_known_members(parameters: &BTreeMap<Uuid, f64>, members: &[Member]) -> Result<()> {
    match parameters
        .keys()
        .find(|id| !members.iter().any(|member| member.id == **id))
    {
        Some(unknown) => Err(EngineError::InvalidSplitConfiguration(format!(
            "member {unknown} is not part of this split"
        ))),
        None => Ok(()),
    }
}

fn policy_name(policy: &SplitPolicy) -> &'static str {
    match policy {
        SplitPolicy::Equal => "equal",
        SplitPolicy::Weighted(_) => "weighted",
        SplitPolicy::FixedAmount(_) => "fixed_amount",
        SplitPolicy::Custom(_) => "custom",
    }
}
