//! Resolves versioned household costs into per-member amounts.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    calendar::{end_of_month, same_month, start_of_month},
    normalize::Normalized,
    split::{Member, SplitAllocation, SplitAllocator},
    versioning::{CostVersion, VersionChain},
};
use crate::errors::Result;

/// A household cost together with its version history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HouseholdCost {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub chain: VersionChain,
}

impl HouseholdCost {
    pub fn new(label: impl Into<String>, chain: VersionChain) -> Self {
        Self {
            label: label.into(),
            category: None,
            chain,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.chain.cost_id
    }
}

/// Final per-member split of one cost at one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccurrenceAllocation {
    pub cost_id: Uuid,
    pub date: NaiveDate,
    pub version_from: NaiveDate,
    pub amount: f64,
    pub allocation: SplitAllocation,
    pub external_total: f64,
    pub resident_net_total: f64,
}

/// Splits the occurrence amount of the version in effect on `date`.
/// Returns `None` when no version covers that date.
pub fn resolve_occurrence(
    allocator: &SplitAllocator,
    chain: &VersionChain,
    date: NaiveDate,
    members: &[Member],
) -> Result<Option<OccurrenceAllocation>> {
    let Some(version) = chain.version_at(date) else {
        return Ok(None);
    };
    allocate_version(allocator, version, version.amount, date, members).map(Some)
}

/// Like [`resolve_occurrence`] but splits the monthly equivalent of the
/// version in effect at the start of `month` (or the first version starting
/// inside it). A one-time version only counts in the month it starts.
pub fn resolve_month(
    allocator: &SplitAllocator,
    chain: &VersionChain,
    month: NaiveDate,
    members: &[Member],
) -> Result<Option<OccurrenceAllocation>> {
    let month_start = start_of_month(month);
    let month_end = end_of_month(month);
    let version = chain
        .version_at(month_start)
        .filter(|version| {
            !version.frequency.is_one_time() || same_month(version.valid_from, month_start)
        })
        .or_else(|| {
            chain.versions().iter().find(|version| {
                version.valid_from > month_start && version.valid_from <= month_end
            })
        });
    let Some(version) = version else {
        return Ok(None);
    };
    let amount = version.monthly_equivalent();
    allocate_version(allocator, version, amount, month_start, members).map(Some)
}

/// Sums every member's monthly share across `costs` for the month containing `month`.
/// Unshared costs without a payer accrue to the household payer id.
pub fn member_totals(
    allocator: &SplitAllocator,
    costs: &[HouseholdCost],
    month: NaiveDate,
    members: &[Member],
) -> Result<Vec<(Uuid, f64)>> {
    let units = allocator.units();
    let mut order: Vec<Uuid> = members.iter().map(|member| member.id).collect();
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for cost in costs {
        let Some(resolved) = resolve_month(allocator, &cost.chain, month, members)? else {
            continue;
        };
        for share in resolved.allocation.shares {
            if !order.contains(&share.member_id) {
                order.push(share.member_id);
            }
            *totals.entry(share.member_id).or_default() += share.minor_units;
        }
    }
    Ok(order
        .into_iter()
        .map(|id| (id, units.to_major(totals.get(&id).copied().unwrap_or(0))))
        .collect())
}

fn allocate_version(
    allocator: &SplitAllocator,
    version: &CostVersion,
    amount: f64,
    date: NaiveDate,
    members: &[Member],
) -> Result<OccurrenceAllocation> {
    let allocation = if version.is_shared {
        allocator.allocate(amount, &version.split_policy, members)?
    } else {
        allocator.sole_payer(amount, version.payer_id)
    };
    let external_total = allocation.external_total(members);
    let resident_net_total = allocation.resident_net_total(members);
    Ok(OccurrenceAllocation {
        cost_id: version.cost_id,
        date,
        version_from: version.valid_from,
        amount: allocation.total,
        allocation,
        external_total,
        resident_net_total,
    })
}
