//! Dashboard aggregates derived from normalized, period-filtered obligations.
//!
//! Every function here is recomputed from the record snapshot it is handed;
//! nothing is cached between calls.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    config::EngineConfig,
    ledger::{
        calendar::{add_months, start_of_month},
        normalize::{obligation_monthly_in_month, Normalized},
        Obligation,
    },
};

/// Total of one monthly bucket in a trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// First day of the bucket's month.
    pub month: NaiveDate,
    pub total: f64,
}

/// One labelled slice of a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub label: String,
    pub value: f64,
    /// Fraction of the breakdown total; `0.0` when the total is zero.
    pub share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyNet {
    pub income: f64,
    pub outflow: f64,
    pub net: f64,
}

pub fn monthly_total<T: Normalized>(items: &[T]) -> f64 {
    items.iter().map(Normalized::monthly_equivalent).sum()
}

/// `months_back` monthly buckets ending at the reference month, oldest first.
pub fn trend(items: &[Obligation], months_back: usize, reference: NaiveDate) -> Vec<TrendPoint> {
    let current = start_of_month(reference);
    (0..months_back)
        .rev()
        .map(|offset| {
            let month = add_months(current, -(offset as i32));
            let total = items
                .iter()
                .map(|item| obligation_monthly_in_month(item, month))
                .sum();
            TrendPoint { month, total }
        })
        .collect()
}

/// [`trend`] over the configured number of months.
pub fn recent_trend(
    items: &[Obligation],
    config: &EngineConfig,
    reference: NaiveDate,
) -> Vec<TrendPoint> {
    trend(items, config.trend_months, reference)
}

/// Groups by `key_fn`, summing monthly equivalents, largest first. Ties keep
/// the order in which their keys were first seen.
pub fn breakdown_by<T, F>(items: &[T], key_fn: F) -> Vec<BreakdownEntry>
where
    T: Normalized,
    F: Fn(&T) -> String,
{
    let mut groups: Vec<(String, f64)> = Vec::new();
    for item in items {
        let key = key_fn(item);
        let value = item.monthly_equivalent();
        match groups.iter_mut().find(|(label, _)| *label == key) {
            Some((_, sum)) => *sum += value,
            None => groups.push((key, value)),
        }
    }
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total: f64 = groups.iter().map(|(_, value)| value).sum();
    groups
        .into_iter()
        .map(|(label, value)| BreakdownEntry {
            label,
            value,
            share: ratio(value, total),
        })
        .collect()
}

/// The `n` items with the largest monthly equivalent, largest first.
pub fn top_n<T: Normalized>(items: &[T], n: usize) -> Vec<&T> {
    let mut ranked: Vec<&T> = items.iter().collect();
    ranked.sort_by(|a, b| b.monthly_equivalent().total_cmp(&a.monthly_equivalent()));
    ranked.truncate(n);
    ranked
}

/// Monthly income against subscription and household outflow.
pub fn monthly_net(items: &[Obligation]) -> MonthlyNet {
    let (income, outflow) = items.iter().fold((0.0, 0.0), |(inflow, outflow), item| {
        if item.kind.is_inflow() {
            (inflow + item.monthly_equivalent(), outflow)
        } else {
            (inflow, outflow + item.monthly_equivalent())
        }
    });
    MonthlyNet {
        income,
        outflow,
        net: income - outflow,
    }
}

fn ratio(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ObligationKind, RecurrenceFrequency};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sub(label: &str, category: &str, amount: f64, frequency: RecurrenceFrequency) -> Obligation {
        Obligation::new(label, amount, frequency, date(2024, 1, 1)).with_category(category)
    }

    #[test]
    fn breakdown_sorts_and_keeps_first_seen_ties() {
        let items = vec![
            sub("Music", "media", 10.0, RecurrenceFrequency::Monthly),
            sub("Cloud", "tools", 120.0, RecurrenceFrequency::Yearly),
            sub("Video", "media", 5.0, RecurrenceFrequency::Monthly),
            sub("Gym", "health", 15.0, RecurrenceFrequency::Monthly),
        ];
        let breakdown = breakdown_by(&items, |item| item.category.clone().unwrap_or_default());
        let labels: Vec<&str> = breakdown.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["media", "health", "tools"]);
        assert_eq!(breakdown[0].value, 15.0);
        assert_eq!(breakdown[0].share, 15.0 / 40.0);

        let tied = vec![
            sub("A", "x", 10.0, RecurrenceFrequency::Monthly),
            sub("B", "y", 10.0, RecurrenceFrequency::Monthly),
        ];
        let labels: Vec<String> = breakdown_by(&tied, |item| item.category.clone().unwrap())
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["x", "y"]);
    }

    #[test]
    fn zero_total_breakdown_has_zero_shares() {
        let items = vec![sub("Free tier", "tools", 0.0, RecurrenceFrequency::Monthly)];
        let breakdown = breakdown_by(&items, |_| "tools".into());
        assert_eq!(breakdown[0].share, 0.0);
        assert!(breakdown_by::<Obligation, _>(&[], |_| String::new()).is_empty());
    }

    #[test]
    fn top_n_ranks_by_monthly_equivalent() {
        let items = vec![
            sub("Music", "media", 10.0, RecurrenceFrequency::Monthly),
            sub("Cloud", "tools", 240.0, RecurrenceFrequency::Yearly),
            sub("Paper", "media", 4.0, RecurrenceFrequency::Weekly),
        ];
        let top: Vec<&str> = top_n(&items, 2).iter().map(|o| o.label.as_str()).collect();
        assert_eq!(top, vec!["Cloud", "Paper"]);
        assert_eq!(top_n(&items, 10).len(), 3);
    }

    #[test]
    fn trend_is_fixed_length_and_oldest_first() {
        let items = vec![
            sub("Music", "media", 10.0, RecurrenceFrequency::Monthly),
            Obligation::new("Course", 60.0, RecurrenceFrequency::OneTime, date(2024, 5, 9)),
            Obligation::new("Later", 20.0, RecurrenceFrequency::Monthly, date(2024, 6, 2)),
        ];
        let series = trend(&items, 3, date(2024, 6, 20));
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].month, date(2024, 4, 1));
        assert_eq!(series[0].total, 10.0);
        assert_eq!(series[1].total, 15.0);
        assert_eq!(series[2].month, date(2024, 6, 1));
        assert_eq!(series[2].total, 30.0);
        assert!(trend(&items, 0, date(2024, 6, 20)).is_empty());
    }

    #[test]
    fn net_separates_income() {
        let items = vec![
            Obligation::new("Salary", 3000.0, RecurrenceFrequency::Monthly, date(2024, 1, 1))
                .with_kind(ObligationKind::Income),
            sub("Music", "media", 10.0, RecurrenceFrequency::Monthly),
            Obligation::new("Rent", 1200.0, RecurrenceFrequency::Monthly, date(2024, 1, 1))
                .with_kind(ObligationKind::Household),
        ];
        let net = monthly_net(&items);
        assert_eq!(net.income, 3000.0);
        assert_eq!(net.outflow, 1210.0);
        assert_eq!(net.net, 1790.0);
        assert_eq!(monthly_total(&items), 4210.0);
    }
}
