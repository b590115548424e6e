use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::{add_days, add_months};

/// Billing or accrual cadence of a recurring obligation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RecurrenceFrequency {
    #[default]
    Monthly,
    Yearly,
    FourWeekly,
    Weekly,
    Biweekly,
    /// Every `months` months. Missing or non-positive periods behave as 1.
    CustomMonths {
        #[serde(default)]
        months: i32,
    },
    OneTime,
}

/// The distance between two consecutive occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Days(i64),
    Months(i32),
    Once,
}

impl RecurrenceFrequency {
    pub fn custom_months(months: i32) -> Self {
        RecurrenceFrequency::CustomMonths { months }
    }

    pub fn step(&self) -> Step {
        match self {
            RecurrenceFrequency::Monthly => Step::Months(1),
            RecurrenceFrequency::Yearly => Step::Months(12),
            RecurrenceFrequency::FourWeekly => Step::Days(28),
            RecurrenceFrequency::Weekly => Step::Days(7),
            RecurrenceFrequency::Biweekly => Step::Days(14),
            RecurrenceFrequency::CustomMonths { .. } => Step::Months(self.period_months()),
            RecurrenceFrequency::OneTime => Step::Once,
        }
    }

    /// Effective month count for `CustomMonths`; `1` for every other cadence.
    pub fn period_months(&self) -> i32 {
        match self {
            RecurrenceFrequency::CustomMonths { months } if *months > 0 => *months,
            _ => 1,
        }
    }

    /// Returns the occurrence `steps` periods after `anchor`, always measured from the
    /// anchor so month clamping never accumulates (Jan 31 → Feb 29 → Mar 31).
    pub fn shift(&self, anchor: NaiveDate, steps: i64) -> NaiveDate {
        match self.step() {
            Step::Days(days) => add_days(anchor, days.saturating_mul(steps)),
            Step::Months(months) => {
                let total = (months as i64).saturating_mul(steps);
                let clamped = total.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                add_months(anchor, clamped)
            }
            Step::Once => anchor,
        }
    }

    pub fn is_one_time(&self) -> bool {
        matches!(self, RecurrenceFrequency::OneTime)
    }

    pub fn label(&self) -> String {
        match self {
            RecurrenceFrequency::Monthly => "Monthly".into(),
            RecurrenceFrequency::Yearly => "Yearly".into(),
            RecurrenceFrequency::FourWeekly => "Every 4 Weeks".into(),
            RecurrenceFrequency::Weekly => "Weekly".into(),
            RecurrenceFrequency::Biweekly => "Every 2 Weeks".into(),
            RecurrenceFrequency::CustomMonths { .. } => match self.period_months() {
                1 => "Monthly".into(),
                n => format!("Every {} Months", n),
            },
            RecurrenceFrequency::OneTime => "One-time".into(),
        }
    }
}

impl fmt::Display for RecurrenceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
