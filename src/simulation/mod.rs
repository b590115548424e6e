//! Month-by-month compound interest projection.
//!
//! Each simulated month runs contribution, then interest, then tax on that
//! interest, and finally reports the inflation-adjusted balance. A series is
//! always rebuilt from scratch; there is no intermediate state to resume.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::calendar::add_months;

const MONTHS_PER_YEAR: i32 = 12;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingFrequency {
    #[default]
    Monthly,
    Yearly,
}

impl CompoundingFrequency {
    fn applies_in(self, month: i32) -> bool {
        match self {
            CompoundingFrequency::Monthly => true,
            CompoundingFrequency::Yearly => month % MONTHS_PER_YEAR == 0,
        }
    }
}

/// Parameters of one savings scenario. Rates are percentages (`5.0` = 5%).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterestScenarioInput {
    pub start_capital: f64,
    #[serde(default)]
    pub recurring_contribution: f64,
    #[serde(default)]
    pub contribution_frequency: CompoundingFrequency,
    pub annual_interest_rate: f64,
    pub duration_months: i32,
    #[serde(default)]
    pub interest_frequency: CompoundingFrequency,
    #[serde(default)]
    pub advanced_enabled: bool,
    #[serde(default)]
    pub annual_inflation_rate: f64,
    #[serde(default)]
    pub gains_tax_rate: f64,
    #[serde(default)]
    pub annual_contribution_increase: f64,
}

impl Default for InterestScenarioInput {
    fn default() -> Self {
        Self {
            start_capital: 0.0,
            recurring_contribution: 0.0,
            contribution_frequency: CompoundingFrequency::Monthly,
            annual_interest_rate: 0.0,
            duration_months: 0,
            interest_frequency: CompoundingFrequency::Monthly,
            advanced_enabled: false,
            annual_inflation_rate: 0.0,
            gains_tax_rate: 0.0,
            annual_contribution_increase: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterestPoint {
    pub month: i32,
    pub date: NaiveDate,
    pub contribution: f64,
    /// Interest credited this month, after gains tax when enabled.
    pub interest_earned: f64,
    pub balance: f64,
    pub total_contribution: f64,
    pub total_interest: f64,
    /// Balance in start-date money; only set for advanced scenarios.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_balance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterestSummary {
    pub months: i32,
    pub final_balance: f64,
    pub total_contribution: f64,
    pub total_interest: f64,
    pub final_real_balance: Option<f64>,
}

pub struct InterestSimulator;

impl InterestSimulator {
    /// Simulates `duration_months` months starting after `start`. Point `m`
    /// is dated `start + m months`.
    pub fn run(input: &InterestScenarioInput, start: NaiveDate) -> Vec<InterestPoint> {
        if input.duration_months <= 0 {
            return Vec::new();
        }
        let advanced = input.advanced_enabled;
        let mut balance = input.start_capital;
        let mut total_contribution = 0.0;
        let mut total_interest = 0.0;
        let mut points = Vec::with_capacity(input.duration_months as usize);

        for month in 1..=input.duration_months {
            let contribution = if input.contribution_frequency.applies_in(month) {
                contribution_for(input, month)
            } else {
                0.0
            };
            balance += contribution;
            total_contribution += contribution;

            let mut interest = if input.interest_frequency.applies_in(month) {
                balance * period_rate(input)
            } else {
                0.0
            };
            if advanced && interest > 0.0 {
                interest *= 1.0 - input.gains_tax_rate / 100.0;
            }
            balance += interest;
            total_interest += interest;

            let real_balance = advanced.then(|| {
                let years = month as f64 / MONTHS_PER_YEAR as f64;
                balance / (1.0 + input.annual_inflation_rate / 100.0).powf(years)
            });

            points.push(InterestPoint {
                month,
                date: add_months(start, month),
                contribution,
                interest_earned: interest,
                balance,
                total_contribution,
                total_interest,
                real_balance,
            });
        }

        debug!(
            months = input.duration_months,
            final_balance = balance,
            "interest simulation finished"
        );
        points
    }

    /// Headline figures of a finished series; `None` for an empty series.
    pub fn summarize(points: &[InterestPoint]) -> Option<InterestSummary> {
        let last = points.last()?;
        Some(InterestSummary {
            months: last.month,
            final_balance: last.balance,
            total_contribution: last.total_contribution,
            total_interest: last.total_interest,
            final_real_balance: last.real_balance,
        })
    }
}

fn contribution_for(input: &InterestScenarioInput, month: i32) -> f64 {
    if !input.advanced_enabled {
        return input.recurring_contribution;
    }
    let years_elapsed = (month - 1) / MONTHS_PER_YEAR;
    let growth = 1.0 + input.annual_contribution_increase / 100.0;
    input.recurring_contribution * growth.powi(years_elapsed)
}

fn period_rate(input: &InterestScenarioInput) -> f64 {
    match input.interest_frequency {
        CompoundingFrequency::Monthly => {
            input.annual_interest_rate / MONTHS_PER_YEAR as f64 / 100.0
        }
        CompoundingFrequency::Yearly => input.annual_interest_rate / 100.0,
    }
}
