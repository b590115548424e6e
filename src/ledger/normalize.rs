//! Converts amount/frequency pairs into comparable monthly and yearly figures.

use chrono::NaiveDate;

use super::{
    calendar::{end_of_month, same_month, start_of_month},
    frequency::RecurrenceFrequency,
    obligation::Obligation,
    recurring::is_visible_in_period,
};

const MONTHS_PER_YEAR: f64 = 12.0;
const FOUR_WEEK_PERIODS_PER_YEAR: f64 = 13.0;
const WEEKS_PER_YEAR: f64 = 52.0;
const BIWEEKLY_PERIODS_PER_YEAR: f64 = 26.0;

/// Monthly-equivalent value of `amount` charged at `frequency`.
///
/// One-time amounts are amortized over a year (`amount / 12`); use
/// [`obligation_monthly_in_month`] to restrict them to their occurrence month.
pub fn monthly_equivalent(amount: f64, frequency: RecurrenceFrequency) -> f64 {
    match frequency {
        RecurrenceFrequency::Monthly => amount,
        RecurrenceFrequency::Yearly => amount / MONTHS_PER_YEAR,
        RecurrenceFrequency::FourWeekly => amount * FOUR_WEEK_PERIODS_PER_YEAR / MONTHS_PER_YEAR,
        RecurrenceFrequency::Weekly => amount * WEEKS_PER_YEAR / MONTHS_PER_YEAR,
        RecurrenceFrequency::Biweekly => amount * BIWEEKLY_PERIODS_PER_YEAR / MONTHS_PER_YEAR,
        RecurrenceFrequency::CustomMonths { .. } => amount / frequency.period_months() as f64,
        RecurrenceFrequency::OneTime => amount / MONTHS_PER_YEAR,
    }
}

pub fn yearly_equivalent(amount: f64, frequency: RecurrenceFrequency) -> f64 {
    monthly_equivalent(amount, frequency) * MONTHS_PER_YEAR
}

/// Contribution of `obligation` to the month containing `month`.
///
/// Zero when the obligation is not visible in that month. One-time obligations
/// only count in the month they occur in.
pub fn obligation_monthly_in_month(obligation: &Obligation, month: NaiveDate) -> f64 {
    let month_start = start_of_month(month);
    let month_end = end_of_month(month);
    if !is_visible_in_period(obligation, month_start, month_end) {
        return 0.0;
    }
    if obligation.frequency.is_one_time() {
        let occurs_on = obligation
            .explicit_next_date
            .unwrap_or(obligation.anchor_date);
        if !same_month(occurs_on, month) {
            return 0.0;
        }
    }
    obligation.monthly_equivalent()
}

/// Anything carrying an amount tied to a billing frequency.
pub trait Normalized {
    fn monthly_equivalent(&self) -> f64;

    fn yearly_equivalent(&self) -> f64 {
        self.monthly_equivalent() * MONTHS_PER_YEAR
    }
}

impl Normalized for Obligation {
    fn monthly_equivalent(&self) -> f64 {
        monthly_equivalent(self.amount, self.frequency)
    }
}

impl<T: Normalized + ?Sized> Normalized for &T {
    fn monthly_equivalent(&self) -> f64 {
        (**self).monthly_equivalent()
    }
}
