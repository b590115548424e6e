use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    calendar::{add_days, months_between, within_days},
    frequency::{RecurrenceFrequency, Step},
    obligation::{Obligation, ObligationStatus},
};
use crate::{config::EngineConfig, currency::CurrencyCode};

const DEFAULT_ADVANCE_GUARD: usize = 1024;
const PENDING_WINDOW_DAYS: i64 = 7;
const UPCOMING_HORIZON_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledStatus {
    Overdue,
    Pending,
    Future,
}

impl ScheduledStatus {
    fn classify(scheduled: NaiveDate, reference: NaiveDate, pending_days: i64) -> ScheduledStatus {
        if scheduled < reference {
            return ScheduledStatus::Overdue;
        }
        if within_days(scheduled, pending_days, reference) {
            ScheduledStatus::Pending
        } else {
            ScheduledStatus::Future
        }
    }
}

/// One entry of the upcoming-payments list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingPayment {
    pub obligation_id: Uuid,
    pub label: String,
    pub due_date: NaiveDate,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub status: ScheduledStatus,
    /// Last day to cancel before the charge, when a notice period is known.
    pub cancel_by: Option<NaiveDate>,
}

/// Resolves obligations into concrete occurrence dates.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceResolver {
    guard: usize,
    pending_window_days: i64,
    horizon_days: i64,
}

impl Default for RecurrenceResolver {
    fn default() -> Self {
        Self {
            guard: DEFAULT_ADVANCE_GUARD,
            pending_window_days: PENDING_WINDOW_DAYS,
            horizon_days: UPCOMING_HORIZON_DAYS,
        }
    }
}

impl RecurrenceResolver {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            guard: config.effective_recurrence_guard(),
            pending_window_days: config.pending_window_days,
            horizon_days: config.upcoming_horizon_days,
        }
    }

    pub fn guard(&self) -> usize {
        self.guard
    }

    /// Next occurrence on or after `reference`. An explicit next date always wins.
    pub fn next_occurrence(&self, obligation: &Obligation, reference: NaiveDate) -> NaiveDate {
        if let Some(explicit) = obligation.explicit_next_date {
            return explicit;
        }
        let (_, candidate) =
            self.first_on_or_after(obligation.frequency, obligation.anchor_date, reference);
        candidate
    }

    /// Latest date the holder can act on to avoid the next charge.
    pub fn cancel_by_date(
        &self,
        obligation: &Obligation,
        notice_period_days: u32,
        reference: NaiveDate,
    ) -> NaiveDate {
        let next = self.next_occurrence(obligation, reference);
        add_days(next, -(notice_period_days as i64))
    }

    /// Scheduled dates inside `[start, end]`, following the anchor schedule and
    /// stopping at the obligation's end date.
    pub fn occurrences_between(
        &self,
        obligation: &Obligation,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<NaiveDate> {
        let limit = match obligation.end_date {
            Some(end_date) => end.min(end_date),
            None => end,
        };
        let frequency = obligation.frequency;
        if frequency.is_one_time() {
            let anchor = obligation.anchor_date;
            return if anchor >= start && anchor <= limit {
                vec![anchor]
            } else {
                Vec::new()
            };
        }

        let (mut step, mut candidate) =
            self.first_on_or_after(frequency, obligation.anchor_date, start);
        let mut dates = Vec::new();
        while candidate <= limit && dates.len() < self.guard {
            dates.push(candidate);
            step += 1;
            let next = frequency.shift(obligation.anchor_date, step);
            if next <= candidate {
                break;
            }
            candidate = next;
        }
        dates
    }

    /// [`Self::upcoming_payments`] over the configured horizon.
    pub fn upcoming(
        &self,
        obligations: &[Obligation],
        reference: NaiveDate,
    ) -> Vec<UpcomingPayment> {
        self.upcoming_payments(obligations, reference, self.horizon_days)
    }

    /// Active obligations due within `horizon_days` of `reference`, soonest first.
    /// Paused and cancelled obligations never appear here.
    pub fn upcoming_payments(
        &self,
        obligations: &[Obligation],
        reference: NaiveDate,
        horizon_days: i64,
    ) -> Vec<UpcomingPayment> {
        let horizon_end = add_days(reference, horizon_days);
        let mut upcoming: Vec<UpcomingPayment> = obligations
            .iter()
            .filter(|obligation| obligation.is_active())
            .filter_map(|obligation| {
                let due_date = self.next_occurrence(obligation, reference);
                if due_date > horizon_end {
                    return None;
                }
                if obligation.end_date.is_some_and(|end| due_date > end) {
                    return None;
                }
                Some(UpcomingPayment {
                    obligation_id: obligation.id,
                    label: obligation.label.clone(),
                    due_date,
                    amount: obligation.amount,
                    currency: obligation.currency.clone(),
                    status: ScheduledStatus::classify(
                        due_date,
                        reference,
                        self.pending_window_days,
                    ),
                    cancel_by: obligation
                        .notice_period_days
                        .map(|days| add_days(due_date, -(days as i64))),
                })
            })
            .collect();
        upcoming.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.label.cmp(&b.label))
        });
        debug!(
            count = upcoming.len(),
            %reference,
            horizon_days,
            "resolved upcoming payments"
        );
        upcoming
    }

    /// Returns the step index and date of the first scheduled occurrence on or
    /// after `reference`. Gives up after `guard` advances and returns the last
    /// candidate reached.
    fn first_on_or_after(
        &self,
        frequency: RecurrenceFrequency,
        anchor: NaiveDate,
        reference: NaiveDate,
    ) -> (i64, NaiveDate) {
        if reference <= anchor || frequency.is_one_time() {
            return (0, anchor);
        }
        let mut step = estimate_steps(frequency, anchor, reference);
        let mut candidate = frequency.shift(anchor, step);
        let mut advances = 0usize;
        while candidate < reference {
            if advances >= self.guard {
                warn!(
                    %anchor,
                    %reference,
                    guard = self.guard,
                    "recurrence advance guard exhausted; returning last candidate"
                );
                break;
            }
            let next = frequency.shift(anchor, step + 1);
            if next <= candidate {
                warn!(%anchor, %candidate, "recurrence stopped advancing");
                break;
            }
            step += 1;
            candidate = next;
            advances += 1;
        }
        (step, candidate)
    }
}

/// A step count that is guaranteed to land strictly before `reference`, so the
/// advance loop only walks the last few periods.
fn estimate_steps(frequency: RecurrenceFrequency, anchor: NaiveDate, reference: NaiveDate) -> i64 {
    let estimate = match frequency.step() {
        Step::Days(days) if days > 0 => (reference - anchor).num_days() / days,
        Step::Months(months) if months > 0 => months_between(anchor, reference) / months as i64,
        _ => 0,
    };
    (estimate - 1).max(0)
}

pub fn next_occurrence(obligation: &Obligation, reference: NaiveDate) -> NaiveDate {
    RecurrenceResolver::default().next_occurrence(obligation, reference)
}

pub fn cancel_by_date(
    obligation: &Obligation,
    notice_period_days: u32,
    reference: NaiveDate,
) -> NaiveDate {
    RecurrenceResolver::default().cancel_by_date(obligation, notice_period_days, reference)
}

/// Whether the obligation contributes to the period `[period_start, period_end]`.
pub fn is_visible_in_period(
    obligation: &Obligation,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> bool {
    let status_visible = matches!(
        obligation.status,
        ObligationStatus::Active | ObligationStatus::Paused
    );
    status_visible
        && obligation.anchor_date <= period_end
        && obligation.end_date.map_or(true, |end| end >= period_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(anchor: NaiveDate) -> Obligation {
        Obligation::new("Streaming", 12.99, RecurrenceFrequency::Monthly, anchor)
    }

    #[test]
    fn monthly_advances_to_reference_month() {
        let obligation = monthly(date(2024, 1, 15));
        assert_eq!(
            next_occurrence(&obligation, date(2024, 6, 1)),
            date(2024, 6, 15)
        );
        assert_eq!(
            next_occurrence(&obligation, date(2024, 6, 15)),
            date(2024, 6, 15)
        );
        assert_eq!(
            next_occurrence(&obligation, date(2024, 6, 16)),
            date(2024, 7, 15)
        );
    }

    #[test]
    fn anchor_in_future_is_returned() {
        let obligation = monthly(date(2025, 3, 1));
        assert_eq!(
            next_occurrence(&obligation, date(2024, 6, 1)),
            date(2025, 3, 1)
        );
    }

    #[test]
    fn explicit_override_wins() {
        let obligation = monthly(date(2024, 1, 15)).with_next_date(date(2024, 2, 3));
        assert_eq!(
            next_occurrence(&obligation, date(2024, 6, 1)),
            date(2024, 2, 3)
        );
    }

    #[test]
    fn one_time_ignores_reference() {
        let obligation = Obligation::new(
            "Setup fee",
            49.0,
            RecurrenceFrequency::OneTime,
            date(2024, 1, 10),
        );
        assert_eq!(
            next_occurrence(&obligation, date(2030, 1, 1)),
            date(2024, 1, 10)
        );
    }

    #[test]
    fn day_based_frequencies() {
        let anchor = date(2024, 1, 1);
        let weekly = Obligation::new("Cleaner", 40.0, RecurrenceFrequency::Weekly, anchor);
        assert_eq!(next_occurrence(&weekly, date(2024, 1, 9)), date(2024, 1, 15));

        let four_weekly = Obligation::new("Rent", 900.0, RecurrenceFrequency::FourWeekly, anchor);
        assert_eq!(
            next_occurrence(&four_weekly, date(2024, 1, 30)),
            date(2024, 2, 26)
        );
    }

    #[test]
    fn month_end_anchor_does_not_drift() {
        let obligation = monthly(date(2024, 1, 31));
        assert_eq!(
            next_occurrence(&obligation, date(2024, 3, 1)),
            date(2024, 3, 31)
        );
    }

    #[test]
    fn long_running_weekly_obligation_still_resolves() {
        let obligation = Obligation::new(
            "Newspaper",
            3.0,
            RecurrenceFrequency::Weekly,
            date(1990, 1, 1),
        );
        let next = next_occurrence(&obligation, date(2024, 6, 1));
        assert!(next >= date(2024, 6, 1));
        assert!(next < date(2024, 6, 8));
    }

    #[test]
    fn cancel_by_subtracts_notice_period() {
        let obligation = monthly(date(2024, 1, 15));
        assert_eq!(
            cancel_by_date(&obligation, 14, date(2024, 6, 1)),
            date(2024, 6, 1)
        );
    }

    #[test]
    fn visibility_rules() {
        let start = date(2024, 6, 1);
        let end = date(2024, 6, 30);
        let active = monthly(date(2024, 1, 15));
        assert!(is_visible_in_period(&active, start, end));

        let paused = monthly(date(2024, 1, 15)).with_status(ObligationStatus::Paused);
        assert!(is_visible_in_period(&paused, start, end));

        let cancelled = monthly(date(2024, 1, 15)).with_status(ObligationStatus::Cancelled);
        assert!(!is_visible_in_period(&cancelled, start, end));

        let later = monthly(date(2024, 7, 1));
        assert!(!is_visible_in_period(&later, start, end));

        let ended = monthly(date(2024, 1, 15)).with_end_date(date(2024, 5, 31));
        assert!(!is_visible_in_period(&ended, start, end));

        let ends_on_start = monthly(date(2024, 1, 15)).with_end_date(start);
        assert!(is_visible_in_period(&ends_on_start, start, end));
    }

    #[test]
    fn occurrences_between_respects_window_and_end_date() {
        let resolver = RecurrenceResolver::default();
        let obligation = Obligation::new(
            "Gym",
            20.0,
            RecurrenceFrequency::Biweekly,
            date(2024, 1, 1),
        )
        .with_end_date(date(2024, 2, 10));
        let dates = resolver.occurrences_between(&obligation, date(2024, 1, 10), date(2024, 3, 1));
        assert_eq!(dates, vec![date(2024, 1, 15), date(2024, 1, 29)]);
    }

    #[test]
    fn upcoming_excludes_paused_and_classifies() {
        let resolver = RecurrenceResolver::default();
        let reference = date(2024, 6, 1);
        let soon = monthly(date(2024, 1, 3)).with_notice_period(2);
        let later = Obligation::new(
            "Insurance",
            300.0,
            RecurrenceFrequency::Yearly,
            date(2023, 6, 20),
        );
        let paused = monthly(date(2024, 1, 2)).with_status(ObligationStatus::Paused);
        let far = Obligation::new(
            "Domain",
            15.0,
            RecurrenceFrequency::Yearly,
            date(2023, 12, 1),
        );

        let upcoming = resolver.upcoming_payments(&[later, paused, soon, far], reference, 30);
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].due_date, date(2024, 6, 3));
        assert_eq!(upcoming[0].status, ScheduledStatus::Pending);
        assert_eq!(upcoming[0].cancel_by, Some(date(2024, 6, 1)));
        assert_eq!(upcoming[1].due_date, date(2024, 6, 20));
        assert_eq!(upcoming[1].status, ScheduledStatus::Future);
        assert_eq!(upcoming[1].cancel_by, None);
    }

    #[test]
    fn upcoming_uses_configured_horizon() {
        let config = EngineConfig {
            upcoming_horizon_days: 10,
            ..EngineConfig::default()
        };
        let reference = date(2024, 6, 1);
        let near = monthly(date(2024, 1, 8));
        let outside = monthly(date(2024, 1, 20));
        let upcoming =
            RecurrenceResolver::from_config(&config).upcoming(&[near, outside], reference);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].due_date, date(2024, 6, 8));
        assert_eq!(upcoming[0].currency.as_str(), "USD");
    }

    #[test]
    fn exhausted_guard_returns_last_candidate() {
        let resolver = RecurrenceResolver {
            guard: 0,
            ..RecurrenceResolver::default()
        };
        let obligation = monthly(date(2024, 1, 15));
        // the jump lands one period short and no advance is allowed
        assert_eq!(
            resolver.next_occurrence(&obligation, date(2024, 6, 20)),
            date(2024, 5, 15)
        );
        let weekly = resolver.first_on_or_after(
            RecurrenceFrequency::Weekly,
            date(2024, 1, 1),
            date(2024, 3, 4),
        );
        assert_eq!(weekly, (8, date(2024, 2, 26)));
    }

    #[test]
    fn two_advances_always_reach_the_reference() {
        let resolver = RecurrenceResolver {
            guard: 2,
            ..RecurrenceResolver::default()
        };
        let frequencies = [
            RecurrenceFrequency::Monthly,
            RecurrenceFrequency::Yearly,
            RecurrenceFrequency::FourWeekly,
            RecurrenceFrequency::Weekly,
            RecurrenceFrequency::Biweekly,
            RecurrenceFrequency::custom_months(5),
        ];
        let anchors = [date(1970, 1, 31), date(2020, 2, 29), date(2023, 8, 15)];
        for frequency in frequencies {
            for anchor in anchors {
                for offset in (0..1500).step_by(7) {
                    let reference = add_days(date(2024, 1, 1), offset);
                    let (_, next) = resolver.first_on_or_after(frequency, anchor, reference);
                    assert!(next >= reference, "{frequency} from {anchor} at {reference}");
                }
            }
        }
    }
}
