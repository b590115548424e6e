#![allow(dead_code)]

use chrono::NaiveDate;
use outlay_core::ledger::{Member, Obligation, ObligationKind, RecurrenceFrequency};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn all_frequencies() -> Vec<RecurrenceFrequency> {
    vec![
        RecurrenceFrequency::Monthly,
        RecurrenceFrequency::Yearly,
        RecurrenceFrequency::FourWeekly,
        RecurrenceFrequency::Weekly,
        RecurrenceFrequency::Biweekly,
        RecurrenceFrequency::custom_months(3),
        RecurrenceFrequency::custom_months(0),
        RecurrenceFrequency::OneTime,
    ]
}

/// A small household budget used by the dashboard flow tests.
pub fn sample_obligations() -> Vec<Obligation> {
    vec![
        Obligation::new("Salary", 3200.0, RecurrenceFrequency::Monthly, date(2023, 9, 25))
            .with_kind(ObligationKind::Income)
            .with_category("work"),
        Obligation::new("Music", 11.99, RecurrenceFrequency::Monthly, date(2024, 2, 3))
            .with_category("media")
            .with_notice_period(3),
        Obligation::new("Cloud storage", 99.0, RecurrenceFrequency::Yearly, date(2023, 11, 12))
            .with_category("tools"),
        Obligation::new("Cleaner", 45.0, RecurrenceFrequency::Biweekly, date(2024, 1, 5))
            .with_kind(ObligationKind::Household)
            .with_category("home"),
    ]
}

pub fn household() -> Vec<Member> {
    vec![
        Member::resident("Ana"),
        Member::resident("Ben"),
        Member::resident("Cleo"),
    ]
}
