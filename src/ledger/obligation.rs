use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::frequency::RecurrenceFrequency;
use crate::{config::EngineConfig, currency::CurrencyCode};

/// A recurring money flow: a subscription, an income entry, or a household cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Obligation {
    pub id: Uuid,
    #[serde(default)]
    pub kind: ObligationKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub currency: CurrencyCode,
    pub frequency: RecurrenceFrequency,
    pub anchor_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_next_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ObligationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_period_days: Option<u32>,
}

impl Obligation {
    pub fn new(
        label: impl Into<String>,
        amount: f64,
        frequency: RecurrenceFrequency,
        anchor_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ObligationKind::default(),
            label: label.into(),
            category: None,
            amount,
            currency: CurrencyCode::default(),
            frequency,
            anchor_date,
            explicit_next_date: None,
            end_date: None,
            status: ObligationStatus::Active,
            notice_period_days: None,
        }
    }

    /// Like [`Obligation::new`] but in the configured default currency.
    pub fn from_config(
        config: &EngineConfig,
        label: impl Into<String>,
        amount: f64,
        frequency: RecurrenceFrequency,
        anchor_date: NaiveDate,
    ) -> Self {
        Self::new(label, amount, frequency, anchor_date).with_currency(config.currency_code())
    }

    pub fn with_currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_kind(mut self, kind: ObligationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_status(mut self, status: ObligationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_next_date(mut self, next: NaiveDate) -> Self {
        self.explicit_next_date = Some(next);
        self
    }

    pub fn with_notice_period(mut self, days: u32) -> Self {
        self.notice_period_days = Some(days);
        self
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, ObligationStatus::Active)
    }
}

/// Which record collection an obligation came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    #[default]
    Subscription,
    Income,
    Household,
}

impl ObligationKind {
    /// Income counts positively toward the monthly net; everything else is an outflow.
    pub fn is_inflow(self) -> bool {
        matches!(self, ObligationKind::Income)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn currency_defaults_from_config() {
        let config = EngineConfig {
            currency: "eur".into(),
            ..EngineConfig::default()
        };
        let rent =
            Obligation::from_config(&config, "Rent", 900.0, RecurrenceFrequency::Monthly, anchor());
        assert_eq!(rent.currency.as_str(), "EUR");

        let plain = Obligation::new("Rent", 900.0, RecurrenceFrequency::Monthly, anchor());
        assert_eq!(plain.currency, CurrencyCode::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "label": "Music",
            "amount": 9.99,
            "frequency": {"kind": "monthly"},
            "anchor_date": "2024-03-01"
        }"#;
        let parsed: Obligation = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.currency.as_str(), "USD");
        assert_eq!(parsed.kind, ObligationKind::Subscription);
        assert!(parsed.is_active());
    }
}
