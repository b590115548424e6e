//! Currency labels and minor-unit arithmetic.
//!
//! Currencies are opaque labels; nothing here converts between them. Amounts
//! that must reconcile exactly (split shares) are handled as integer minor
//! units through [`MinorUnits`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Currency label as supplied by the host (typically an ISO 4217 code).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scale between major amounts (`12.34`) and integer minor units (`1234`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinorUnits {
    digits: u8,
}

impl Default for MinorUnits {
    fn default() -> Self {
        Self { digits: 2 }
    }
}

impl MinorUnits {
    pub fn new(digits: u8) -> Self {
        Self {
            digits: digits.min(9),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.minor_unit_digits)
    }

    /// Number of minor units in one major unit.
    pub fn factor(&self) -> i64 {
        10_i64.pow(self.digits as u32)
    }

    /// Rounds half away from zero to the nearest minor unit.
    pub fn to_minor(&self, amount: f64) -> i64 {
        (amount * self.factor() as f64).round() as i64
    }

    pub fn to_major(&self, minor: i64) -> f64 {
        minor as f64 / self.factor() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_code_is_uppercased() {
        assert_eq!(CurrencyCode::new("eur").as_str(), "EUR");
        assert_eq!(CurrencyCode::default().to_string(), "USD");
        assert_eq!(serde_json::to_string(&CurrencyCode::new("gbp")).unwrap(), r#""GBP""#);
    }

    #[test]
    fn minor_unit_round_trip() {
        let cents = MinorUnits::default();
        assert_eq!(cents.to_minor(100.0), 10_000);
        assert_eq!(cents.to_minor(0.125), 13);
        assert_eq!(cents.to_minor(-0.125), -13);
        assert_eq!(cents.to_major(3333), 33.33);
        assert_eq!(MinorUnits::new(0).to_minor(12.6), 13);
        assert_eq!(MinorUnits::new(3).factor(), 1000);
    }
}
