#![doc(test(attr(deny(warnings))))]

//! Outlay Core turns recurring subscriptions, income and household costs into
//! calendar occurrences, comparable monthly figures, per-member cost splits
//! and compound-interest projections. Every operation is a pure function of
//! the snapshot it receives.

pub mod config;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod reports;
pub mod simulation;
pub mod utils;

pub use errors::{EngineError, Result};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Outlay Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
