//! Obligation models, calendar math, recurrence resolution, normalization,
//! versioned household costs, and cost splitting.

pub mod calendar;
pub mod frequency;
pub mod household;
pub mod normalize;
pub mod obligation;
pub mod recurring;
pub mod split;
pub mod versioning;

pub use frequency::{RecurrenceFrequency, Step};
pub use household::{HouseholdCost, OccurrenceAllocation};
pub use normalize::{monthly_equivalent, yearly_equivalent, Normalized};
pub use obligation::{Obligation, ObligationKind, ObligationStatus};
pub use recurring::{
    cancel_by_date, is_visible_in_period, next_occurrence, RecurrenceResolver, ScheduledStatus,
    UpcomingPayment,
};
pub use split::{
    Member, PayerKind, SplitAllocation, SplitAllocator, SplitPolicy, SplitShare,
    HOUSEHOLD_PAYER_ID,
};
pub use versioning::{ChainViolation, CostTerms, CostVersion, VersionChain};
