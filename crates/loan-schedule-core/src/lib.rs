pub mod amortization;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "session")]
pub mod session;

pub use amortization::analysis::{build_amortization, AmortizationInput, AmortizationOutput};
pub use amortization::recalc::{recalculate_schedule, replay_updates, LoanUpdate, UpdateType};
pub use amortization::schedule::generate_schedule;
pub use error::LoanScheduleError;
pub use types::*;

/// Standard result type for all loan-schedule operations
pub type LoanScheduleResult<T> = Result<T, LoanScheduleError>;
