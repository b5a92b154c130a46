pub mod chart;
pub mod decimal;
pub mod errors;
pub mod export;
pub mod prepayment;
pub mod schedule;
pub mod terms;

// re-export key types
pub use decimal::{Money, Rate, DISPLAY_DP, DISPLAY_SCALE};
pub use errors::{Result, ScheduleError};
pub use prepayment::{AdHocPrepayments, NoPrepayments, PeriodicPrepayments, PrepaymentPolicy};
pub use schedule::{
    constant_payment, AmortizationSchedule, PeriodRecord, ScheduleSummary,
};
pub use terms::{LoanTerms, DUE_DAY};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
