use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("principal must be greater than zero: {amount}")]
    NonPositivePrincipal {
        amount: Money,
    },

    #[error("annual rate must be greater than zero: {rate}")]
    NonPositiveRate {
        rate: Rate,
    },

    #[error("term must be at least one month")]
    NonPositiveTerm,

    #[error("invalid start date: {message}, use YYYY-MM-DD")]
    InvalidDate {
        message: String,
    },

    #[error("invalid prepayment spec: {message}, use 'period:amount,period:amount'")]
    InvalidPrepaymentSpec {
        message: String,
    },

    #[error("prepayment frequency must be 6 or 12 months: {months}")]
    InvalidFrequency {
        months: u32,
    },

    #[error("annual prepayment limit must be greater than zero: {amount}")]
    NonPositiveAnnualLimit {
        amount: Money,
    },

    #[error("calculation error: {message}")]
    Calculation {
        message: String,
    },

    #[error("export failed: {message}")]
    Export {
        message: String,
    },

    #[error("chart rendering failed: {message}")]
    Chart {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
