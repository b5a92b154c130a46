use chrono::{Datelike, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};

/// day of the month on which every installment falls due
pub const DUE_DAY: u32 = 9;

/// validated loan terms, immutable once constructed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanTerms {
    principal: Money,
    annual_rate: Rate,
    term_months: u32,
    start_date: NaiveDate,
}

impl LoanTerms {
    /// validate and freeze loan terms
    pub fn new(
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        start_date: NaiveDate,
    ) -> Result<Self> {
        if !principal.is_positive() {
            return Err(ScheduleError::NonPositivePrincipal { amount: principal });
        }
        if annual_rate.as_decimal() <= Decimal::ZERO {
            return Err(ScheduleError::NonPositiveRate { rate: annual_rate });
        }
        if term_months == 0 {
            return Err(ScheduleError::NonPositiveTerm);
        }

        Ok(Self {
            principal,
            annual_rate,
            term_months,
            start_date,
        })
    }

    /// build terms from boundary inputs: principal in thousands of base
    /// units, rate in percent, optional ISO-8601 start date defaulting to
    /// today per the supplied time provider
    pub fn from_inputs(
        principal: Decimal,
        annual_rate_percent: Decimal,
        term_months: u32,
        start_date: Option<&str>,
        time: &SafeTimeProvider,
    ) -> Result<Self> {
        let start_date = match start_date {
            Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|e| ScheduleError::InvalidDate {
                    message: format!("{s:?}: {e}"),
                })?,
            None => time.now().date_naive(),
        };

        Self::new(
            Money::from_thousands(principal),
            Rate::from_percent(annual_rate_percent),
            term_months,
            start_date,
        )
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn annual_rate(&self) -> Rate {
        self.annual_rate
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// effective monthly rate for these terms
    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate.effective_monthly()
    }

    /// due date for 1-based month `m`: the 9th of the start month advanced
    /// by m - 1 calendar months
    pub fn due_date(&self, month: u32) -> NaiveDate {
        let offset =
            self.start_date.year() * 12 + self.start_date.month0() as i32 + month as i32 - 1;
        let (year, month0) = (offset.div_euclid(12), offset.rem_euclid(12) as u32);

        // day 9 exists in every month of every year
        NaiveDate::from_ymd_opt(year, month0 + 1, DUE_DAY).expect("due day out of range")
    }
}
