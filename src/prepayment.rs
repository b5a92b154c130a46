use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};

/// prepayment injection strategy feeding the schedule generator
///
/// Both construction variants (ad-hoc pairs and the capped periodic plan)
/// implement this trait so the recurrence lives in one place.
pub trait PrepaymentPolicy {
    /// prepayment to apply alongside month `month`'s regular payment, given
    /// the balance at the start of the month and the regular principal
    /// portion about to be paid
    fn amount_for(&self, month: u32, open_balance: Money, regular_principal: Money) -> Money;
}

/// baseline policy: never prepay
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrepayments;

impl PrepaymentPolicy for NoPrepayments {
    fn amount_for(&self, _month: u32, _open_balance: Money, _regular_principal: Money) -> Money {
        Money::ZERO
    }
}

/// user-specified prepayments at explicit period:amount pairs
#[derive(Debug, Clone, Default)]
pub struct AdHocPrepayments {
    amounts: BTreeMap<u32, Money>,
}

impl AdHocPrepayments {
    /// build from an already-validated mapping
    pub fn new(amounts: BTreeMap<u32, Money>) -> Result<Self> {
        for (&period, &amount) in &amounts {
            if period == 0 || !amount.is_positive() {
                return Err(ScheduleError::InvalidPrepaymentSpec {
                    message: format!("period {period} and amount {amount} must be greater than 0"),
                });
            }
        }
        Ok(Self { amounts })
    }

    /// parse a `period:amount,period:amount` spec; amounts are expressed in
    /// thousands of base units
    pub fn parse(spec: &str) -> Result<Self> {
        let mut amounts = BTreeMap::new();

        for pair in spec.split(',') {
            let pair = pair.trim();
            let (period, amount) =
                pair.split_once(':')
                    .ok_or_else(|| ScheduleError::InvalidPrepaymentSpec {
                        message: format!("missing ':' in {pair:?}"),
                    })?;

            let period: u32 =
                period
                    .trim()
                    .parse()
                    .map_err(|_| ScheduleError::InvalidPrepaymentSpec {
                        message: format!("invalid period {:?}", period.trim()),
                    })?;
            let amount = Decimal::from_str(amount.trim()).map_err(|_| {
                ScheduleError::InvalidPrepaymentSpec {
                    message: format!("invalid amount {:?}", amount.trim()),
                }
            })?;
            let amount = Money::from_thousands(amount);

            if period == 0 || !amount.is_positive() {
                return Err(ScheduleError::InvalidPrepaymentSpec {
                    message: format!("period {period} and amount {amount} must be greater than 0"),
                });
            }
            if amounts.insert(period, amount).is_some() {
                return Err(ScheduleError::InvalidPrepaymentSpec {
                    message: format!("duplicate period {period}"),
                });
            }
        }

        Ok(Self { amounts })
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn amounts(&self) -> &BTreeMap<u32, Money> {
        &self.amounts
    }
}

impl PrepaymentPolicy for AdHocPrepayments {
    fn amount_for(&self, month: u32, _open_balance: Money, _regular_principal: Money) -> Money {
        self.amounts.get(&month).copied().unwrap_or(Money::ZERO)
    }
}

impl FromStr for AdHocPrepayments {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// periodic prepayments: an annual budget split evenly across a 6 or 12
/// month cadence, capped by the balance still outstanding after the month's
/// regular principal
#[derive(Debug, Clone, Copy)]
pub struct PeriodicPrepayments {
    per_period: Money,
    frequency_months: u32,
}

impl PeriodicPrepayments {
    pub fn new(annual_limit: Money, frequency_months: u32) -> Result<Self> {
        if !annual_limit.is_positive() {
            return Err(ScheduleError::NonPositiveAnnualLimit {
                amount: annual_limit,
            });
        }
        if frequency_months != 6 && frequency_months != 12 {
            return Err(ScheduleError::InvalidFrequency {
                months: frequency_months,
            });
        }

        let periods_per_year = Decimal::from(12 / frequency_months);
        Ok(Self {
            per_period: annual_limit / periods_per_year,
            frequency_months,
        })
    }

    pub fn per_period(&self) -> Money {
        self.per_period
    }

    pub fn frequency_months(&self) -> u32 {
        self.frequency_months
    }
}

impl PrepaymentPolicy for PeriodicPrepayments {
    fn amount_for(&self, month: u32, open_balance: Money, regular_principal: Money) -> Money {
        if month == 0 || month % self.frequency_months != 0 {
            return Money::ZERO;
        }
        let headroom = (open_balance - regular_principal).max(Money::ZERO);
        self.per_period.min(headroom)
    }
}
