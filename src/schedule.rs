use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::prepayment::{NoPrepayments, PrepaymentPolicy};
use crate::terms::LoanTerms;

/// constant payment under the French method:
/// P * r * (1 + r)^n / ((1 + r)^n - 1)
pub fn constant_payment(principal: Money, monthly_rate: Rate, months: u32) -> Result<Money> {
    if months == 0 {
        return Err(ScheduleError::Calculation {
            message: "payment requires at least one remaining month".to_string(),
        });
    }

    let r = monthly_rate.as_decimal();
    if r <= Decimal::ZERO {
        return Err(ScheduleError::Calculation {
            message: format!("monthly rate must be positive: {r}"),
        });
    }

    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;

    Ok(Money::from_decimal(numerator / denominator))
}

/// one row of the schedule
///
/// A month with a prepayment yields two records sharing `period_index` and
/// `due_date`: the regular installment, then the prepayment event with
/// `interest_portion` zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub period_index: u32,
    pub due_date: NaiveDate,
    pub principal_portion: Money,
    pub cumulative_principal: Money,
    pub interest_portion: Money,
    pub cumulative_interest: Money,
    pub total_paid: Money,
    pub prepayment: Money,
    pub ending_balance: Money,
}

/// aggregate metrics against the full-term no-prepayment reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub months_used: u32,
    pub months_saved: u32,
    pub interest_saved: Money,
    pub final_monthly_payment: Money,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
}

/// amortization schedule
#[derive(Debug, Clone, PartialEq)]
pub struct AmortizationSchedule {
    pub terms: LoanTerms,
    pub records: Vec<PeriodRecord>,
    pub summary: ScheduleSummary,
}

impl AmortizationSchedule {
    /// generate the schedule for `terms`, injecting prepayments from `policy`
    ///
    /// Each prepayment re-amortizes the post-prepayment balance over the
    /// months still to run, producing a new flat payment for subsequent
    /// months. The recompute deliberately sees the balance before the same
    /// month's regular principal is subtracted.
    pub fn generate(terms: &LoanTerms, policy: &dyn PrepaymentPolicy) -> Result<Self> {
        let monthly_rate = terms.monthly_rate();
        let rate = monthly_rate.as_decimal();
        let term = terms.term_months();

        let baseline_payment = constant_payment(terms.principal(), monthly_rate, term)?;
        let mut payment = baseline_payment;

        let mut balance = terms.principal();
        let mut cumulative_interest = Money::ZERO;
        let mut cumulative_principal = Money::ZERO;
        let mut records = Vec::with_capacity(term as usize);
        let mut months_used = 0;

        for month in 1..=term {
            let due_date = terms.due_date(month);
            let month_payment = payment;
            let interest = Money::from_decimal(balance.as_decimal() * rate);
            let mut principal_portion = month_payment - interest;
            let mut total_paid = month_payment;

            // never prepay past the open balance
            let prepayment = policy
                .amount_for(month, balance, principal_portion)
                .min(balance)
                .max(Money::ZERO);

            let after_prepay = balance - prepayment;
            if prepayment.is_positive() && after_prepay.is_positive() && month < term {
                payment = constant_payment(after_prepay, monthly_rate, term - month)?;
            }

            let mut ending = after_prepay - principal_portion;
            if month == term || ending.is_negative() {
                // closure rule: the last period's principal portion is
                // whatever remains, not the formula output
                principal_portion = after_prepay;
                total_paid = principal_portion + interest;
                ending = Money::ZERO;
            }

            cumulative_interest += interest;
            cumulative_principal += principal_portion;

            records.push(PeriodRecord {
                period_index: month,
                due_date,
                principal_portion,
                cumulative_principal,
                interest_portion: interest,
                cumulative_interest,
                total_paid,
                prepayment: Money::ZERO,
                ending_balance: ending + prepayment,
            });

            if prepayment.is_positive() {
                cumulative_principal += prepayment;
                records.push(PeriodRecord {
                    period_index: month,
                    due_date,
                    principal_portion: prepayment,
                    cumulative_principal,
                    interest_portion: Money::ZERO,
                    cumulative_interest,
                    total_paid: prepayment,
                    prepayment,
                    ending_balance: ending,
                });
            }

            balance = ending;
            months_used = month;
            if balance.is_zero() {
                break;
            }
        }

        let summary = ScheduleSummary {
            months_used,
            months_saved: term - months_used,
            interest_saved: baseline_payment * Decimal::from(term) - cumulative_interest,
            final_monthly_payment: payment,
            total_interest_paid: cumulative_interest,
            total_principal_paid: cumulative_principal,
        };

        Ok(Self {
            terms: *terms,
            records,
            summary,
        })
    }

    /// schedule without any prepayments
    pub fn baseline(terms: &LoanTerms) -> Result<Self> {
        Self::generate(terms, &NoPrepayments)
    }

    /// records carrying a regular installment (prepayment events excluded)
    pub fn installments(&self) -> impl Iterator<Item = &PeriodRecord> {
        self.records.iter().filter(|r| r.prepayment.is_zero())
    }

    /// total prepaid principal across the schedule
    pub fn total_prepaid(&self) -> Money {
        self.records
            .iter()
            .map(|r| r.prepayment)
            .fold(Money::ZERO, |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepayment::{AdHocPrepayments, PeriodicPrepayments};
    use rust_decimal_macros::dec;

    fn make_terms(principal: i64, rate_percent: Decimal, months: u32) -> LoanTerms {
        LoanTerms::new(
            Money::from_major(principal),
            Rate::from_percent(rate_percent),
            months,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
        .unwrap()
    }

    fn tolerance() -> Money {
        Money::from_decimal(dec!(0.0001))
    }

    #[test]
    fn test_constant_payment_known_value() {
        // 100_000 at 1% effective monthly over 12 months: ~8884.88
        let payment =
            constant_payment(Money::from_major(100_000), Rate::from_decimal(dec!(0.01)), 12)
                .unwrap();
        assert!(payment > Money::from_major(8_880));
        assert!(payment < Money::from_major(8_890));
    }

    #[test]
    fn test_constant_payment_domain_errors() {
        let r = constant_payment(Money::from_major(1_000), Rate::from_decimal(dec!(0.01)), 0);
        assert!(matches!(r, Err(ScheduleError::Calculation { .. })));

        let r = constant_payment(Money::from_major(1_000), Rate::ZERO, 12);
        assert!(matches!(r, Err(ScheduleError::Calculation { .. })));
    }

    #[test]
    fn test_baseline_principal_closure() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let schedule = AmortizationSchedule::baseline(&terms).unwrap();

        assert_eq!(schedule.records.len(), 240);

        let last = schedule.records.last().unwrap();
        assert_eq!(last.ending_balance, Money::ZERO);
        assert_eq!(last.cumulative_principal, terms.principal());
        assert_eq!(schedule.summary.total_principal_paid, terms.principal());
        assert_eq!(schedule.summary.months_saved, 0);
    }

    #[test]
    fn test_baseline_payment_is_flat() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let schedule = AmortizationSchedule::baseline(&terms).unwrap();

        let payment = schedule.records[0].total_paid;
        for record in &schedule.records[..239] {
            assert_eq!(record.total_paid, payment);
        }
        // last installment absorbs the rounding residue
        let last = schedule.records.last().unwrap();
        assert!((last.total_paid - payment).abs() < tolerance());
    }

    #[test]
    fn test_balance_invariant_every_record() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let prepayments = AdHocPrepayments::parse("12:10,60:5").unwrap();
        let schedule = AmortizationSchedule::generate(&terms, &prepayments).unwrap();

        for record in &schedule.records {
            assert_eq!(
                record.cumulative_principal + record.ending_balance,
                terms.principal(),
                "invariant broken at period {}",
                record.period_index
            );
        }
    }

    #[test]
    fn test_balance_monotone_and_interest_non_increasing() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let schedule = AmortizationSchedule::baseline(&terms).unwrap();

        for pair in schedule.records.windows(2) {
            assert!(pair[1].ending_balance <= pair[0].ending_balance);
            assert!(pair[1].interest_portion <= pair[0].interest_portion);
        }
    }

    #[test]
    fn test_totals_identity() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let prepayments = AdHocPrepayments::parse("12:10").unwrap();
        let schedule = AmortizationSchedule::generate(&terms, &prepayments).unwrap();

        let installment_total = schedule
            .installments()
            .map(|r| r.total_paid)
            .fold(Money::ZERO, |acc, x| acc + x);
        let prepaid = schedule.total_prepaid();

        assert_eq!(
            schedule.summary.total_interest_paid + schedule.summary.total_principal_paid,
            installment_total + prepaid
        );
    }

    #[test]
    fn test_idempotence() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let prepayments = AdHocPrepayments::parse("12:10").unwrap();

        let a = AmortizationSchedule::generate(&terms, &prepayments).unwrap();
        let b = AmortizationSchedule::generate(&terms, &prepayments).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_ad_hoc_prepayment_saves_interest_and_term() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let baseline = AmortizationSchedule::baseline(&terms).unwrap();

        let prepayments = AdHocPrepayments::parse("12:10").unwrap();
        let prepaid = AmortizationSchedule::generate(&terms, &prepayments).unwrap();

        assert!(prepaid.summary.months_saved > 0);
        assert!(prepaid.summary.total_interest_paid < baseline.summary.total_interest_paid);
        assert!(prepaid.summary.interest_saved > baseline.summary.interest_saved);
        // re-amortization lowers the flat payment
        assert!(prepaid.summary.final_monthly_payment < baseline.summary.final_monthly_payment);
        assert_eq!(prepaid.total_prepaid(), Money::from_major(10_000));
    }

    #[test]
    fn test_prepayment_month_emits_split_records() {
        let terms = make_terms(120_000, dec!(4.5), 240);
        let prepayments = AdHocPrepayments::parse("12:10").unwrap();
        let schedule = AmortizationSchedule::generate(&terms, &prepayments).unwrap();

        let month_12: Vec<_> = schedule
            .records
            .iter()
            .filter(|r| r.period_index == 12)
            .collect();
        assert_eq!(month_12.len(), 2);
        assert_eq!(month_12[0].due_date, month_12[1].due_date);

        let regular = month_12[0];
        assert_eq!(regular.prepayment, Money::ZERO);
        assert!(regular.interest_portion.is_positive());

        let event = month_12[1];
        assert_eq!(event.prepayment, Money::from_major(10_000));
        assert_eq!(event.principal_portion, Money::from_major(10_000));
        assert_eq!(event.interest_portion, Money::ZERO);
        assert_eq!(event.total_paid, Money::from_major(10_000));
        assert_eq!(
            regular.ending_balance - event.prepayment,
            event.ending_balance
        );
    }

    #[test]
    fn test_prepayment_larger_than_balance_is_clamped() {
        let terms = make_terms(10_000, dec!(4.5), 24);
        let prepayments = AdHocPrepayments::parse("2:50").unwrap(); // 50_000 against a 10_000 loan
        let schedule = AmortizationSchedule::generate(&terms, &prepayments).unwrap();

        let last = schedule.records.last().unwrap();
        assert_eq!(last.period_index, 2);
        assert_eq!(last.ending_balance, Money::ZERO);
        assert!(schedule.total_prepaid() < Money::from_major(50_000));
        assert_eq!(
            schedule.summary.total_principal_paid,
            terms.principal()
        );
    }

    #[test]
    fn test_periodic_cap_per_window_and_exhaustion() {
        let terms = make_terms(60_000, dec!(3), 120);
        let policy = PeriodicPrepayments::new(Money::from_major(5_000), 12).unwrap();
        let schedule = AmortizationSchedule::generate(&terms, &policy).unwrap();

        // no single 12-month window prepays more than the annual limit
        let windows = terms.term_months().div_ceil(12);
        for window in 0..windows {
            let lo = window * 12 + 1;
            let hi = lo + 11;
            let prepaid = schedule
                .records
                .iter()
                .filter(|r| r.period_index >= lo && r.period_index <= hi)
                .map(|r| r.prepayment)
                .fold(Money::ZERO, |acc, x| acc + x);
            assert!(prepaid <= Money::from_major(5_000));
        }

        // prepayments stop once the balance is exhausted
        assert!(schedule.total_prepaid() < terms.principal());
        assert!(schedule.summary.months_saved > 0);
        assert_eq!(
            schedule.records.last().unwrap().ending_balance,
            Money::ZERO
        );
        assert_eq!(schedule.summary.total_principal_paid, terms.principal());
    }

    #[test]
    fn test_single_month_boundary() {
        let terms = make_terms(1_000, dec!(12), 1);
        let schedule = AmortizationSchedule::baseline(&terms).unwrap();

        assert_eq!(schedule.records.len(), 1);

        let record = &schedule.records[0];
        assert_eq!(record.ending_balance, Money::ZERO);
        assert_eq!(record.principal_portion, terms.principal());

        // total paid is principal * (1 + monthly rate)
        let expected = Money::from_decimal(
            terms.principal().as_decimal()
                * (Decimal::ONE + terms.monthly_rate().as_decimal()),
        );
        assert!((record.total_paid - expected).abs() < tolerance());
    }

    #[test]
    fn test_early_stop_before_term() {
        // heavy semiannual prepayments finish the loan well before month 120
        let terms = make_terms(60_000, dec!(3), 120);
        let policy = PeriodicPrepayments::new(Money::from_major(10_000), 6).unwrap();
        let schedule = AmortizationSchedule::generate(&terms, &policy).unwrap();

        assert!(schedule.summary.months_used < 120);
        assert_eq!(
            schedule.summary.months_used + schedule.summary.months_saved,
            120
        );
    }
}
