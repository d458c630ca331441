//! Baseline amortization schedule generation.
//!
//! A level payment is computed once from the loan parameters and held fixed
//! for the life of the loan. Each record is rounded to cents as it is
//! produced and the rounded balance is what carries into the next month.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::time_value::{add_months, monthly_payment, monthly_rate, round_money};
use crate::types::{LoanParameters, Money, PaymentRecord, Rate, RatePct};

/// Generate the full monthly schedule for a loan.
///
/// Produces exactly `term_years * 12` records numbered from 1, dated
/// `start_date` advanced by `month - 1` calendar months. The caller
/// guarantees a term of at least one year.
pub fn generate_schedule(
    principal: Money,
    annual_rate_pct: RatePct,
    term_years: u32,
    start_date: NaiveDate,
) -> Vec<PaymentRecord> {
    let total_months = term_years * 12;
    let payment = monthly_payment(principal, annual_rate_pct, Decimal::from(term_years));
    let r = monthly_rate(annual_rate_pct);

    let mut schedule = Vec::with_capacity(total_months as usize);
    let mut balance = principal;

    for month in 1..=total_months {
        let date = add_months(start_date, month - 1);
        let record = amortize_month(balance, r, payment, Some(month), date);
        balance = record.remaining_balance;
        schedule.push(record);
    }

    schedule
}

/// Convenience wrapper over [`generate_schedule`] for a parameter set.
pub fn generate_for(loan: &LoanParameters) -> Vec<PaymentRecord> {
    generate_schedule(
        loan.principal,
        loan.annual_rate_pct,
        loan.term_years,
        loan.start_date,
    )
}

/// One regular payment against `balance` at periodic rate `r`.
///
/// The returned record's `remaining_balance` is already rounded and floored
/// at zero.
pub(crate) fn amortize_month(
    balance: Money,
    r: Rate,
    payment: Money,
    month: Option<u32>,
    date: NaiveDate,
) -> PaymentRecord {
    let interest = balance * r;
    let principal = payment - interest;
    let remaining = (balance - principal).max(Decimal::ZERO);

    PaymentRecord {
        month,
        date,
        payment: round_money(payment),
        interest: round_money(interest),
        principal: round_money(principal),
        remaining_balance: round_money(remaining),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_record_thirty_year() {
        let schedule = generate_schedule(dec!(100000), dec!(5.0), 30, date(2024, 1, 1));
        let first = &schedule[0];
        assert_eq!(first.month, Some(1));
        assert_eq!(first.date, date(2024, 1, 1));
        assert_eq!(first.interest, dec!(416.67));
        assert_eq!(first.payment, dec!(536.82));
        assert_eq!(first.principal, dec!(120.15));
        assert_eq!(first.remaining_balance, dec!(99879.85));
    }

    #[test]
    fn test_record_count_and_numbering() {
        let schedule = generate_schedule(dec!(100000), dec!(5.0), 30, date(2024, 1, 1));
        assert_eq!(schedule.len(), 360);
        for (i, rec) in schedule.iter().enumerate() {
            assert_eq!(rec.month, Some(i as u32 + 1));
        }
    }

    #[test]
    fn test_final_balance_settles() {
        let schedule = generate_schedule(dec!(100000), dec!(5.0), 30, date(2024, 1, 1));
        let last = schedule.last().unwrap();
        assert!(last.remaining_balance < dec!(1), "left {}", last.remaining_balance);
        assert_eq!(last.date, date(2053, 12, 1));
    }

    #[test]
    fn test_zero_rate_schedule() {
        let schedule = generate_schedule(dec!(12000), dec!(0), 1, date(2024, 1, 1));
        assert_eq!(schedule.len(), 12);
        for rec in &schedule {
            assert_eq!(rec.payment, dec!(1000.00));
            assert_eq!(rec.interest, Decimal::ZERO);
            assert_eq!(rec.principal, rec.payment);
        }
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_balances_non_increasing() {
        let schedule = generate_schedule(dec!(350000), dec!(7.125), 15, date(2023, 6, 15));
        let mut prev = dec!(350000);
        for rec in &schedule {
            assert!(rec.remaining_balance <= prev);
            assert!(rec.remaining_balance >= Decimal::ZERO);
            prev = rec.remaining_balance;
        }
    }

    #[test]
    fn test_payment_splits_within_rounding() {
        let schedule = generate_schedule(dec!(100000), dec!(5.0), 30, date(2024, 1, 1));
        for rec in &schedule {
            assert!((rec.payment - rec.interest - rec.principal).abs() <= dec!(0.01));
        }
    }

    #[test]
    fn test_month_end_start_date_clamps() {
        let schedule = generate_schedule(dec!(5000), dec!(3), 1, date(2024, 1, 31));
        assert_eq!(schedule[1].date, date(2024, 2, 29));
        assert_eq!(schedule[2].date, date(2024, 3, 31));
        assert_eq!(schedule[3].date, date(2024, 4, 30));
    }

    #[test]
    fn test_generate_for_matches_direct_call() {
        let loan = LoanParameters {
            principal: dec!(20000),
            annual_rate_pct: dec!(4.5),
            term_years: 5,
            start_date: date(2025, 3, 1),
        };
        assert_eq!(
            generate_for(&loan),
            generate_schedule(dec!(20000), dec!(4.5), 5, date(2025, 3, 1))
        );
    }
}
