use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, PaymentRecord};

/// Totals over a payment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub regular_payments: u32,
    pub extra_payments: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Highest month number in the schedule (0 if there are no regular payments).
    pub final_month: u32,
    pub payoff_date: Option<NaiveDate>,
    pub final_balance: Money,
}

/// Difference between a baseline schedule and an adjusted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSavings {
    pub interest_saved: Money,
    /// Regular payments no longer needed (negative if the term grew).
    pub months_saved: i64,
}

pub fn summarize(schedule: &[PaymentRecord]) -> ScheduleSummary {
    let mut summary = ScheduleSummary {
        regular_payments: 0,
        extra_payments: 0,
        total_paid: Decimal::ZERO,
        total_interest: Decimal::ZERO,
        total_principal: Decimal::ZERO,
        final_month: 0,
        payoff_date: None,
        final_balance: Decimal::ZERO,
    };

    for rec in schedule {
        match rec.month {
            Some(m) => {
                summary.regular_payments += 1;
                summary.final_month = summary.final_month.max(m);
            }
            None => summary.extra_payments += 1,
        }
        summary.total_paid += rec.payment;
        summary.total_interest += rec.interest;
        summary.total_principal += rec.principal;
    }

    if let Some(last) = schedule.last() {
        summary.payoff_date = Some(last.date);
        summary.final_balance = last.remaining_balance;
    }

    summary
}

pub fn compare(baseline: &ScheduleSummary, adjusted: &ScheduleSummary) -> ScheduleSavings {
    ScheduleSavings {
        interest_saved: baseline.total_interest - adjusted.total_interest,
        months_saved: i64::from(baseline.regular_payments) - i64::from(adjusted.regular_payments),
    }
}
