//! Replay of loan updates (extra principal + rate change) against a
//! baseline schedule.
//!
//! Recalculation is never incremental: every call starts from the baseline
//! and folds the complete update list in date order, so removing or editing
//! an update is just another replay.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::amortization::schedule::amortize_month;
use crate::time_value::{
    add_months, monthly_payment_for_months, monthly_rate, months_to_payoff, round_money,
};
use crate::types::{day_date, Money, PaymentRecord, RatePct};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Balance at or below which the loan is treated as paid off.
const BALANCE_EPSILON: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the schedule is re-derived after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateType {
    /// Keep the original payoff month count; recompute the payment.
    RetainTerm,
    /// Keep the payment amount; recompute the remaining term.
    RetainPayment,
}

/// A lump-sum principal payment combined with a new annual rate, both
/// effective from `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanUpdate {
    pub id: String,
    #[serde(alias = "principalPayment")]
    pub principal_payment: Money,
    /// New nominal annual rate in percent.
    #[serde(alias = "newInterestRate")]
    pub new_interest_rate: RatePct,
    #[serde(with = "day_date")]
    pub date: NaiveDate,
    #[serde(alias = "updateType")]
    pub update_type: UpdateType,
}

impl LoanUpdate {
    pub fn new(
        id: impl Into<String>,
        principal_payment: Money,
        new_interest_rate: RatePct,
        date: NaiveDate,
        update_type: UpdateType,
    ) -> Self {
        Self {
            id: id.into(),
            principal_payment,
            new_interest_rate,
            date,
            update_type,
        }
    }
}

/// Result of replaying an update list, with the ids of updates that did not
/// change the schedule the way the caller might expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recalculation {
    pub schedule: Vec<PaymentRecord>,
    /// Updates dated after the last scheduled payment.
    pub skipped: Vec<String>,
    /// `retain-payment` updates whose payment could not retire the balance
    /// and were re-amortized over the remaining original term instead.
    pub payment_fallbacks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Replay `updates` against `base` and return the resulting schedule.
///
/// `base` is returned unchanged when `updates` is empty. Updates dated after
/// the final payment are ignored.
pub fn recalculate_schedule(
    base: &[PaymentRecord],
    updates: &[LoanUpdate],
    original_rate_pct: RatePct,
    original_principal: Money,
    original_term_years: u32,
) -> Vec<PaymentRecord> {
    replay_updates(
        base,
        updates,
        original_rate_pct,
        original_principal,
        original_term_years,
    )
    .schedule
}

/// Same as [`recalculate_schedule`] but also reports skipped updates and
/// `retain-payment` fallbacks.
pub fn replay_updates(
    base: &[PaymentRecord],
    updates: &[LoanUpdate],
    original_rate_pct: RatePct,
    original_principal: Money,
    original_term_years: u32,
) -> Recalculation {
    let mut outcome = Recalculation {
        schedule: base.to_vec(),
        skipped: Vec::new(),
        payment_fallbacks: Vec::new(),
    };

    if updates.is_empty() {
        return outcome;
    }

    let original_months = original_term_years * 12;

    // Stable: same-day updates keep insertion order.
    let mut ordered: Vec<&LoanUpdate> = updates.iter().collect();
    ordered.sort_by_key(|u| u.date);

    let mut active_rate = original_rate_pct;

    for update in ordered {
        match apply_update(&outcome.schedule, update, original_principal, original_months) {
            Some(spliced) => {
                debug!(
                    update_id = %update.id,
                    from_rate = %active_rate,
                    to_rate = %update.new_interest_rate,
                    payment = %spliced.payment,
                    forward_months = spliced.forward_months,
                    "applied loan update"
                );
                active_rate = update.new_interest_rate;
                if spliced.fell_back {
                    outcome.payment_fallbacks.push(update.id.clone());
                }
                outcome.schedule = spliced.records;
            }
            None => {
                debug!(update_id = %update.id, date = %update.date, "update after final payment, skipped");
                outcome.skipped.push(update.id.clone());
            }
        }
    }

    outcome
        .schedule
        .sort_by_key(|r| (r.date, r.month.is_none()));
    outcome
}

// ---------------------------------------------------------------------------
// Splicing
// ---------------------------------------------------------------------------

struct Spliced {
    records: Vec<PaymentRecord>,
    payment: Money,
    forward_months: u32,
    fell_back: bool,
}

/// Fold a single update into `current`. Returns `None` when no regular
/// payment falls on or after the update's date.
fn apply_update(
    current: &[PaymentRecord],
    update: &LoanUpdate,
    original_principal: Money,
    original_months: u32,
) -> Option<Spliced> {
    let pivot_index = current
        .iter()
        .position(|r| r.is_regular() && r.date >= update.date)?;
    let pivot = &current[pivot_index];
    let pivot_month = pivot.month.unwrap_or(1);

    let balance_before = if pivot_index == 0 {
        original_principal
    } else {
        current[pivot_index - 1].remaining_balance
    };

    // Regular payments completed before the pivot; extra events don't count.
    let elapsed = current[..pivot_index]
        .iter()
        .filter(|r| r.is_regular())
        .count() as u32;

    let rate = update.new_interest_rate;
    let r = monthly_rate(rate);
    let regular_first = pivot.date <= update.date;

    let mut records: Vec<PaymentRecord> = current[..pivot_index].to_vec();

    let balance_after_extra = if regular_first {
        let regular = amortize_month(balance_before, r, pivot.payment, pivot.month, pivot.date);
        let extra = extra_payment(regular.remaining_balance, update.principal_payment, update.date);
        let after = extra.remaining_balance;
        records.push(regular);
        records.push(extra);
        after
    } else {
        // The pivot's regular payment is deferred and regenerated below at
        // the new payment amount.
        let extra = extra_payment(balance_before, update.principal_payment, update.date);
        let after = extra.remaining_balance;
        records.push(extra);
        after
    };

    let (payment, forward_months, fell_back) = match update.update_type {
        UpdateType::RetainTerm => {
            let remaining = original_months.saturating_sub(elapsed).max(1);
            (
                monthly_payment_for_months(balance_after_extra, rate, remaining),
                remaining,
                false,
            )
        }
        UpdateType::RetainPayment => {
            match months_to_payoff(balance_after_extra, rate, pivot.payment) {
                Some(n) => (pivot.payment, n, false),
                None => {
                    let fallback = original_months.saturating_sub(elapsed + 1).max(1);
                    debug!(
                        update_id = %update.id,
                        payment = %pivot.payment,
                        balance = %balance_after_extra,
                        fallback_months = fallback,
                        "payment cannot retire balance, re-amortizing over remaining term"
                    );
                    (
                        monthly_payment_for_months(balance_after_extra, rate, fallback),
                        fallback,
                        true,
                    )
                }
            }
        }
    };

    // A deferred pivot is regenerated first, at its own month and date.
    let anchor = pivot.date.max(update.date);
    let offset = u32::from(regular_first);
    let first_month = pivot_month + offset;

    let mut balance = balance_after_extra;
    for k in 0..forward_months {
        if balance <= BALANCE_EPSILON {
            break;
        }
        let record = amortize_month(
            balance,
            r,
            payment,
            Some(first_month + k),
            add_months(anchor, k + offset),
        );
        balance = record.remaining_balance;
        records.push(record);
    }

    Some(Spliced {
        records,
        payment,
        forward_months,
        fell_back,
    })
}

/// Unscheduled lump-sum principal reduction.
fn extra_payment(balance: Money, amount: Money, date: NaiveDate) -> PaymentRecord {
    let amount = round_money(amount);
    PaymentRecord {
        month: None,
        date,
        payment: amount,
        interest: Decimal::ZERO,
        principal: amount,
        remaining_balance: round_money((balance - amount).max(Decimal::ZERO)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::schedule::generate_schedule;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base() -> Vec<PaymentRecord> {
        generate_schedule(dec!(100000), dec!(5.0), 30, date(2024, 1, 1))
    }

    fn recalc(updates: &[LoanUpdate]) -> Vec<PaymentRecord> {
        recalculate_schedule(&base(), updates, dec!(5.0), dec!(100000), 30)
    }

    #[test]
    fn test_no_updates_returns_base() {
        assert_eq!(recalc(&[]), base());
    }

    #[test]
    fn test_update_after_final_payment_is_skipped() {
        let late = LoanUpdate::new("late", dec!(500), dec!(4), date(2060, 1, 1), UpdateType::RetainTerm);
        let outcome = replay_updates(&base(), &[late], dec!(5.0), dec!(100000), 30);
        assert_eq!(outcome.schedule, base());
        assert_eq!(outcome.skipped, vec!["late".to_string()]);
    }

    #[test]
    fn test_same_day_update_emits_regular_then_extra() {
        let update = LoanUpdate::new("u1", dec!(10000), dec!(4.5), date(2024, 12, 1), UpdateType::RetainTerm);
        let schedule = recalc(&[update]);

        let regular = &schedule[11];
        assert_eq!(regular.month, Some(12));
        assert_eq!(regular.date, date(2024, 12, 1));
        assert_eq!(regular.payment, dec!(536.82));

        let extra = &schedule[12];
        assert_eq!(extra.month, None);
        assert_eq!(extra.date, date(2024, 12, 1));
        assert_eq!(extra.payment, dec!(10000));
        assert_eq!(extra.principal, dec!(10000));
        assert_eq!(extra.interest, Decimal::ZERO);
        assert_eq!(extra.remaining_balance, regular.remaining_balance - dec!(10000));

        let next = &schedule[13];
        assert_eq!(next.month, Some(13));
        assert_eq!(next.date, date(2025, 1, 1));
    }

    #[test]
    fn test_regular_payment_uses_new_rate_split() {
        let update = LoanUpdate::new("u1", dec!(10000), dec!(4.5), date(2024, 12, 1), UpdateType::RetainTerm);
        let schedule = recalc(&[update]);
        let before = base()[10].remaining_balance;
        // interest at 4.5% / 12 on the balance after month 11
        assert_eq!(schedule[11].interest, round_money(before * dec!(0.00375)));
        assert_eq!(schedule[11].principal, dec!(536.82) - schedule[11].interest);
    }

    #[test]
    fn test_mid_period_update_defers_regular_payment() {
        // Dated between month 12 (Dec 1) and month 13 (Jan 1)
        let update = LoanUpdate::new("u1", dec!(5000), dec!(4.0), date(2024, 12, 15), UpdateType::RetainTerm);
        let schedule = recalc(&[update]);

        // Months 1..=12 untouched
        assert_eq!(schedule[..12], base()[..12]);

        let extra = &schedule[12];
        assert_eq!(extra.month, None);
        assert_eq!(extra.date, date(2024, 12, 15));
        assert_eq!(extra.remaining_balance, base()[11].remaining_balance - dec!(5000));

        // Month 13 regenerated at the pivot's own date
        let regenerated = &schedule[13];
        assert_eq!(regenerated.month, Some(13));
        assert_eq!(regenerated.date, date(2025, 1, 1));
        assert!(regenerated.payment < dec!(536.82));

        // Term retained: the forward loop covers months 13..=360
        let last = schedule.last().unwrap();
        assert_eq!(last.month, Some(360));
        assert_eq!(last.date, date(2053, 12, 1));
    }

    #[test]
    fn test_retain_payment_shortens_term() {
        let update = LoanUpdate::new("u1", dec!(10000), dec!(4.5), date(2024, 12, 1), UpdateType::RetainPayment);
        let schedule = recalc(&[update]);

        let forward: Vec<_> = schedule.iter().filter(|r| r.month.map_or(false, |m| m > 12)).collect();
        assert!(forward.iter().all(|r| r.payment == dec!(536.82)));

        let last_month = schedule.iter().filter_map(|r| r.month).max().unwrap();
        assert!(last_month < 360);
        assert!(schedule.last().unwrap().remaining_balance <= dec!(1));
    }

    #[test]
    fn test_retain_payment_fallback_when_rate_too_high() {
        // 12% on ~98k accrues ~980/month, well above the 536.82 payment
        let update = LoanUpdate::new("hike", dec!(100), dec!(12), date(2024, 12, 1), UpdateType::RetainPayment);
        let outcome = replay_updates(&base(), &[update], dec!(5.0), dec!(100000), 30);

        assert_eq!(outcome.payment_fallbacks, vec!["hike".to_string()]);
        let last_month = outcome.schedule.iter().filter_map(|r| r.month).max().unwrap();
        // fallback term = 360 - 11 - 1 months after the pivot
        assert_eq!(last_month, 12 + 348);
        assert!(outcome.schedule[13].payment > dec!(536.82));

        // The pivot keeps its old payment under the new rate, so its balance
        // rises before the extra payment is applied
        let pivot = &outcome.schedule[11];
        assert_eq!(pivot.month, Some(12));
        assert_eq!(pivot.interest, dec!(986.50));
        assert_eq!(pivot.principal, dec!(-449.68));
        assert_eq!(outcome.schedule[10].remaining_balance, dec!(98650.41));
        assert_eq!(pivot.remaining_balance, dec!(99100.09));
        assert_eq!(outcome.schedule[12].remaining_balance, dec!(99000.09));
    }

    #[test]
    fn test_updates_applied_in_date_order() {
        let later = LoanUpdate::new("b", dec!(2000), dec!(4.0), date(2026, 6, 1), UpdateType::RetainTerm);
        let earlier = LoanUpdate::new("a", dec!(3000), dec!(4.5), date(2025, 3, 1), UpdateType::RetainTerm);

        let forward = recalc(&[earlier.clone(), later.clone()]);
        let reversed = recalc(&[later, earlier]);
        assert_eq!(forward, reversed);

        let extras: Vec<_> = forward.iter().filter(|r| r.is_extra()).map(|r| r.date).collect();
        assert_eq!(extras, vec![date(2025, 3, 1), date(2026, 6, 1)]);
    }

    #[test]
    fn test_extra_payment_larger_than_balance_pays_off() {
        let update = LoanUpdate::new("payoff", dec!(200000), dec!(5.0), date(2024, 6, 1), UpdateType::RetainTerm);
        let schedule = recalc(&[update]);
        let last = schedule.last().unwrap();
        assert_eq!(last.month, None);
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert_eq!(schedule.len(), 7);
    }

    #[test]
    fn test_update_before_first_payment_uses_original_principal() {
        let update = LoanUpdate::new("early", dec!(1000), dec!(5.0), date(2023, 12, 15), UpdateType::RetainTerm);
        let schedule = recalc(&[update]);

        let extra = &schedule[0];
        assert_eq!(extra.month, None);
        assert_eq!(extra.remaining_balance, dec!(99000));

        let first = &schedule[1];
        assert_eq!(first.month, Some(1));
        assert_eq!(first.date, date(2024, 1, 1));
        assert_eq!(schedule.iter().filter(|r| r.is_regular()).count(), 360);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let updates = vec![
            LoanUpdate::new("a", dec!(3000), dec!(4.5), date(2025, 3, 1), UpdateType::RetainPayment),
            LoanUpdate::new("b", dec!(2000), dec!(6.0), date(2027, 9, 20), UpdateType::RetainTerm),
        ];
        assert_eq!(recalc(&updates), recalc(&updates));
    }

    #[test]
    fn test_update_type_serializes_kebab_case() {
        let json = serde_json::to_string(&UpdateType::RetainPayment).unwrap();
        assert_eq!(json, "\"retain-payment\"");
        let parsed: UpdateType = serde_json::from_str("\"retain-term\"").unwrap();
        assert_eq!(parsed, UpdateType::RetainTerm);
    }
}
