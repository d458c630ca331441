use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{Money, Rate, RatePct};

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a nominal annual percentage rate into the monthly periodic rate.
pub fn monthly_rate(annual_rate_pct: RatePct) -> Rate {
    annual_rate_pct / MONTHS_PER_YEAR / PERCENT
}

/// Level monthly payment that amortizes `principal` over `term_years`.
///
/// The caller guarantees `term_years * 12 > 0`. A fractional month count is
/// accepted and discounted with a fractional exponent.
pub fn monthly_payment(principal: Money, annual_rate_pct: RatePct, term_years: Decimal) -> Money {
    let total_months = term_years * MONTHS_PER_YEAR;
    let r = monthly_rate(annual_rate_pct);

    if r.is_zero() {
        return principal / total_months;
    }

    let growth = if total_months.fract().is_zero() {
        total_months
            .to_u64()
            .and_then(|n| (Decimal::ONE + r).checked_powu(n))
    } else {
        (Decimal::ONE + r).checked_powd(total_months)
    };

    annuity_payment(principal, r, growth)
}

/// Level monthly payment that amortizes `principal` over a whole number of
/// months. `months` must be greater than zero.
pub fn monthly_payment_for_months(principal: Money, annual_rate_pct: RatePct, months: u32) -> Money {
    let r = monthly_rate(annual_rate_pct);

    if r.is_zero() {
        return principal / Decimal::from(months);
    }

    let growth = (Decimal::ONE + r).checked_powu(u64::from(months));
    annuity_payment(principal, r, growth)
}

/// `P * r * g / (g - 1)` with `g = (1+r)^n`. When `g` overflows the payment
/// converges on the interest-only amount; an interest-only amount that does
/// not fit saturates at `Decimal::MAX`.
fn annuity_payment(principal: Money, r: Rate, growth: Option<Decimal>) -> Money {
    let interest_only = principal.checked_mul(r);
    let level = growth
        .filter(|g| *g > Decimal::ONE)
        .and_then(|g| g.checked_div(g - Decimal::ONE))
        .and_then(|factor| interest_only?.checked_mul(factor));
    level.or(interest_only).unwrap_or(Decimal::MAX)
}

/// Number of level payments of `payment` needed to retire `balance`.
///
/// Closed form `n = ceil(-ln(1 - B*r/P) / ln(1+r))`, or `ceil(B/P)` at a zero
/// rate. Returns `None` when the payment does not cover the accruing interest
/// or the logarithm is out of domain.
pub fn months_to_payoff(balance: Money, annual_rate_pct: RatePct, payment: Money) -> Option<u32> {
    if payment <= Decimal::ZERO {
        return None;
    }
    if balance <= Decimal::ZERO {
        return Some(0);
    }

    let r = monthly_rate(annual_rate_pct);

    if r.is_zero() {
        return (balance / payment).ceil().to_u32();
    }

    if payment <= balance * r {
        return None;
    }

    let remaining_fraction = Decimal::ONE - balance * r / payment;
    let numerator = remaining_fraction.checked_ln()?;
    let denominator = (Decimal::ONE + r).checked_ln()?;
    if denominator.is_zero() {
        return None;
    }

    (-numerator / denominator).ceil().to_u32()
}

/// Advance `date` by whole calendar months, clamping to the last day of
/// shorter months (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
