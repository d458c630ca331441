use std::collections::HashSet;
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::recalc::{replay_updates, LoanUpdate};
use crate::amortization::schedule::generate_for;
use crate::amortization::summary::{compare, summarize, ScheduleSavings, ScheduleSummary};
use crate::time_value::{monthly_payment, round_money};
use crate::types::{with_metadata, ComputationOutput, LoanParameters, Money, PaymentRecord, RatePct};
use crate::{LoanScheduleError, LoanScheduleResult};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

const MAX_PRINCIPAL: Decimal = dec!(1_000_000_000);
const MAX_RATE_PCT: Decimal = dec!(100);
const MAX_TERM_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub loan: LoanParameters,
    /// Updates in insertion order; they are replayed in date order.
    #[serde(default)]
    pub updates: Vec<LoanUpdate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Level payment of the original loan, rounded to cents.
    pub monthly_payment: Money,
    pub schedule: Vec<PaymentRecord>,
    pub summary: ScheduleSummary,
    pub baseline_summary: ScheduleSummary,
    /// Present when at least one update was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<ScheduleSavings>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate a loan and its updates, build the baseline schedule, replay the
/// updates over it and summarize both.
pub fn build_amortization(
    input: &AmortizationInput,
) -> LoanScheduleResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_loan(&input.loan)?;
    validate_updates(&input.updates)?;

    let loan = &input.loan;
    let payment = monthly_payment(
        loan.principal,
        loan.annual_rate_pct,
        Decimal::from(loan.term_years),
    );

    let baseline = generate_for(loan);
    let baseline_summary = summarize(&baseline);

    let replay = replay_updates(
        &baseline,
        &input.updates,
        loan.annual_rate_pct,
        loan.principal,
        loan.term_years,
    );

    for id in &replay.skipped {
        warnings.push(format!(
            "Update '{id}' is dated after the final payment and was ignored"
        ));
    }
    for id in &replay.payment_fallbacks {
        warnings.push(format!(
            "Update '{id}': payment does not cover interest at the new rate; \
             re-amortized over the remaining original term"
        ));
    }

    let summary = summarize(&replay.schedule);
    let savings = if input.updates.is_empty() {
        None
    } else {
        Some(compare(&baseline_summary, &summary))
    };

    let output = AmortizationOutput {
        monthly_payment: round_money(payment),
        schedule: replay.schedule,
        summary,
        baseline_summary,
        savings,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "compounding": "monthly",
        "rounding": "half away from zero, 2 dp, per record",
        "updates_supplied": input.updates.len(),
        "updates_skipped": replay.skipped.len(),
    });

    Ok(with_metadata(
        "Level-payment amortization with replayed loan updates",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_loan(loan: &LoanParameters) -> LoanScheduleResult<()> {
    validate_principal(loan.principal)?;
    validate_rate("annual_rate_pct", loan.annual_rate_pct)?;
    if loan.term_years == 0 || loan.term_years > MAX_TERM_YEARS {
        return Err(LoanScheduleError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Term must be between 1 and {MAX_TERM_YEARS} years"),
        });
    }
    Ok(())
}

/// Limits for a standalone payment quote, where the term may be fractional.
pub fn validate_payment_terms(
    principal: Money,
    annual_rate_pct: RatePct,
    term_years: Decimal,
) -> LoanScheduleResult<()> {
    validate_principal(principal)?;
    validate_rate("annual_rate_pct", annual_rate_pct)?;
    if term_years <= Decimal::ZERO || term_years > Decimal::from(MAX_TERM_YEARS) {
        return Err(LoanScheduleError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Term must be positive and at most {MAX_TERM_YEARS} years"),
        });
    }
    Ok(())
}

fn validate_principal(principal: Money) -> LoanScheduleResult<()> {
    if principal <= Decimal::ZERO {
        return Err(LoanScheduleError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if principal > MAX_PRINCIPAL {
        return Err(LoanScheduleError::InvalidInput {
            field: "principal".into(),
            reason: format!("Principal must not exceed {MAX_PRINCIPAL}"),
        });
    }
    Ok(())
}

pub fn validate_update(update: &LoanUpdate) -> LoanScheduleResult<()> {
    if update.id.trim().is_empty() {
        return Err(LoanScheduleError::InvalidInput {
            field: "id".into(),
            reason: "Update id must not be empty".into(),
        });
    }
    if update.principal_payment <= Decimal::ZERO {
        return Err(LoanScheduleError::InvalidInput {
            field: "principal_payment".into(),
            reason: format!("Update '{}': principal payment must be positive", update.id),
        });
    }
    validate_rate("new_interest_rate", update.new_interest_rate)
}

/// Validate each update and reject duplicate ids.
pub fn validate_updates(updates: &[LoanUpdate]) -> LoanScheduleResult<()> {
    let mut seen = HashSet::new();
    for update in updates {
        validate_update(update)?;
        if !seen.insert(update.id.as_str()) {
            return Err(LoanScheduleError::DuplicateUpdateId(update.id.clone()));
        }
    }
    Ok(())
}

fn validate_rate(field: &str, rate: Decimal) -> LoanScheduleResult<()> {
    if rate < Decimal::ZERO || rate > MAX_RATE_PCT {
        return Err(LoanScheduleError::InvalidInput {
            field: field.into(),
            reason: format!("Rate must be between 0 and {MAX_RATE_PCT} percent"),
        });
    }
    Ok(())
}
