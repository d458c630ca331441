use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use loan_schedule_core::amortization::analysis::validate_payment_terms;
use loan_schedule_core::session::LoanSession;
use loan_schedule_core::time_value::{monthly_payment as level_payment, round_money};
use loan_schedule_core::{AmortizationInput, LoanParameters, LoanUpdate, PaymentRecord};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct PaymentRequest {
    principal: Decimal,
    annual_rate_pct: Decimal,
    term_years: Decimal,
}

#[derive(Deserialize)]
struct RecalculateRequest {
    schedule: Vec<PaymentRecord>,
    updates: Vec<LoanUpdate>,
    loan: LoanParameters,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn monthly_payment(input_json: String) -> NapiResult<String> {
    let input: PaymentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    validate_payment_terms(input.principal, input.annual_rate_pct, input.term_years)
        .map_err(to_napi_error)?;
    let payment = level_payment(input.principal, input.annual_rate_pct, input.term_years);
    serde_json::to_string(&round_money(payment)).map_err(to_napi_error)
}

#[napi]
pub fn generate_schedule(loan_json: String) -> NapiResult<String> {
    let loan: LoanParameters = serde_json::from_str(&loan_json).map_err(to_napi_error)?;
    loan_schedule_core::amortization::analysis::validate_loan(&loan).map_err(to_napi_error)?;
    let schedule = loan_schedule_core::amortization::schedule::generate_for(&loan);
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

/// Replay `updates` over a caller-held base schedule.
#[napi]
pub fn recalculate_schedule(input_json: String) -> NapiResult<String> {
    let input: RecalculateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    loan_schedule_core::amortization::analysis::validate_updates(&input.updates)
        .map_err(to_napi_error)?;
    let schedule = loan_schedule_core::recalculate_schedule(
        &input.schedule,
        &input.updates,
        input.loan.annual_rate_pct,
        input.loan.principal,
        input.loan.term_years,
    );
    serde_json::to_string(&schedule).map_err(to_napi_error)
}

#[napi]
pub fn build_amortization(input_json: String) -> NapiResult<String> {
    let input: AmortizationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_schedule_core::build_amortization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Validate a saved session and return it normalised to the current envelope.
#[napi]
pub fn load_session(session_json: String) -> NapiResult<String> {
    let session = LoanSession::from_json(&session_json).map_err(to_napi_error)?;
    session.to_json().map_err(to_napi_error)
}

#[napi]
pub fn session_schedule(session_json: String) -> NapiResult<String> {
    let session = LoanSession::from_json(&session_json).map_err(to_napi_error)?;
    let output = session.schedule().map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
