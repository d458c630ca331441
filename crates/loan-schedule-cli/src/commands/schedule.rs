use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use loan_schedule_core::amortization::analysis::validate_payment_terms;
use loan_schedule_core::session::LoanSession;
use loan_schedule_core::time_value::{monthly_payment, round_money};
use loan_schedule_core::{build_amortization, AmortizationInput, LoanParameters};

use crate::input;

/// Parse a calendar date, accepting `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    loan_schedule_core::day_date::parse(raw).map_err(|e| e.to_string())
}

/// Loan parameters shared by commands that accept them as flags
#[derive(Args)]
pub struct LoanArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate in percent (e.g. 5.25)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in whole years
    #[arg(long, alias = "term")]
    pub term_years: Option<u32>,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,
}

impl LoanArgs {
    pub fn to_parameters(&self) -> Result<LoanParameters, Box<dyn std::error::Error>> {
        Ok(LoanParameters {
            principal: self.principal.ok_or("--principal is required")?,
            annual_rate_pct: self.rate.ok_or("--rate is required")?,
            term_years: self.term_years.ok_or("--term-years is required")?,
            start_date: self.start_date.ok_or("--start-date is required")?,
        })
    }
}

/// Arguments for the baseline schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanArgs,
}

/// Arguments for replaying loan updates
#[derive(Args)]
pub struct RecalculateArgs {
    /// Path to a saved session file
    #[arg(long, conflicts_with = "input")]
    pub session: Option<String>,

    /// Path to JSON input file with `loan` and `updates`
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the level monthly payment
#[derive(Args)]
pub struct PaymentArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Decimal,

    /// Nominal annual interest rate in percent
    #[arg(long)]
    pub rate: Decimal,

    /// Term in years (fractional terms allowed)
    #[arg(long, alias = "term")]
    pub term_years: Decimal,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amortization_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AmortizationInput {
            loan: args.loan.to_parameters()?,
            updates: Vec::new(),
        }
    };

    let result = build_amortization(&amortization_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_recalculate(args: RecalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let result = if let Some(ref path) = args.session {
        let session = LoanSession::from_json(&input::file::read_text(path)?)?;
        session.schedule()?
    } else if let Some(ref path) = args.input {
        let amortization_input: AmortizationInput = input::file::read_json(path)?;
        build_amortization(&amortization_input)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        let amortization_input: AmortizationInput = serde_json::from_value(data)?;
        build_amortization(&amortization_input)?
    } else {
        return Err("--session <file.json>, --input <file.json> or stdin required".into());
    };

    Ok(serde_json::to_value(result)?)
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    validate_payment_terms(args.principal, args.rate, args.term_years)?;
    let payment = monthly_payment(args.principal, args.rate, args.term_years);
    Ok(json!({
        "result": {
            "monthly_payment": round_money(payment),
            "principal": args.principal,
            "annual_rate_pct": args.rate,
            "term_years": args.term_years,
        }
    }))
}
