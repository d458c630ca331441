use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::info;

use loan_schedule_core::session::LoanSession;
use loan_schedule_core::{LoanUpdate, UpdateType};

use crate::commands::schedule::{parse_date, LoanArgs};
use crate::input;

/// Manage a saved loan session file
#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Create a new session file from loan parameters
    New(NewSessionArgs),
    /// Append a loan update (extra principal + new rate)
    AddUpdate(AddUpdateArgs),
    /// Remove a loan update by id
    RemoveUpdate(RemoveUpdateArgs),
    /// Remove every loan update
    ClearUpdates(SessionFileArgs),
    /// Rebuild and print the schedule stored in a session
    Show(SessionFileArgs),
}

#[derive(Args)]
pub struct SessionFileArgs {
    /// Path to the session file
    #[arg(long)]
    pub file: String,
}

#[derive(Args)]
pub struct NewSessionArgs {
    /// Path to the session file to create
    #[arg(long)]
    pub file: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub loan: LoanArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RetainArg {
    /// Keep the payoff date, lower the payment
    Term,
    /// Keep the payment, shorten the term
    Payment,
}

impl From<RetainArg> for UpdateType {
    fn from(arg: RetainArg) -> Self {
        match arg {
            RetainArg::Term => UpdateType::RetainTerm,
            RetainArg::Payment => UpdateType::RetainPayment,
        }
    }
}

#[derive(Args)]
pub struct AddUpdateArgs {
    /// Path to the session file
    #[arg(long)]
    pub file: String,

    /// Extra principal payment
    #[arg(long)]
    pub amount: Decimal,

    /// New nominal annual rate in percent
    #[arg(long)]
    pub rate: Decimal,

    /// Effective date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// What to hold fixed after the update
    #[arg(long, value_enum, default_value = "term")]
    pub retain: RetainArg,

    /// Update id (a UUID is generated when omitted)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct RemoveUpdateArgs {
    /// Path to the session file
    #[arg(long)]
    pub file: String,

    /// Id of the update to remove
    #[arg(long)]
    pub id: String,
}

pub fn run_session(args: SessionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.action {
        SessionAction::New(a) => new_session(a),
        SessionAction::AddUpdate(a) => add_update(a),
        SessionAction::RemoveUpdate(a) => remove_update(a),
        SessionAction::ClearUpdates(a) => clear_updates(a),
        SessionAction::Show(a) => {
            let session = load(&a.file)?;
            Ok(serde_json::to_value(session.schedule()?)?)
        }
    }
}

fn new_session(args: NewSessionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if Path::new(&args.file).exists() && !args.force {
        return Err(format!("'{}' already exists (use --force to overwrite)", args.file).into());
    }
    let session = LoanSession::new(args.loan.to_parameters()?);
    session.validate()?;
    save(&args.file, &session)?;
    Ok(json!({ "result": session }))
}

fn add_update(args: AddUpdateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = load(&args.file)?;
    let id = args
        .id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let update = LoanUpdate::new(id, args.amount, args.rate, args.date, args.retain.into());
    session.add_update(update.clone())?;
    save(&args.file, &session)?;
    Ok(json!({ "result": update }))
}

fn remove_update(args: RemoveUpdateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = load(&args.file)?;
    let removed = session.remove_update(&args.id)?;
    save(&args.file, &session)?;
    Ok(json!({ "result": removed }))
}

fn clear_updates(args: SessionFileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut session = load(&args.file)?;
    let cleared = session.updates.len();
    session.clear_updates();
    save(&args.file, &session)?;
    Ok(json!({ "result": { "cleared": cleared } }))
}

fn load(path: &str) -> Result<LoanSession, Box<dyn std::error::Error>> {
    Ok(LoanSession::from_json(&input::file::read_text(path)?)?)
}

fn save(path: &str, session: &LoanSession) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, session.to_json()?)
        .map_err(|e| format!("Failed to write '{}': {}", path, e))?;
    info!(path, updates = session.updates.len(), "session saved");
    Ok(())
}
