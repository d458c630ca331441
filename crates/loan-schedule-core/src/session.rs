//! Versioned persistence envelope for a loan scenario.
//!
//! A session stores the loan parameters and the update list in insertion
//! order. The derived schedule is never persisted; it is rebuilt by replaying
//! the updates whenever the session is loaded.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::amortization::analysis::{
    build_amortization, validate_loan, validate_update, validate_updates, AmortizationInput,
    AmortizationOutput,
};
use crate::amortization::recalc::LoanUpdate;
use crate::types::{ComputationOutput, LoanParameters};
use crate::{LoanScheduleError, LoanScheduleResult};

/// Current envelope version written by [`LoanSession::to_json`].
pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSession {
    pub version: u32,
    pub loan: LoanParameters,
    #[serde(default)]
    pub updates: Vec<LoanUpdate>,
}

impl LoanSession {
    pub fn new(loan: LoanParameters) -> Self {
        Self {
            version: SESSION_VERSION,
            loan,
            updates: Vec::new(),
        }
    }

    /// Parse and validate a session envelope.
    pub fn from_json(json: &str) -> LoanScheduleResult<Self> {
        let session: LoanSession = serde_json::from_str(json)?;
        session.validate()?;
        debug!(updates = session.updates.len(), "loaded loan session");
        Ok(session)
    }

    pub fn to_json(&self) -> LoanScheduleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> LoanScheduleResult<()> {
        if self.version != SESSION_VERSION {
            return Err(LoanScheduleError::UnsupportedVersion {
                found: self.version,
                expected: SESSION_VERSION,
            });
        }
        validate_loan(&self.loan)?;
        validate_updates(&self.updates)
    }

    /// Append an update. Ids must be unique within the session.
    pub fn add_update(&mut self, update: LoanUpdate) -> LoanScheduleResult<()> {
        validate_update(&update)?;
        if self.updates.iter().any(|u| u.id == update.id) {
            return Err(LoanScheduleError::DuplicateUpdateId(update.id));
        }
        self.updates.push(update);
        Ok(())
    }

    /// Remove the update with `id`, returning it.
    pub fn remove_update(&mut self, id: &str) -> LoanScheduleResult<LoanUpdate> {
        let index = self
            .updates
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| LoanScheduleError::UpdateNotFound(id.to_string()))?;
        Ok(self.updates.remove(index))
    }

    pub fn clear_updates(&mut self) {
        self.updates.clear();
    }

    /// Rebuild the schedule for this session.
    pub fn schedule(&self) -> LoanScheduleResult<ComputationOutput<AmortizationOutput>> {
        build_amortization(&AmortizationInput {
            loan: self.loan.clone(),
            updates: self.updates.clone(),
        })
    }
}
