//! Application state as plain data with explicit transitions:
//! submit -> generating, success -> showing, failure -> failed.

use serde::{Deserialize, Serialize};

use crate::error::{ClerkError, Result};
use crate::form::{build_input, FormState};
use crate::model::{ClerkInput, ClerkResponse, MessageVariant};

/// What the user sees for any generation failure.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Something went wrong with the AI service. Please check your API key and try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "data", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Editing,
    Generating,
    Showing(ClerkResponse),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub form: FormState,
    pub phase: Phase,
    pub active_tab: usize,
}

impl AppState {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase, Phase::Generating)
    }

    /// Build the input and enter `Generating`.
    ///
    /// Refused while a generation is in flight or when the form is invalid;
    /// the phase is left untouched in both cases.
    pub fn submit(&mut self) -> Result<ClerkInput> {
        if self.is_generating() {
            return Err(ClerkError::Validation(
                "a generation is already in progress".into(),
            ));
        }
        let input = build_input(&self.form)?;
        self.phase = Phase::Generating;
        Ok(input)
    }

    /// Record the outcome of the in-flight generation.
    ///
    /// Outcomes arriving outside `Generating` are stale and dropped; returns
    /// whether the outcome was applied.
    pub fn complete(&mut self, outcome: Result<ClerkResponse>) -> bool {
        if !self.is_generating() {
            tracing::warn!(
                ok = outcome.is_ok(),
                "dropping generation outcome with no generation in flight"
            );
            return false;
        }
        match outcome {
            Ok(response) => {
                self.active_tab = 0;
                self.phase = Phase::Showing(response);
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    transport = err.is_transport(),
                    raw = err.raw_response().unwrap_or(""),
                    "generation failed"
                );
                self.phase = Phase::Failed(GENERIC_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Discard any result or error and return to editing.
    ///
    /// Does nothing while a generation is in flight; returns whether the
    /// state was reset.
    pub fn reset(&mut self) -> bool {
        if self.is_generating() {
            return false;
        }
        self.phase = Phase::Editing;
        self.active_tab = 0;
        true
    }

    pub fn result(&self) -> Option<&ClerkResponse> {
        match &self.phase {
            Phase::Showing(response) => Some(response),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Switch tabs. Returns false (and changes nothing) when out of range.
    pub fn select_tab(&mut self, index: usize) -> bool {
        let in_range = self
            .result()
            .is_some_and(|r| index < r.message_variants.len());
        if in_range {
            self.active_tab = index;
        }
        in_range
    }

    pub fn active_variant(&self) -> Option<&MessageVariant> {
        self.result()?.message_variants.get(self.active_tab)
    }
}
