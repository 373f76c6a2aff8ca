//! The terms-acceptance wizard steps.

use serde::{Deserialize, Serialize};

use crate::acceptance::NewAcceptance;
use crate::error::WizardError;

/// The steps of the terms-acceptance wizard.
///
/// Progresses Details → Review → Complete, with Review → Details as "back".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Details,
    Review,
    Complete,
}

impl WizardStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Details, Review) | (Review, Details) | (Review, Complete) | (Complete, Details)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// 1-based position for progress indicators.
    pub fn number(&self) -> u8 {
        match self {
            Self::Details => 1,
            Self::Review => 2,
            Self::Complete => 3,
        }
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::Details
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Details => "details",
            Self::Review => "review",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// What the visitor has typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub client_name: String,
    pub client_email: String,
    /// Drawn-signature encoding or typed name. Optional in the form; the
    /// client name stands in when blank.
    pub signature: String,
}

/// Result of finishing the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Id returned by the recorder, if recording succeeded.
    pub acceptance_id: Option<String>,
    /// Recording failed but checkout continued anyway.
    pub recording_failed: bool,
}

/// The wizard for one package selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wizard {
    package: String,
    step: WizardStep,
    details: ClientDetails,
    completion: Option<Completion>,
    last_error: Option<String>,
}

impl Wizard {
    /// Fresh wizard for a selected package.
    pub fn for_package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            step: WizardStep::Details,
            details: ClientDetails::default(),
            completion: None,
            last_error: None,
        }
    }

    /// Package selection trigger: switch package and clear every field.
    pub fn select_package(&mut self, package: impl Into<String>) {
        *self = Self::for_package(package);
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn details(&self) -> &ClientDetails {
        &self.details
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// Error from the most recent failed submission, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn require_step(&self, expected: WizardStep, action: &str) -> Result<(), WizardError> {
        if self.step != expected {
            return Err(WizardError::InvalidTransition {
                step: self.step.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, target: WizardStep, action: &str) -> Result<(), WizardError> {
        if !self.step.can_transition_to(target) {
            return Err(WizardError::InvalidTransition {
                step: self.step.to_string(),
                action: action.to_string(),
            });
        }
        self.step = target;
        Ok(())
    }

    /// Replace the form fields. Only allowed on the details step.
    pub fn update_details(&mut self, details: ClientDetails) -> Result<(), WizardError> {
        self.require_step(WizardStep::Details, "edit details")?;
        self.details = details;
        Ok(())
    }

    /// Details → Review, guarded by a non-empty name and email.
    pub fn proceed_to_review(&mut self) -> Result<(), WizardError> {
        self.require_step(WizardStep::Details, "review")?;

        let mut missing = Vec::new();
        if self.details.client_name.trim().is_empty() {
            missing.push("clientName");
        }
        if self.details.client_email.trim().is_empty() {
            missing.push("clientEmail");
        }
        if !missing.is_empty() {
            return Err(WizardError::MissingDetails { missing });
        }

        self.last_error = None;
        self.transition(WizardStep::Review, "review")
    }

    /// Review → Details.
    pub fn back(&mut self) -> Result<(), WizardError> {
        self.require_step(WizardStep::Review, "go back")?;
        self.transition(WizardStep::Details, "go back")
    }

    /// Build the submission for the recorder. Only valid on Review.
    pub fn submission(&self) -> Result<NewAcceptance, WizardError> {
        self.require_step(WizardStep::Review, "submit")?;

        let name = self.details.client_name.trim();
        let signature = match self.details.signature.trim() {
            "" => name,
            sig => sig,
        };
        Ok(NewAcceptance::new(
            name,
            self.details.client_email.trim(),
            self.package.as_str(),
            signature,
        ))
    }

    /// Review → Complete.
    pub fn complete(&mut self, completion: Completion) -> Result<&Completion, WizardError> {
        self.transition(WizardStep::Complete, "complete")?;
        self.last_error = None;
        Ok(self.completion.insert(completion))
    }

    /// Record a blocking submission failure; stays on Review.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), WizardError> {
        self.require_step(WizardStep::Review, "fail submission")?;
        self.last_error = Some(error.into());
        Ok(())
    }

    /// Complete → Details for another client, keeping the package.
    pub fn reset_for_another_client(&mut self) -> Result<(), WizardError> {
        self.transition(WizardStep::Details, "start another acceptance")?;
        let package = std::mem::take(&mut self.package);
        *self = Self::for_package(package);
        Ok(())
    }
}
