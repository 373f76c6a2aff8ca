//! Checkout modal flow: package selection, service agreement, then the
//! terms-acceptance wizard.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::gate::{GateConfig, ScrollGate};
use super::state::{Wizard, WizardStep};
use crate::error::WizardError;

/// Which screen of the checkout modal is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalStep {
    Closed,
    ServiceAgreement,
    TermsAcceptance,
}

impl Default for ModalStep {
    fn default() -> Self {
        Self::Closed
    }
}

impl std::fmt::Display for ModalStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Closed => "closed",
            Self::ServiceAgreement => "service_agreement",
            Self::TermsAcceptance => "terms_acceptance",
        };
        write!(f, "{s}")
    }
}

/// The modal around one package's checkout.
#[derive(Debug, Clone)]
pub struct ModalFlow {
    step: ModalStep,
    gate: ScrollGate,
    wizard: Option<Wizard>,
}

impl ModalFlow {
    pub fn new(gate_config: GateConfig, now: Instant) -> Self {
        Self {
            step: ModalStep::Closed,
            gate: ScrollGate::new(gate_config, now),
            wizard: None,
        }
    }

    pub fn step(&self) -> ModalStep {
        self.step
    }

    pub fn gate(&self) -> &ScrollGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut ScrollGate {
        &mut self.gate
    }

    pub fn wizard(&self) -> Option<&Wizard> {
        self.wizard.as_ref()
    }

    pub fn wizard_mut(&mut self) -> Option<&mut Wizard> {
        self.wizard.as_mut()
    }

    /// Hand the wizard to a session for submission.
    pub fn take_wizard(&mut self) -> Option<Wizard> {
        self.wizard.take()
    }

    pub fn selected_package(&self) -> Option<&str> {
        self.wizard.as_ref().map(Wizard::package)
    }

    fn invalid(&self, action: &str) -> WizardError {
        WizardError::InvalidTransition {
            step: self.step.to_string(),
            action: action.to_string(),
        }
    }

    /// Open the modal on the agreement for `package`. Any earlier progress
    /// is discarded and the scroll gate starts over.
    pub fn select_package(&mut self, package: impl Into<String>, now: Instant) {
        self.wizard = Some(Wizard::for_package(package));
        self.gate.reset(now);
        self.step = ModalStep::ServiceAgreement;
    }

    /// ServiceAgreement → TermsAcceptance, once the agreement has been read.
    pub fn accept_agreement(&mut self) -> Result<(), WizardError> {
        if self.step != ModalStep::ServiceAgreement {
            return Err(self.invalid("accept agreement"));
        }
        if !self.gate.is_read() {
            return Err(WizardError::AgreementNotRead);
        }
        self.step = ModalStep::TermsAcceptance;
        Ok(())
    }

    /// Step back one screen. From the first wizard step this returns to
    /// the agreement, which stays read; from the agreement it closes.
    pub fn back(&mut self) -> Result<(), WizardError> {
        match self.step {
            ModalStep::TermsAcceptance => {
                let on_details = self
                    .wizard
                    .as_ref()
                    .is_some_and(|w| w.step() == WizardStep::Details);
                if !on_details {
                    return Err(self.invalid("go back"));
                }
                self.step = ModalStep::ServiceAgreement;
                Ok(())
            }
            ModalStep::ServiceAgreement => {
                self.close();
                Ok(())
            }
            ModalStep::Closed => Err(self.invalid("go back")),
        }
    }

    /// Dismiss the modal and drop any progress.
    pub fn close(&mut self) {
        self.step = ModalStep::Closed;
        self.wizard = None;
    }
}
