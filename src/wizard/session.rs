//! Async driver for the final wizard step: record the acceptance, then
//! hand the visitor to the hosted checkout page.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::state::{Completion, Wizard};
use super::submit::AcceptanceSubmitter;
use crate::checkout::{CheckoutRedirector, CheckoutTarget, Navigator};
use crate::config::{CheckoutConfig, RecordingPolicy};
use crate::error::WizardError;

/// What `confirm` produced.
#[derive(Debug)]
pub struct Confirmation {
    pub completion: Completion,
    pub target: CheckoutTarget,
    /// Resolves once the navigation has been performed.
    pub redirect: JoinHandle<()>,
}

/// One visitor's pass through the wizard for a selected package.
pub struct CheckoutSession {
    wizard: Wizard,
    submitter: Arc<dyn AcceptanceSubmitter>,
    redirector: CheckoutRedirector,
    navigator: Arc<dyn Navigator>,
    policy: RecordingPolicy,
    redirect_delay: Duration,
}

impl CheckoutSession {
    pub fn new(
        wizard: Wizard,
        submitter: Arc<dyn AcceptanceSubmitter>,
        redirector: CheckoutRedirector,
        navigator: Arc<dyn Navigator>,
        config: &CheckoutConfig,
    ) -> Self {
        Self {
            wizard,
            submitter,
            redirector,
            navigator,
            policy: config.recording_policy,
            redirect_delay: config.redirect_delay,
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn policy(&self) -> RecordingPolicy {
        self.policy
    }

    /// Review → Complete. Submits the acceptance and schedules the
    /// redirect to the package's checkout page.
    ///
    /// Under `RecordingPolicy::Strict` a failed submission leaves the
    /// wizard on Review with the error recorded and nothing scheduled.
    /// Under `BestEffort` the failure is logged and checkout proceeds.
    pub async fn confirm(&mut self) -> Result<Confirmation, WizardError> {
        let submission = self.wizard.submission()?;

        let completion = match self.submitter.submit(&submission).await {
            Ok(id) => Completion {
                acceptance_id: Some(id),
                recording_failed: false,
            },
            Err(e) => match self.policy {
                RecordingPolicy::Strict => {
                    let message = e.to_string();
                    self.wizard.fail(message.clone())?;
                    return Err(WizardError::Recording(message));
                }
                RecordingPolicy::BestEffort => {
                    warn!(
                        package = %self.wizard.package(),
                        error = %e,
                        "Failed to record acceptance, continuing to checkout"
                    );
                    Completion {
                        acceptance_id: None,
                        recording_failed: true,
                    }
                }
            },
        };

        let completion = self.wizard.complete(completion)?.clone();
        let target = self.redirector.resolve(self.wizard.package());
        info!(
            package = %target.package,
            acceptance_id = ?completion.acceptance_id,
            "Wizard complete"
        );
        let redirect =
            self.redirector
                .schedule(Arc::clone(&self.navigator), target.clone(), self.redirect_delay);

        Ok(Confirmation {
            completion,
            target,
            redirect,
        })
    }
}
