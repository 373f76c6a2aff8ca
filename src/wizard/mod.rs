//! Client-side checkout flow as plain state machines.
//!
//! Nothing here touches a DOM: scroll and intersection observations are
//! fed in as values, time is passed explicitly, and the side effects
//! (submitting, navigating) go through `AcceptanceSubmitter` and
//! `Navigator`.

pub mod flow;
pub mod gate;
pub mod session;
pub mod state;
pub mod submit;

pub use flow::{ModalFlow, ModalStep};
pub use gate::{GateConfig, ReadSignal, ScrollGate, ScrollMetrics};
pub use session::{CheckoutSession, Confirmation};
pub use state::{ClientDetails, Completion, Wizard, WizardStep};
pub use submit::{AcceptanceSubmitter, HttpSubmitter};
