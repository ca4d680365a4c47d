//! Onboarding wizard: five linear steps from business profile to a
//! launched campaign.
//!
//! [`WizardController`] is the synchronous state machine. Each step is a
//! [`StepRenderer`] variant that may perform one external fetch. The
//! [`WizardSessions`] host runs those fetches and the launch simulation on
//! tokio and saves the finished [`WizardResult`].

pub mod controller;
pub mod launch;
pub mod model;
pub mod routes;
pub mod session;
pub mod state;
pub mod steps;

pub use controller::{Advance, Retreat, StepOutput, WizardController};
pub use model::{BusinessForm, BusinessInfo, Creative, Offer, WizardResult};
pub use routes::{WizardRouteState, wizard_routes};
pub use session::{SessionOutcome, SessionSnapshot, WizardSessions};
pub use state::WizardStep;
pub use steps::{FetchRequest, FetchResult, FetchTicket, StepRenderer, StepView};
