//! The loan-simulation wizard: a five-step flow that selects a client and
//! property, assembles the down payment (cash plus automatic subsidies),
//! picks a rate and institution, sets term and grace, and hands the final
//! request to the lending backend for computation.

pub mod domain;
pub mod guards;
pub mod router;
pub mod session;
pub mod totals;
pub mod wizard;

pub use domain::{WizardForm, WizardStep};
pub use guards::AdvanceBlocked;
pub use router::{wizard_router, WizardApi};
pub use session::{WizardSessionId, WizardSessions};
pub use totals::DerivedTotals;
pub use wizard::{EligibilityTicket, SimulationWizard, WizardError, WizardView};
