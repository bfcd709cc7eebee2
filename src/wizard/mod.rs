//! The sales wizard: its data snapshot, step sequence and step validation.

mod data;
mod flow;
mod validation;

pub use data::{PaymentMode, WizardData};
pub use flow::{WizardFlow, WizardStep, step_index, visible_steps};
pub use validation::validate_step;
