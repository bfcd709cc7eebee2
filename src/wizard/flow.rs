//! Ordered wizard steps. Conditional steps carry an inclusion predicate and the
//! visible sequence is derived by filtering, so no step index is hard-coded.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::WizardData;
use super::validation::validate_step;
use crate::engine::PricingEngine;
use crate::error::PricingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Project,
    Units,
    Commercial,
    Composition,
    Iva,
    Payment,
    Charges,
    FinancingRules,
    Summary,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::Project => "Proyecto",
            WizardStep::Units => "Unidades",
            WizardStep::Commercial => "Comercial",
            WizardStep::Composition => "Composición F/SB",
            WizardStep::Iva => "IVA",
            WizardStep::Payment => "Pago",
            WizardStep::Charges => "Cargos",
            WizardStep::FinancingRules => "Reglas de financiación",
            WizardStep::Summary => "Resumen",
        };
        f.write_str(name)
    }
}

struct StepDefinition {
    step: WizardStep,
    include_if: fn(&WizardData) -> bool,
}

fn always(_: &WizardData) -> bool {
    true
}

const STEPS: [StepDefinition; 9] = [
    StepDefinition { step: WizardStep::Project, include_if: always },
    StepDefinition { step: WizardStep::Units, include_if: always },
    StepDefinition { step: WizardStep::Commercial, include_if: always },
    StepDefinition { step: WizardStep::Composition, include_if: always },
    StepDefinition { step: WizardStep::Iva, include_if: |data| data.apply_iva },
    StepDefinition { step: WizardStep::Payment, include_if: always },
    StepDefinition { step: WizardStep::Charges, include_if: always },
    StepDefinition { step: WizardStep::FinancingRules, include_if: WizardData::is_financed },
    StepDefinition { step: WizardStep::Summary, include_if: always },
];

/// Steps shown for the current data, in order.
pub fn visible_steps(data: &WizardData) -> Vec<WizardStep> {
    STEPS
        .iter()
        .filter(|definition| (definition.include_if)(data))
        .map(|definition| definition.step)
        .collect()
}

/// Position of `step` among the visible steps, if it is visible.
pub fn step_index(step: WizardStep, data: &WizardData) -> Option<usize> {
    visible_steps(data).iter().position(|s| *s == step)
}

fn position(step: WizardStep) -> usize {
    STEPS
        .iter()
        .position(|definition| definition.step == step)
        .unwrap_or(0)
}

/// Cursor over the wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardFlow {
    current: WizardStep,
}

impl Default for WizardFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardFlow {
    pub fn new() -> Self {
        Self {
            current: WizardStep::Project,
        }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    /// Next visible step. Works even when the current step has just become
    /// hidden, e.g. after switching a financed sale to cash.
    pub fn next(&self, data: &WizardData) -> Option<WizardStep> {
        STEPS[position(self.current) + 1..]
            .iter()
            .find(|definition| (definition.include_if)(data))
            .map(|definition| definition.step)
    }

    pub fn previous(&self, data: &WizardData) -> Option<WizardStep> {
        STEPS[..position(self.current)]
            .iter()
            .rev()
            .find(|definition| (definition.include_if)(data))
            .map(|definition| definition.step)
    }

    /// Validates the current step and moves forward. Stays on the last step.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the current step; the cursor does not move.
    pub fn advance(&mut self, data: &WizardData, engine: &PricingEngine) -> Result<WizardStep, PricingError> {
        validate_step(self.current, data, engine)?;
        if let Some(next) = self.next(data) {
            tracing::debug!(from = %self.current, to = %next, "wizard advanced");
            self.current = next;
        }
        Ok(self.current)
    }

    pub fn back(&mut self, data: &WizardData) -> WizardStep {
        if let Some(previous) = self.previous(data) {
            self.current = previous;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::PaymentMode;

    #[test]
    fn test_cash_sale_without_iva_skips_conditional_steps() {
        let data = WizardData {
            payment_mode: PaymentMode::Cash,
            ..Default::default()
        };
        let steps = visible_steps(&data);

        assert_eq!(steps.len(), 7);
        assert!(!steps.contains(&WizardStep::Iva));
        assert!(!steps.contains(&WizardStep::FinancingRules));
        assert_eq!(step_index(WizardStep::Charges, &data), Some(5));
    }

    #[test]
    fn test_iva_shifts_charges_step() {
        let data = WizardData {
            apply_iva: true,
            ..Default::default()
        };
        assert_eq!(step_index(WizardStep::Charges, &data), Some(6));
        assert_eq!(step_index(WizardStep::FinancingRules, &data), Some(7));
        assert_eq!(visible_steps(&data).len(), 9);
    }

    #[test]
    fn test_navigation_from_hidden_step() {
        let mut data = WizardData::default();
        let flow = WizardFlow {
            current: WizardStep::FinancingRules,
        };
        assert_eq!(flow.next(&data), Some(WizardStep::Summary));

        data.payment_mode = PaymentMode::Cash;
        assert_eq!(flow.next(&data), Some(WizardStep::Summary));
        assert_eq!(flow.previous(&data), Some(WizardStep::Charges));
    }

    #[test]
    fn test_back_stops_at_first_step() {
        let data = WizardData::default();
        let mut flow = WizardFlow::new();
        assert_eq!(flow.back(&data), WizardStep::Project);
        assert_eq!(flow.previous(&data), None);
    }

    #[test]
    fn test_advance_blocks_on_validation_error() {
        let data = WizardData::default();
        let mut flow = WizardFlow::new();
        let result = flow.advance(&data, &PricingEngine::default());

        assert_eq!(result, Err(PricingError::MissingSelection("proyecto")));
        assert_eq!(flow.current(), WizardStep::Project);
    }
}
