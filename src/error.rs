use rust_decimal::Decimal;
use thiserror::Error;

use crate::composition::Party;
use crate::currency::Currency;
use crate::minuta::{MinutaStatus, Role};

/// Invalid input state detected while pricing a sales agreement.
///
/// Every variant is recoverable: the caller keeps the previous valid value,
/// shows the message and lets the user correct the field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Exchange rate must be greater than zero, got {0}.")]
    InvalidExchangeRate(Decimal),
    #[error("{field} must be between {min} and {max}, got {value}.")]
    OutOfRange {
        field: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("{field} cannot be negative, got {value}.")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("Party {party} still has {missing} {currency} without financing rules.")]
    UncoveredBalance {
        party: Party,
        currency: Currency,
        missing: Decimal,
    },
    #[error("A value for {0} is required.")]
    MissingSelection(&'static str),
    #[error("Financing rule {rule_id} is invalid: {reason}")]
    InvalidInstallments { rule_id: String, reason: String },
    #[error("Cannot move a minuta from {from} to {to}.")]
    InvalidTransition { from: MinutaStatus, to: MinutaStatus },
    #[error("Minuta is {0} and can no longer be edited.")]
    ClosedMinuta(MinutaStatus),
    #[error("Role {role} is not allowed to {action}.")]
    Forbidden { role: Role, action: &'static str },
    #[error("Minuta {0} not found.")]
    NotFound(String),
    #[error("Minuta storage failed: {0}")]
    Storage(String),
}

impl PricingError {
    pub(crate) fn negative(field: &'static str, value: Decimal) -> Self {
        PricingError::NegativeAmount { field, value }
    }

    pub(crate) fn percentage(field: &'static str, value: Decimal) -> Self {
        PricingError::OutOfRange {
            field,
            value,
            min: Decimal::ZERO,
            max: Decimal::ONE_HUNDRED,
        }
    }
}

/// Rejects negative amounts at the input boundary.
pub(crate) fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<(), PricingError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(PricingError::negative(field, value));
    }
    Ok(())
}

/// Rejects percentages outside `[0, 100]` instead of clamping them.
pub(crate) fn ensure_percentage(field: &'static str, value: Decimal) -> Result<(), PricingError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(PricingError::percentage(field, value));
    }
    Ok(())
}
