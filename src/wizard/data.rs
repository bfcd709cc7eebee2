use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::charges::{Advances, PaymentMoment, PaymentMoments};
use crate::composition::{SplitInput, SplitMode};
use crate::currency::Currency;
use crate::financing::FinancingRule;
use crate::units::{GarageData, SelectedUnit, StorageData, garage_count, total_price};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    #[serde(rename = "contado")]
    Cash,
    #[default]
    #[serde(rename = "financiado")]
    Financed,
}

/// Everything the sales rep enters while building a minuta, plus the totals
/// derived from it.
///
/// Serialized with the field names of the persisted `datos` blob. Derived
/// fields are rewritten by [`crate::PricingEngine::recompute`] and never read
/// back as inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardData {
    #[serde(rename = "proyecto")]
    pub project: String,
    #[serde(rename = "unidades")]
    pub units: Vec<SelectedUnit>,
    #[serde(rename = "precioNegociado")]
    pub legacy_price: Decimal,
    #[serde(rename = "cocheras")]
    pub garages: Vec<GarageData>,
    #[serde(rename = "baulera", skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageData>,

    #[serde(rename = "modoA")]
    pub split_mode: SplitMode,
    #[serde(rename = "porcA")]
    pub percentage_a: Decimal,
    #[serde(rename = "impA")]
    pub amount_a: Decimal,
    #[serde(rename = "monedaA")]
    pub currency_a: Currency,
    #[serde(rename = "monedaB")]
    pub currency_b: Currency,
    #[serde(rename = "aplicaIva")]
    pub apply_iva: bool,

    #[serde(rename = "tipoPago")]
    pub payment_mode: PaymentMode,
    #[serde(rename = "tcFuente")]
    pub exchange_rate_source: String,
    #[serde(rename = "tcValor")]
    pub exchange_rate: Decimal,
    #[serde(rename = "fechaPosesion", skip_serializing_if = "Option::is_none")]
    pub possession_date: Option<NaiveDate>,

    #[serde(rename = "anticipoArsA")]
    pub advance_ars_a: Decimal,
    #[serde(rename = "anticipoArsB")]
    pub advance_ars_b: Decimal,
    #[serde(rename = "anticipoUsdA")]
    pub advance_usd_a: Decimal,
    #[serde(rename = "anticipoUsdB")]
    pub advance_usd_b: Decimal,

    #[serde(rename = "certificacionFirmas")]
    pub signature_certification: Decimal,
    #[serde(rename = "formaPagoCertificacionFirmas")]
    pub signature_certification_moment: PaymentMoment,
    #[serde(rename = "selladoPorcentaje")]
    pub stamp_percentage: Decimal,
    #[serde(rename = "formaPagoSellado")]
    pub stamp_moment: PaymentMoment,
    #[serde(rename = "alhajamiemtoPorcentaje")]
    pub furnishing_percentage: Decimal,
    #[serde(rename = "formaPagoAlhajamiemto")]
    pub furnishing_moment: PaymentMoment,
    #[serde(rename = "planosUnidadValorM2")]
    pub unit_blueprint_rate_m2: Decimal,
    #[serde(rename = "planosUnidadM2")]
    pub unit_blueprint_m2: Decimal,
    #[serde(rename = "formaPagoPlanosUnidad")]
    pub unit_blueprints_moment: PaymentMoment,
    #[serde(rename = "planosCocheraValor")]
    pub garage_blueprint_rate: Decimal,
    #[serde(rename = "formaPagoPlanosCochera")]
    pub garage_blueprints_moment: PaymentMoment,
    #[serde(rename = "otrosGastos")]
    pub other_expenses: Decimal,
    #[serde(rename = "formaPagoOtrosGastos")]
    pub other_expenses_moment: PaymentMoment,

    #[serde(rename = "reglasFinanciacionA")]
    pub financing_rules_a: Vec<FinancingRule>,
    #[serde(rename = "reglasFinanciacionB")]
    pub financing_rules_b: Vec<FinancingRule>,

    // derived
    #[serde(rename = "precioTotal")]
    pub total_price: Decimal,
    #[serde(rename = "porcB")]
    pub percentage_b: Decimal,
    #[serde(rename = "montoAUsd")]
    pub amount_a_usd: Decimal,
    #[serde(rename = "montoBUsd")]
    pub amount_b_usd: Decimal,
    #[serde(rename = "selladoMonto")]
    pub stamp_amount: Decimal,
    #[serde(rename = "alhajamiemtoMonto")]
    pub furnishing_amount: Decimal,
    #[serde(rename = "planosUnidadMonto")]
    pub unit_blueprints_amount: Decimal,
    #[serde(rename = "planosCocheraMonto")]
    pub garage_blueprints_amount: Decimal,
    #[serde(rename = "totalCargosArs")]
    pub total_charges_ars: Decimal,
    #[serde(rename = "totalCargosUsd")]
    pub total_charges_usd: Decimal,
    /// Party A's financeable balance, always in pesos.
    #[serde(rename = "totalFinanciarArs")]
    pub total_financed_ars: Decimal,
    /// Party B's financeable balance, in `currency_b`.
    #[serde(rename = "totalFinanciarUsd")]
    pub total_financed_usd: Decimal,
}

impl WizardData {
    /// Operation total in USD from the units as currently priced.
    pub fn operation_total(&self) -> Decimal {
        total_price(
            &self.units,
            self.legacy_price,
            &self.garages,
            self.storage.as_ref(),
        )
    }

    pub fn garage_count(&self) -> u32 {
        garage_count(&self.units, &self.garages)
    }

    pub fn split_input(&self, total_usd: Decimal) -> SplitInput {
        SplitInput {
            total_usd,
            mode: self.split_mode,
            percentage_a: self.percentage_a,
            amount_a: self.amount_a,
            currency_a: self.currency_a,
            currency_b: self.currency_b,
            exchange_rate: self.exchange_rate,
        }
    }

    pub fn advances(&self) -> Advances {
        Advances {
            ars_a: self.advance_ars_a,
            ars_b: self.advance_ars_b,
            usd_a: self.advance_usd_a,
            usd_b: self.advance_usd_b,
        }
    }

    pub fn payment_moments(&self) -> PaymentMoments {
        PaymentMoments {
            signature_certification: self.signature_certification_moment,
            stamp: self.stamp_moment,
            furnishing: self.furnishing_moment,
            unit_blueprints: self.unit_blueprints_moment,
            garage_blueprints: self.garage_blueprints_moment,
            other_expenses: self.other_expenses_moment,
        }
    }

    pub fn is_financed(&self) -> bool {
        self.payment_mode == PaymentMode::Financed
    }

    /// Whether a peso conversion is needed anywhere in the composition.
    pub fn uses_pesos(&self) -> bool {
        self.currency_a == Currency::Ars || self.currency_b == Currency::Ars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_fields_take_defaults() {
        let data: WizardData =
            serde_json::from_str(r#"{ "proyecto": "Torre Norte", "tcValor": 1000 }"#).unwrap();

        assert_eq!(data.project, "Torre Norte");
        assert_eq!(data.exchange_rate, dec!(1000));
        assert_eq!(data.payment_mode, PaymentMode::Financed);
        assert_eq!(data.stamp_moment, PaymentMoment::Unset);
        assert!(data.units.is_empty());
    }

    #[test]
    fn test_serializes_with_blob_field_names() {
        let data = WizardData {
            payment_mode: PaymentMode::Cash,
            stamp_moment: PaymentMoment::Waived,
            ..Default::default()
        };
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["tipoPago"], "contado");
        assert_eq!(value["formaPagoSellado"], "Bonificado");
        assert!(value.get("totalFinanciarArs").is_some());
        assert!(value.get("baulera").is_none());
    }

    #[test]
    fn test_amounts_stay_numeric_in_the_blob() {
        let data = WizardData {
            exchange_rate: dec!(1187.5),
            total_price: dec!(100000),
            percentage_b: dec!(70),
            total_financed_ars: dec!(24300000.55),
            ..Default::default()
        };
        let value = serde_json::to_value(&data).unwrap();

        assert!(value["tcValor"].is_number());
        assert_eq!(value["precioTotal"], 100000.0);
        assert_eq!(value["porcB"], 70.0);

        let parsed: WizardData = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.exchange_rate, dec!(1187.5));
        assert_eq!(parsed.total_financed_ars, dec!(24300000.55));
    }
}
