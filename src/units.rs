//! Selected units, negotiated prices and the operation total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, ensure_non_negative, ensure_percentage};

/// How the list price of a unit is discounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountKind {
    #[default]
    #[serde(rename = "ninguno")]
    None,
    #[serde(rename = "porcentaje")]
    Percentage,
    #[serde(rename = "importe")]
    Amount,
}

/// A unit picked from the sales map, priced in USD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedUnit {
    pub id: String,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "proyecto")]
    pub project: String,
    #[serde(rename = "etapa")]
    pub stage: String,
    pub sector: String,
    #[serde(rename = "precioLista")]
    pub list_price: Decimal,
    #[serde(rename = "tipoDescuento", default)]
    pub discount_kind: DiscountKind,
    #[serde(rename = "valorDescuento", default)]
    pub discount_value: Decimal,
    #[serde(rename = "precioNegociado", default)]
    pub negotiated_price: Decimal,
}

impl SelectedUnit {
    /// Applies the discount rule to the list price. The result is never negative.
    ///
    /// # Errors
    ///
    /// Rejects a negative list price or discount and a percentage outside `[0, 100]`.
    pub fn compute_negotiated_price(&self) -> Result<Decimal, PricingError> {
        ensure_non_negative("precioLista", self.list_price)?;
        ensure_non_negative("valorDescuento", self.discount_value)?;

        let discounted = match self.discount_kind {
            DiscountKind::None => self.list_price,
            DiscountKind::Percentage => {
                ensure_percentage("valorDescuento", self.discount_value)?;
                self.list_price - self.list_price * self.discount_value / Decimal::ONE_HUNDRED
            }
            DiscountKind::Amount => self.list_price - self.discount_value,
        };

        Ok(discounted.max(Decimal::ZERO))
    }

    pub fn refresh_negotiated_price(&mut self) -> Result<(), PricingError> {
        self.negotiated_price = self.compute_negotiated_price()?;
        Ok(())
    }

    pub fn is_garage(&self) -> bool {
        self.kind.to_lowercase().contains("cochera")
    }
}

/// Garage priced through the legacy parallel model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarageData {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "precioLista", default)]
    pub list_price: Decimal,
    #[serde(rename = "precioNegociado", default)]
    pub negotiated_price: Decimal,
}

/// Storage room priced through the legacy parallel model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "precioLista", default)]
    pub list_price: Decimal,
    #[serde(rename = "precioNegociado", default)]
    pub negotiated_price: Decimal,
}

/// Sums the operation total in USD.
///
/// When units are selected only their negotiated prices count; the legacy
/// price, garages and storage room are used only when the unit list is empty.
pub fn total_price(
    units: &[SelectedUnit],
    legacy_price: Decimal,
    garages: &[GarageData],
    storage: Option<&StorageData>,
) -> Decimal {
    if !units.is_empty() {
        return units.iter().map(|unit| unit.negotiated_price).sum();
    }

    legacy_price
        + garages.iter().map(|garage| garage.negotiated_price).sum::<Decimal>()
        + storage.map(|s| s.negotiated_price).unwrap_or_default()
}

/// Garages billed for blueprints: garage units when the unit model is used,
/// legacy garage entries otherwise.
pub fn garage_count(units: &[SelectedUnit], garages: &[GarageData]) -> u32 {
    let count = if units.is_empty() {
        garages.len()
    } else {
        units.iter().filter(|unit| unit.is_garage()).count()
    };
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn unit(id: &str, price: Decimal) -> SelectedUnit {
        SelectedUnit {
            id: id.into(),
            kind: "Departamento".into(),
            list_price: price,
            negotiated_price: price,
            ..Default::default()
        }
    }

    #[test]
    fn test_units_ignore_legacy_fields() {
        let units = vec![
            unit("1A", dec!(50000)),
            unit("1B", dec!(30000)),
            unit("1C", dec!(20000)),
        ];
        let garages = vec![GarageData {
            negotiated_price: dec!(9000),
            ..Default::default()
        }];

        let total = total_price(&units, dec!(75000), &garages, None);
        assert_eq!(total, dec!(100000));
    }

    #[test]
    fn test_legacy_model_when_no_units() {
        let garages = vec![
            GarageData {
                negotiated_price: dec!(10000),
                ..Default::default()
            },
            GarageData {
                negotiated_price: dec!(12000),
                ..Default::default()
            },
        ];
        let storage = StorageData {
            negotiated_price: dec!(3000),
            ..Default::default()
        };

        assert_eq!(
            total_price(&[], dec!(80000), &garages, Some(&storage)),
            dec!(105000)
        );
        assert_eq!(total_price(&[], dec!(0), &[], None), dec!(0));
    }

    #[rstest]
    #[case(DiscountKind::None, dec!(0), dec!(100000))]
    #[case(DiscountKind::Percentage, dec!(10), dec!(90000))]
    #[case(DiscountKind::Amount, dec!(2500), dec!(97500))]
    #[case(DiscountKind::Amount, dec!(150000), dec!(0))]
    fn test_negotiated_price(
        #[case] kind: DiscountKind,
        #[case] value: Decimal,
        #[case] expected: Decimal,
    ) {
        let mut unit = unit("2A", dec!(100000));
        unit.discount_kind = kind;
        unit.discount_value = value;
        unit.refresh_negotiated_price().unwrap();
        assert_eq!(unit.negotiated_price, expected);
    }

    #[test]
    fn test_rejects_percentage_above_hundred() {
        let mut unit = unit("2A", dec!(100000));
        unit.discount_kind = DiscountKind::Percentage;
        unit.discount_value = dec!(120);
        assert!(matches!(
            unit.refresh_negotiated_price(),
            Err(PricingError::OutOfRange { .. })
        ));
        assert_eq!(unit.negotiated_price, dec!(100000));
    }

    #[test]
    fn test_garage_count_prefers_units() {
        let mut garage = unit("C1", dec!(15000));
        garage.kind = "Cochera".into();
        let units = vec![unit("1A", dec!(50000)), garage];
        let legacy = vec![GarageData::default(); 3];

        assert_eq!(garage_count(&units, &legacy), 1);
        assert_eq!(garage_count(&[], &legacy), 3);
    }

    #[test]
    fn test_unit_wire_names() {
        let json = r#"{
            "id": "7B",
            "tipo": "Departamento",
            "descripcion": "Piso 7",
            "proyecto": "Torre Norte",
            "etapa": "1",
            "sector": "A",
            "precioLista": "120000",
            "tipoDescuento": "porcentaje",
            "valorDescuento": "5"
        }"#;
        let unit: SelectedUnit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.discount_kind, DiscountKind::Percentage);
        assert_eq!(unit.compute_negotiated_price().unwrap(), dec!(114000));
    }
}
