//! Engine settings: coverage tolerance, IVA rate and money precision.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Largest uncovered balance, in the party's currency, still accepted as fully financed.
pub const DEFAULT_TOLERANCE: Decimal = dec!(1.01);

/// IVA rate applied to housing sales, as a percentage.
pub const DEFAULT_IVA_PERCENTAGE: Decimal = dec!(10.5);

pub const DEFAULT_DECIMALS: u32 = 2;

/// Keys use the Spanish names of the settings file; unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(rename = "tolerancia")]
    pub tolerance: Decimal,
    #[serde(rename = "iva_porcentaje")]
    pub iva_percentage: Decimal,
    #[serde(rename = "decimales")]
    pub decimals: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            iva_percentage: DEFAULT_IVA_PERCENTAGE,
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl EngineConfig {
    /// Loads settings from a JSON file. A missing file yields the defaults and
    /// missing keys fall back to their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "engine config not found, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_env_map(std::env::vars().collect())
    }

    /// Reads `MINUTA_TOLERANCIA`, `MINUTA_IVA_PORCENTAJE` and `MINUTA_DECIMALES`.
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let mut config = Self::default();

        if let Some(raw) = env_map.get("MINUTA_TOLERANCIA") {
            config.tolerance = raw
                .parse::<Decimal>()
                .with_context(|| format!("MINUTA_TOLERANCIA must be a decimal, got {raw}"))?;
        }
        if let Some(raw) = env_map.get("MINUTA_IVA_PORCENTAJE") {
            config.iva_percentage = raw
                .parse::<Decimal>()
                .with_context(|| format!("MINUTA_IVA_PORCENTAJE must be a decimal, got {raw}"))?;
        }
        if let Some(raw) = env_map.get("MINUTA_DECIMALES") {
            config.decimals = raw
                .parse::<u32>()
                .with_context(|| format!("MINUTA_DECIMALES must be a whole number, got {raw}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.tolerance.is_sign_negative() {
            anyhow::bail!("tolerancia cannot be negative, got {}", self.tolerance);
        }
        if self.iva_percentage < Decimal::ZERO || self.iva_percentage > Decimal::ONE_HUNDRED {
            anyhow::bail!("iva_porcentaje must be between 0 and 100, got {}", self.iva_percentage);
        }
        if self.decimals > 10 {
            anyhow::bail!("decimales must be at most 10, got {}", self.decimals);
        }
        Ok(())
    }
}
