//! `minuta_pricing` prices real estate sales agreements (minutas) for a
//! commercial wizard.
//!
//! Given the units of a sale it computes:
//! - **Operation total**: the negotiated prices of the selected units, in USD.
//! - **F/SB composition**: the split of that total between party A (F) and
//!   party B (SB), by percentage or fixed amount, each in its own currency.
//! - **Charges**: stamp duty, furnishing, blueprints, notary certification and
//!   other expenses, with the moment each one is paid.
//! - **Financing coverage**: whether the installment rules of each party cover
//!   the balance it has to finance.
//!
//! ## Usage
//!
//! Build a [`WizardData`] snapshot and let the [`PricingEngine`] derive every
//! total from it:
//!
//! ```rust
//! use minuta_pricing::{Currency, PaymentMode, PricingEngine, SelectedUnit, SplitMode, WizardData};
//! use rust_decimal_macros::dec;
//!
//! let mut data = WizardData {
//!     project: "Torre Norte".into(),
//!     units: vec![SelectedUnit {
//!         id: "1A".into(),
//!         list_price: dec!(100_000),
//!         ..Default::default()
//!     }],
//!     split_mode: SplitMode::Percentage,
//!     percentage_a: dec!(30),
//!     currency_a: Currency::Ars,
//!     currency_b: Currency::Usd,
//!     exchange_rate: dec!(1000),
//!     payment_mode: PaymentMode::Cash,
//!     ..Default::default()
//! };
//!
//! let engine = PricingEngine::default();
//! match engine.recompute(&mut data) {
//!     Ok(pricing) => {
//!         println!("Party A: {} ARS", pricing.split.amount_a);
//!         println!("Party B: {} USD", pricing.split.amount_b);
//!     }
//!     Err(e) => {
//!         eprintln!("Cannot price minuta: {}", e);
//!     }
//! }
//! assert_eq!(data.percentage_b, dec!(70));
//! ```

pub mod amortization;
pub mod charges;
pub mod composition;
pub mod config;
pub mod currency;
pub mod engine;
pub mod error;
pub mod financing;
pub mod minuta;
pub mod telemetry;
pub mod units;
pub mod wizard;

pub use charges::{Advances, Charge, ChargeBreakdown, FinanceableTotals, PaymentMoment};
pub use composition::{Party, Split, SplitMode};
pub use config::EngineConfig;
pub use currency::{Currency, ExchangeRate};
pub use engine::{Pricing, PricingEngine};
pub use error::PricingError;
pub use financing::{AmortizationSystem, Coverage, FinancingRule, Periodicity};
pub use minuta::{InMemoryMinutaStore, Minuta, MinutaKind, MinutaStatus, MinutaStore, Role};
pub use units::{DiscountKind, GarageData, SelectedUnit, StorageData};
pub use wizard::{PaymentMode, WizardData, WizardFlow, WizardStep};
