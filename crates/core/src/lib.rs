pub mod config;
pub mod domain;
pub mod errors;
pub mod fingerprint;
pub mod fx;
pub mod pricing;
pub mod resolver;
pub mod validation;
pub mod variables;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::money::{Currency, Money};
pub use domain::product::{ProductId, ProductInput};
pub use domain::quote::{QuoteDefaults, QuoteId};
pub use domain::settings::CalculationSettings;
pub use errors::{CalculationError, ProductFailure};
pub use fingerprint::RunFingerprint;
pub use fx::ExchangeRateSnapshot;
pub use pricing::state::{PhaseId, PhaseResult};
pub use pricing::{
    calculate_quote, DeterministicPricingPipeline, PricedProduct, PricingPipeline,
    ProductCalculation, QuoteCalculation,
};
pub use resolver::{resolve, resolve_product, ResolutionWarning, ResolvedProduct, WarningReason};
pub use validation::{
    compare, validate_batch, BatchValidation, ExpectedValue, FieldComparison, FieldMapping,
    FieldMappingEntry, ValidationMode, ValidationReport,
};
pub use variables::{VariableKey, VariableScope, VariableSpec, VariableValue};
