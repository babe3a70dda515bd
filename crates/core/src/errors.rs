use thiserror::Error;

use crate::domain::product::ProductId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("required variable `{variable}` has no value at any tier for product {product_id:?}")]
    MissingVariable { variable: String, product_id: ProductId },
    #[error("no exchange rate for currency `{code}` in the supplied snapshot")]
    UnknownCurrency { code: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl CalculationError {
    pub fn missing_variable(variable: impl Into<String>, product_id: ProductId) -> Self {
        Self::MissingVariable { variable: variable.into(), product_id }
    }

    pub fn unknown_currency(code: impl Into<String>) -> Self {
        Self::UnknownCurrency { code: code.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }
}

/// A product that could not be priced. The rest of the quote keeps going;
/// the caller decides what to do with the failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductFailure {
    pub product_id: ProductId,
    pub error: CalculationError,
}

#[cfg(test)]
mod tests {
    use super::CalculationError;
    use crate::domain::product::ProductId;

    #[test]
    fn missing_variable_names_the_variable_and_product() {
        let error = CalculationError::missing_variable("markup_pct", ProductId("P-7".to_owned()));
        let rendered = error.to_string();
        assert!(rendered.contains("markup_pct"));
        assert!(rendered.contains("P-7"));
    }

    #[test]
    fn unknown_currency_names_the_code() {
        let error = CalculationError::unknown_currency("XTS");
        assert!(error.to_string().contains("XTS"));
    }
}
