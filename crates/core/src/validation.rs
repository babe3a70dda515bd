use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::Currency;
use crate::errors::CalculationError;
use crate::pricing::state::PhaseResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// The three client-facing financial fields only.
    Summary,
    /// Every mapped field across all phases.
    Detailed,
}

impl FromStr for ValidationMode {
    type Err = CalculationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "detailed" => Ok(Self::Detailed),
            other => Err(CalculationError::invalid_input(format!(
                "unsupported validation mode `{other}` (expected summary|detailed)"
            ))),
        }
    }
}

/// One row of the ground-truth mapping: which spreadsheet cell corresponds
/// to which emitted variable, and in which phase to look for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMappingEntry {
    pub field_id: String,
    pub variable: String,
    pub phase_index: u8,
    pub critical: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    entries: Vec<FieldMappingEntry>,
}

impl FieldMapping {
    pub fn new(entries: Vec<FieldMappingEntry>) -> Self {
        Self { entries }
    }

    /// The mapping for the reference workbook this engine was validated
    /// against. Cell ids are pinned by unit tests; editing a row here is a
    /// wire-format change.
    pub fn standard() -> Self {
        fn entry(field_id: &str, variable: &str, phase_index: u8, critical: bool) -> FieldMappingEntry {
            FieldMappingEntry {
                field_id: field_id.to_owned(),
                variable: variable.to_owned(),
                phase_index,
                critical,
            }
        }

        Self::new(vec![
            entry("G16", "procurement_total", 2, false),
            entry("J16", "freight_total", 3, false),
            entry("L16", "logistics_total", 4, false),
            entry("N16", "customs_value", 5, false),
            entry("P16", "duties_total", 6, false),
            entry("R16", "import_vat", 7, false),
            entry("T16", "fees_total", 8, false),
            entry("V16", "landed_cost", 9, false),
            entry("X16", "financing_total", 10, false),
            entry("AA16", "full_cost", 11, false),
            entry("AC16", "net_sales", 11, false),
            entry("AG16", "gross_sales", 12, false),
            entry("AK16", "unit_sales_price_quote", 13, true),
            entry("AM16", "total_sales_price_quote", 13, true),
            entry("AQ16", "profit_quote", 13, true),
            entry("AS16", "unit_profit_quote", 13, false),
        ])
    }

    pub fn entries(&self, mode: ValidationMode) -> impl Iterator<Item = &FieldMappingEntry> {
        self.entries
            .iter()
            .filter(move |entry| mode == ValidationMode::Detailed || entry.critical)
    }

    pub fn all_entries(&self) -> &[FieldMappingEntry] {
        &self.entries
    }
}

/// Ground-truth value for one mapped cell, as parsed from the reference
/// spreadsheet by the (excluded) reporting surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedValue {
    pub field_id: String,
    pub value: Decimal,
    pub currency: Option<Currency>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field_id: String,
    pub variable: String,
    pub phase_index: u8,
    pub expected: Option<Decimal>,
    pub computed: Option<Decimal>,
    pub absolute_difference: Option<Decimal>,
    pub currency_mismatch: bool,
    pub passed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub mode: ValidationMode,
    pub tolerance: Decimal,
    pub fields: Vec<FieldComparison>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub max_deviation: Decimal,
    pub pass_rate_pct: Decimal,
    pub failed_fields: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchValidation {
    pub total_fields: usize,
    pub passed_fields: usize,
    pub pass_rate_pct: Decimal,
    pub threshold_pct: Decimal,
    pub accepted: bool,
    pub reports: Vec<ValidationReport>,
}

/// Diffs computed phase results against ground truth. Tolerance breaches,
/// missing values and currency mismatches are all reported classifications;
/// nothing in here throws.
pub fn compare(
    expected_values: &[ExpectedValue],
    phase_results: &[PhaseResult],
    mapping: &FieldMapping,
    tolerance: Decimal,
    mode: ValidationMode,
) -> ValidationReport {
    let mut fields = Vec::new();

    for entry in mapping.entries(mode) {
        let expected = expected_values.iter().find(|value| value.field_id == entry.field_id);
        let computed = phase_results
            .iter()
            .find(|result| {
                result.variable == entry.variable && result.phase_index == entry.phase_index
            });

        let comparison = match (expected, computed) {
            (Some(expected), Some(computed)) => {
                let currency_mismatch = expected
                    .currency
                    .as_ref()
                    .is_some_and(|currency| *currency != computed.currency);
                if currency_mismatch {
                    FieldComparison {
                        field_id: entry.field_id.clone(),
                        variable: entry.variable.clone(),
                        phase_index: entry.phase_index,
                        expected: Some(expected.value),
                        computed: Some(computed.value),
                        absolute_difference: None,
                        currency_mismatch: true,
                        passed: false,
                    }
                } else {
                    let difference = (expected.value - computed.value).abs();
                    FieldComparison {
                        field_id: entry.field_id.clone(),
                        variable: entry.variable.clone(),
                        phase_index: entry.phase_index,
                        expected: Some(expected.value),
                        computed: Some(computed.value),
                        absolute_difference: Some(difference),
                        currency_mismatch: false,
                        passed: difference <= tolerance,
                    }
                }
            }
            // A mapped field with nothing to compare against is a failure,
            // never a silent skip: either the spreadsheet lost a cell or the
            // pipeline stopped emitting a name it committed to.
            (expected, computed) => FieldComparison {
                field_id: entry.field_id.clone(),
                variable: entry.variable.clone(),
                phase_index: entry.phase_index,
                expected: expected.map(|value| value.value),
                computed: computed.map(|result| result.value),
                absolute_difference: None,
                currency_mismatch: false,
                passed: false,
            },
        };
        fields.push(comparison);
    }

    let total = fields.len();
    let passed = fields.iter().filter(|field| field.passed).count();
    let failed = total - passed;
    let max_deviation = fields
        .iter()
        .filter_map(|field| field.absolute_difference)
        .max()
        .unwrap_or(Decimal::ZERO);
    let failed_fields = fields
        .iter()
        .filter(|field| !field.passed)
        .map(|field| field.field_id.clone())
        .collect();

    ValidationReport {
        mode,
        tolerance,
        fields,
        total,
        passed,
        failed,
        max_deviation,
        pass_rate_pct: pass_rate(passed, total),
        failed_fields,
    }
}

/// Rolls per-record reports into a batch verdict. A batch below the
/// threshold is rejected in the report, never by an error: the caller
/// renders the mismatch table either way.
pub fn validate_batch(reports: Vec<ValidationReport>, threshold_pct: Decimal) -> BatchValidation {
    let total_fields: usize = reports.iter().map(|report| report.total).sum();
    let passed_fields: usize = reports.iter().map(|report| report.passed).sum();
    let pass_rate_pct = pass_rate(passed_fields, total_fields);

    BatchValidation {
        total_fields,
        passed_fields,
        pass_rate_pct,
        threshold_pct,
        accepted: pass_rate_pct >= threshold_pct,
        reports,
    }
}

fn pass_rate(passed: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ONE_HUNDRED;
    }
    Decimal::from(passed as u64) / Decimal::from(total as u64) * Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::{
        compare, validate_batch, ExpectedValue, FieldMapping, FieldMappingEntry, ValidationMode,
    };
    use crate::domain::money::Currency;
    use crate::pricing::state::PhaseResult;

    fn result(variable: &str, phase_index: u8, value: Decimal, currency: Currency) -> PhaseResult {
        PhaseResult {
            phase_index,
            phase: format!("phase_{phase_index}"),
            variable: variable.to_owned(),
            value,
            currency,
        }
    }

    fn expected(field_id: &str, value: Decimal) -> ExpectedValue {
        ExpectedValue {
            field_id: field_id.to_owned(),
            value,
            currency: Some(Currency::new("RUB")),
        }
    }

    #[test]
    fn standard_mapping_pins_documented_cells() {
        let mapping = FieldMapping::standard();
        let pinned = [
            ("G16", "procurement_total", 2),
            ("J16", "freight_total", 3),
            ("L16", "logistics_total", 4),
            ("N16", "customs_value", 5),
            ("P16", "duties_total", 6),
            ("R16", "import_vat", 7),
            ("T16", "fees_total", 8),
            ("V16", "landed_cost", 9),
            ("X16", "financing_total", 10),
            ("AA16", "full_cost", 11),
            ("AC16", "net_sales", 11),
            ("AG16", "gross_sales", 12),
            ("AK16", "unit_sales_price_quote", 13),
            ("AM16", "total_sales_price_quote", 13),
            ("AQ16", "profit_quote", 13),
            ("AS16", "unit_profit_quote", 13),
        ];

        assert_eq!(mapping.all_entries().len(), pinned.len());
        for (field_id, variable, phase_index) in pinned {
            let entry = mapping
                .all_entries()
                .iter()
                .find(|entry| entry.field_id == field_id)
                .unwrap_or_else(|| panic!("missing mapping for {field_id}"));
            assert_eq!(entry.variable, variable, "{field_id}");
            assert_eq!(entry.phase_index, phase_index, "{field_id}");
        }
    }

    #[test]
    fn summary_mode_evaluates_exactly_the_critical_fields() {
        let mapping = FieldMapping::standard();
        let critical: Vec<_> =
            mapping.entries(ValidationMode::Summary).map(|entry| entry.field_id.as_str()).collect();
        assert_eq!(critical, vec!["AK16", "AM16", "AQ16"]);
    }

    #[test]
    fn three_field_summary_within_tolerance_passes_fully() {
        let rub = Currency::new("RUB");
        let results = vec![
            result("unit_sales_price_quote", 13, dec!(124999.50), rub.clone()),
            result("total_sales_price_quote", 13, dec!(150000.75), rub.clone()),
            result("profit_quote", 13, dec!(26499.80), rub),
        ];
        let expected_values = vec![
            expected("AK16", dec!(125000.00)),
            expected("AM16", dec!(150000.00)),
            expected("AQ16", dec!(26500.00)),
        ];

        let report = compare(
            &expected_values,
            &results,
            &FieldMapping::standard(),
            dec!(2.00),
            ValidationMode::Summary,
        );

        assert_eq!(report.total, 3);
        assert_eq!(report.pass_rate_pct, Decimal::ONE_HUNDRED);
        assert!(report.failed_fields.is_empty());
        assert_eq!(report.max_deviation, dec!(0.75));
    }

    #[test]
    fn breach_is_reported_with_magnitude_not_thrown() {
        let rub = Currency::new("RUB");
        let results = vec![result("profit_quote", 13, dec!(26510.00), rub)];
        let expected_values = vec![expected("AQ16", dec!(26500.00))];

        let report = compare(
            &expected_values,
            &results,
            &FieldMapping::standard(),
            dec!(2.00),
            ValidationMode::Summary,
        );

        let breach = report.fields.iter().find(|field| field.field_id == "AQ16").unwrap();
        assert!(!breach.passed);
        assert_eq!(breach.absolute_difference, Some(dec!(10.00)));
        assert!(report.failed_fields.contains(&"AQ16".to_owned()));
    }

    #[test]
    fn missing_computed_value_is_a_failed_field() {
        let expected_values = vec![expected("AQ16", dec!(26500.00))];
        let report = compare(
            &expected_values,
            &[],
            &FieldMapping::standard(),
            dec!(2.00),
            ValidationMode::Summary,
        );

        let missing = report.fields.iter().find(|field| field.field_id == "AQ16").unwrap();
        assert!(!missing.passed);
        assert_eq!(missing.computed, None);
    }

    #[test]
    fn currency_mismatch_fails_without_inventing_a_conversion() {
        let results = vec![result("profit_quote", 13, dec!(26500.00), Currency::new("USD"))];
        let expected_values = vec![expected("AQ16", dec!(26500.00))];

        let report = compare(
            &expected_values,
            &results,
            &FieldMapping::standard(),
            dec!(2.00),
            ValidationMode::Summary,
        );

        let mismatch = report.fields.iter().find(|field| field.field_id == "AQ16").unwrap();
        assert!(mismatch.currency_mismatch);
        assert!(!mismatch.passed);
        assert_eq!(mismatch.absolute_difference, None);
    }

    #[test]
    fn classification_is_symmetric_in_expected_and_computed() {
        let mapping = FieldMapping::new(vec![FieldMappingEntry {
            field_id: "B2".to_owned(),
            variable: "landed_cost".to_owned(),
            phase_index: 9,
            critical: true,
        }]);
        let usd = Currency::new("USD");

        let forward = compare(
            &[ExpectedValue { field_id: "B2".to_owned(), value: dec!(101.50), currency: None }],
            &[result("landed_cost", 9, dec!(100.00), usd.clone())],
            &mapping,
            dec!(2.00),
            ValidationMode::Summary,
        );
        let swapped = compare(
            &[ExpectedValue { field_id: "B2".to_owned(), value: dec!(100.00), currency: None }],
            &[result("landed_cost", 9, dec!(101.50), usd)],
            &mapping,
            dec!(2.00),
            ValidationMode::Summary,
        );

        assert_eq!(forward.fields[0].passed, swapped.fields[0].passed);
        assert_eq!(
            forward.fields[0].absolute_difference,
            swapped.fields[0].absolute_difference
        );
    }

    #[test]
    fn batch_below_threshold_is_rejected_in_the_report() {
        let rub = Currency::new("RUB");
        let good = compare(
            &[
                expected("AK16", dec!(100.00)),
                expected("AM16", dec!(100.00)),
                expected("AQ16", dec!(100.00)),
            ],
            &[
                result("unit_sales_price_quote", 13, dec!(100.00), rub.clone()),
                result("total_sales_price_quote", 13, dec!(100.00), rub.clone()),
                result("profit_quote", 13, dec!(100.00), rub.clone()),
            ],
            &FieldMapping::standard(),
            dec!(2.00),
            ValidationMode::Summary,
        );
        let bad = compare(
            &[
                expected("AK16", dec!(100.00)),
                expected("AM16", dec!(500.00)),
                expected("AQ16", dec!(900.00)),
            ],
            &[
                result("unit_sales_price_quote", 13, dec!(100.00), rub.clone()),
                result("total_sales_price_quote", 13, dec!(100.00), rub.clone()),
                result("profit_quote", 13, dec!(100.00), rub),
            ],
            &FieldMapping::standard(),
            dec!(2.00),
            ValidationMode::Summary,
        );

        let batch = validate_batch(vec![good, bad], dec!(95));
        assert_eq!(batch.total_fields, 6);
        assert_eq!(batch.passed_fields, 4);
        assert!(!batch.accepted);
        // 4/6 ≈ 66.67%
        assert_eq!(batch.pass_rate_pct.round_dp(2), dec!(66.67));
    }

    #[test]
    fn empty_batch_is_vacuously_accepted() {
        let batch = validate_batch(Vec::new(), dec!(95));
        assert!(batch.accepted);
        assert_eq!(batch.pass_rate_pct, Decimal::ONE_HUNDRED);
    }
}
