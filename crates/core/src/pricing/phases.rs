use rust_decimal::Decimal;

use crate::domain::money::Currency;
use crate::pricing::state::{pct, per_unit, CalcState, PhaseId, PhaseResult};

pub(crate) type PhaseOutcome = (CalcState, Vec<PhaseResult>);

/// Executes one stage. Stages never reorder, never skip, and only read
/// values written by earlier stages.
pub(crate) fn run_phase(phase: PhaseId, state: CalcState) -> PhaseOutcome {
    match phase {
        PhaseId::ProcurementNet => procurement_net(state),
        PhaseId::Packaging => packaging(state),
        PhaseId::Freight => freight(state),
        PhaseId::InsuranceHandling => insurance_handling(state),
        PhaseId::CustomsValue => customs_value(state),
        PhaseId::CustomsDuties => customs_duties(state),
        PhaseId::ImportVat => import_vat(state),
        PhaseId::BrokerageDocs => brokerage_docs(state),
        PhaseId::LandedCost => landed_cost(state),
        PhaseId::Financing => financing(state),
        PhaseId::MarkupPricing => markup_pricing(state),
        PhaseId::SalesVat => sales_vat(state),
        PhaseId::Profit => profit(state),
    }
}

fn emit(phase: PhaseId, results: &mut Vec<PhaseResult>, variable: &str, value: Decimal) {
    results.push(PhaseResult {
        phase_index: phase.index(),
        phase: phase.name().to_owned(),
        variable: variable.to_owned(),
        value,
        currency: Currency::reference(),
    });
}

fn procurement_net(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::ProcurementNet;
    state.net_unit_purchase_price =
        state.base_price * (Decimal::ONE - pct(state.supplier_discount_pct));
    state.goods_subtotal = state.net_unit_purchase_price * state.quantity;

    let mut results = Vec::new();
    emit(phase, &mut results, "net_unit_purchase_price", state.net_unit_purchase_price);
    emit(phase, &mut results, "goods_subtotal", state.goods_subtotal);
    (state, results)
}

fn packaging(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::Packaging;
    state.packaging_total = state.packaging_cost_per_unit * state.quantity;
    state.procurement_total = state.goods_subtotal + state.packaging_total;

    let mut results = Vec::new();
    emit(phase, &mut results, "packaging_total", state.packaging_total);
    emit(phase, &mut results, "procurement_total", state.procurement_total);
    (state, results)
}

fn freight(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::Freight;
    state.freight_total = state.freight_cost
        + state.inland_transport_cost
        + state.loading_cost
        + state.unloading_cost;

    let mut results = Vec::new();
    emit(phase, &mut results, "freight_total", state.freight_total);
    (state, results)
}

fn insurance_handling(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::InsuranceHandling;
    state.insurance_cost =
        pct(state.insurance_pct) * (state.procurement_total + state.freight_total);
    state.logistics_total =
        state.freight_total + state.insurance_cost + state.handling_cost + state.storage_cost;

    let mut results = Vec::new();
    emit(phase, &mut results, "insurance_cost", state.insurance_cost);
    emit(phase, &mut results, "logistics_total", state.logistics_total);
    (state, results)
}

fn customs_value(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::CustomsValue;
    // Dutiable value is goods plus transport and insurance to the border,
    // not handling or storage.
    state.customs_value = state.procurement_total + state.freight_total + state.insurance_cost;

    let mut results = Vec::new();
    emit(phase, &mut results, "customs_value", state.customs_value);
    (state, results)
}

fn customs_duties(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::CustomsDuties;
    state.customs_duty = pct(state.duty_rate_pct) * state.customs_value;
    state.excise_duty = pct(state.excise_rate_pct) * state.customs_value;
    state.duties_total = state.customs_duty + state.excise_duty + state.customs_processing_fee;

    let mut results = Vec::new();
    emit(phase, &mut results, "customs_duty", state.customs_duty);
    emit(phase, &mut results, "excise_duty", state.excise_duty);
    emit(phase, &mut results, "duties_total", state.duties_total);
    (state, results)
}

fn import_vat(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::ImportVat;
    state.import_vat = pct(state.import_vat_pct)
        * (state.customs_value + state.customs_duty + state.excise_duty);

    let mut results = Vec::new();
    emit(phase, &mut results, "import_vat", state.import_vat);
    (state, results)
}

fn brokerage_docs(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::BrokerageDocs;
    state.bank_transfer_fee = pct(state.bank_transfer_fee_pct) * state.goods_subtotal;
    state.fees_total = state.broker_fee
        + state.documentation_fee
        + state.certification_fee
        + state.bank_transfer_fee;

    let mut results = Vec::new();
    emit(phase, &mut results, "bank_transfer_fee", state.bank_transfer_fee);
    emit(phase, &mut results, "fees_total", state.fees_total);
    (state, results)
}

fn landed_cost(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::LandedCost;
    state.landed_cost = state.procurement_total
        + state.logistics_total
        + state.duties_total
        + state.import_vat
        + state.fees_total;
    state.unit_landed_cost = per_unit(state.landed_cost, state.quantity);

    let mut results = Vec::new();
    emit(phase, &mut results, "landed_cost", state.landed_cost);
    emit(phase, &mut results, "unit_landed_cost", state.unit_landed_cost);
    (state, results)
}

fn financing(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::Financing;
    // Capital tied up between advance and final settlement. 100% advance
    // leaves nothing financed, so every component degrades to zero.
    state.financed_principal =
        state.landed_cost * (Decimal::ONE - pct(state.advance_payment_pct));
    state.financed_days = Decimal::from(
        state.days_to_delivery.saturating_sub(state.days_to_advance) + state.deferral_days,
    );
    state.forex_risk_cost = state.financed_principal * pct(state.rate_forex_risk_pct);
    state.financing_commission = state.financed_principal * pct(state.rate_fin_commission_pct);
    state.loan_interest =
        state.financed_principal * pct(state.rate_loan_interest_daily_pct) * state.financed_days;
    state.financing_total =
        state.forex_risk_cost + state.financing_commission + state.loan_interest;

    let mut results = Vec::new();
    emit(phase, &mut results, "financed_principal", state.financed_principal);
    emit(phase, &mut results, "forex_risk_cost", state.forex_risk_cost);
    emit(phase, &mut results, "financing_commission", state.financing_commission);
    emit(phase, &mut results, "loan_interest", state.loan_interest);
    emit(phase, &mut results, "financing_total", state.financing_total);
    (state, results)
}

fn markup_pricing(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::MarkupPricing;
    state.warranty_reserve = pct(state.warranty_reserve_pct) * state.landed_cost;
    state.full_cost = state.landed_cost + state.financing_total + state.warranty_reserve;
    state.net_sales = state.full_cost
        * (Decimal::ONE + pct(state.markup_pct))
        * (Decimal::ONE - pct(state.customer_discount_pct));

    let mut results = Vec::new();
    emit(phase, &mut results, "warranty_reserve", state.warranty_reserve);
    emit(phase, &mut results, "full_cost", state.full_cost);
    emit(phase, &mut results, "net_sales", state.net_sales);
    (state, results)
}

fn sales_vat(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::SalesVat;
    state.sales_vat = state.net_sales * pct(state.sales_vat_pct);
    state.gross_sales = state.net_sales + state.sales_vat;
    state.unit_sales_price_net = per_unit(state.net_sales, state.quantity);
    state.unit_sales_price = per_unit(state.gross_sales, state.quantity);

    let mut results = Vec::new();
    emit(phase, &mut results, "sales_vat", state.sales_vat);
    emit(phase, &mut results, "gross_sales", state.gross_sales);
    emit(phase, &mut results, "unit_sales_price_net", state.unit_sales_price_net);
    emit(phase, &mut results, "unit_sales_price", state.unit_sales_price);
    (state, results)
}

fn profit(mut state: CalcState) -> PhaseOutcome {
    let phase = PhaseId::Profit;
    state.agent_commission = pct(state.agent_commission_pct) * state.net_sales;
    state.profit = state.net_sales - state.full_cost - state.agent_commission;
    state.unit_profit = per_unit(state.profit, state.quantity);
    state.margin_pct = if state.net_sales.is_zero() {
        Decimal::ZERO
    } else {
        state.profit / state.net_sales * Decimal::ONE_HUNDRED
    };

    let mut results = Vec::new();
    emit(phase, &mut results, "agent_commission", state.agent_commission);
    emit(phase, &mut results, "profit", state.profit);
    emit(phase, &mut results, "unit_profit", state.unit_profit);
    (state, results)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::run_phase;
    use crate::pricing::state::{CalcState, PhaseId};

    fn base_state() -> CalcState {
        CalcState {
            quantity_units: 10,
            quantity: dec!(10),
            base_price: dec!(100),
            markup_pct: dec!(30),
            advance_payment_pct: dec!(100),
            ..CalcState::default()
        }
    }

    fn run_all(mut state: CalcState) -> CalcState {
        for phase in PhaseId::ALL {
            let (next, _) = run_phase(phase, state);
            state = next;
        }
        state
    }

    #[test]
    fn supplier_discount_reduces_net_unit_price() {
        let mut state = base_state();
        state.supplier_discount_pct = dec!(10);
        let (state, results) = run_phase(PhaseId::ProcurementNet, state);
        assert_eq!(state.net_unit_purchase_price, dec!(90.0));
        assert_eq!(state.goods_subtotal, dec!(900.0));
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.phase_index == 1));
    }

    #[test]
    fn customs_value_excludes_handling_and_storage() {
        let mut state = base_state();
        state.freight_cost = dec!(50);
        state.handling_cost = dec!(25);
        state.storage_cost = dec!(5);
        state.insurance_pct = dec!(1);
        let state = run_all(state);

        // goods 1000 + freight 50, insured at 1%
        assert_eq!(state.insurance_cost, dec!(10.50));
        assert_eq!(state.customs_value, dec!(1060.50));
        assert_eq!(state.logistics_total, dec!(90.50));
    }

    #[test]
    fn duties_and_import_vat_compound_on_customs_value() {
        let mut state = base_state();
        state.duty_rate_pct = dec!(5);
        state.import_vat_pct = dec!(20);
        let state = run_all(state);

        assert_eq!(state.customs_duty, dec!(50.00));
        // VAT on customs value plus duty
        assert_eq!(state.import_vat, dec!(210.00));
    }

    #[test]
    fn full_advance_payment_zeroes_financing() {
        let mut state = base_state();
        state.days_to_delivery = 90;
        state.rate_forex_risk_pct = dec!(2);
        state.rate_fin_commission_pct = dec!(1);
        state.rate_loan_interest_daily_pct = dec!(0.05);
        let state = run_all(state);

        assert_eq!(state.financed_principal, Decimal::ZERO);
        assert_eq!(state.financing_total, Decimal::ZERO);
    }

    #[test]
    fn partial_advance_accrues_all_three_financing_components() {
        let mut state = base_state();
        state.advance_payment_pct = dec!(30);
        state.days_to_advance = 10;
        state.days_to_delivery = 70;
        state.deferral_days = 30;
        state.rate_forex_risk_pct = dec!(2);
        state.rate_fin_commission_pct = dec!(1);
        state.rate_loan_interest_daily_pct = dec!(0.05);
        let state = run_all(state);

        // landed cost 1000, 70% financed for 90 days
        assert_eq!(state.financed_principal, dec!(700.0));
        assert_eq!(state.forex_risk_cost, dec!(14.0));
        assert_eq!(state.financing_commission, dec!(7.0));
        assert_eq!(state.loan_interest, dec!(31.5));
        assert_eq!(state.financing_total, dec!(52.5));
    }

    #[test]
    fn markup_and_profit_close_the_loop() {
        let state = run_all(base_state());

        // bare product: landed cost equals goods subtotal
        assert_eq!(state.landed_cost, dec!(1000.0));
        assert_eq!(state.full_cost, dec!(1000.0));
        assert_eq!(state.net_sales, dec!(1300.0));
        assert_eq!(state.profit, dec!(300.0));
        assert_eq!(state.unit_profit, dec!(30.0));
        assert_eq!(state.margin_pct.round_dp(4), dec!(23.0769));
    }

    #[test]
    fn zero_quantity_completes_with_zero_totals() {
        let mut state = base_state();
        state.quantity_units = 0;
        state.quantity = Decimal::ZERO;
        let state = run_all(state);

        assert_eq!(state.gross_sales, Decimal::ZERO);
        assert_eq!(state.unit_sales_price, Decimal::ZERO);
        assert_eq!(state.unit_profit, Decimal::ZERO);
        assert_eq!(state.margin_pct, Decimal::ZERO);
    }
}
