use chp_fleet_core::fleet::debt::RepaymentProfile;
use chp_fleet_core::sensitivity::{self, SensitivityParameter};
use chp_fleet_core::{evaluate, ChpFleetError, ScenarioInputs, ScenarioOverrides};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

/// One 100 kW unit selling power only at 0.10/kWh for a single year.
fn worked_scenario() -> ScenarioInputs {
    serde_json::from_value(json!({
        "electrical_output_kw": "100",
        "thermal_output_kw": "0",
        "availability": "1",
        "feedstock_tonnes_per_day": "0",
        "power_rate": "0.10",
        "power_utilization": "1",
        "power_escalation_pct": "0",
        "thermal_rate": "0",
        "thermal_utilization": "0",
        "thermal_escalation_pct": "0",
        "tipping_fee": "0",
        "tipping_escalation_pct": "0",
        "available_waste_tonnes": "0",
        "methane_offset_tco2e": "0",
        "fuel_offset_tco2e": "0",
        "project_emissions_tco2e": "0",
        "carbon_price": "0",
        "carbon_escalation_pct": "0",
        "baseline_electricity_rate": "0",
        "baseline_heat_rate": "0",
        "baseline_disposal_fee": "0",
        "equipment_cost": "0",
        "ancillary_equipment_cost": "0",
        "installation_cost": "0",
        "maintenance_rate": "0",
        "fuel_processing_rate": "0",
        "insurance_per_unit": "0",
        "management_per_unit": "0",
        "opex_escalation_pct": "0",
        "equity_fraction": "1",
        "debt_rate_pct": "0",
        "loan_term_years": 0,
        "loan_fee_pct": "0",
        "discount_rate_pct": "0",
        "project_years": 1,
        "start_year": 2026,
        "unit_count": 1,
        "learning_rate": "1",
        "units_per_year": "1"
    }))
    .unwrap()
}

fn overrides(value: serde_json::Value) -> ScenarioOverrides {
    serde_json::from_value(value).unwrap()
}

/// Four units at 100k first-of-fleet cost, one deployed per year.
fn four_unit_fleet() -> ScenarioInputs {
    worked_scenario().with_overrides(&overrides(json!({
        "equipment_cost": "100000",
        "unit_count": 4,
        "learning_rate": "0.8",
        "project_years": 8,
        "discount_rate_pct": "8"
    })))
}

// ===========================================================================
// Worked scenario
// ===========================================================================

#[test]
fn test_worked_scenario_from_json() {
    let inputs = worked_scenario();
    assert_eq!(inputs.annual_energy_kwh().unwrap(), dec!(876_000));

    let result = evaluate(&inputs).unwrap();
    assert_eq!(result.years.len(), 2);
    assert_eq!(result.years[0].calendar_year, 2026);
    assert_eq!(result.years[1].calendar_year, 2027);
    assert_eq!(result.years[0].cash_flow, Decimal::ZERO);
    assert_eq!(result.years[1].revenue.power, dec!(87_600));
    assert_eq!(result.years[1].cash_flow, dec!(87_600));
    assert_eq!(result.npv, dec!(87_600));
    assert_eq!(result.irr, None);
    assert_eq!(result.discounted_payback_year, Some(1));
    assert!(result.warnings.is_empty());
}

#[test]
fn test_result_serializes_nulls_and_decimal_strings() {
    let value = serde_json::to_value(evaluate(&worked_scenario()).unwrap()).unwrap();
    assert_eq!(value["irr"], serde_json::Value::Null);
    assert_eq!(value["min_dscr"], serde_json::Value::Null);
    assert_eq!(value["years"][1]["dscr"], serde_json::Value::Null);
    assert!(value["npv"].is_string());
}

// ===========================================================================
// Capital schedule
// ===========================================================================

#[test]
fn test_learning_curve_costs() {
    let result = evaluate(&four_unit_fleet()).unwrap();
    let costs = &result.capex.unit_costs;
    assert_eq!(costs.len(), 4);
    assert_eq!(costs[0], dec!(100_000));
    assert_eq!(costs[1], dec!(80_000));
    // 3^log2(0.8) ~ 0.70210
    assert!((costs[2] - dec!(70_210)).abs() < dec!(5));
    assert_eq!(costs[3], dec!(64_000));
}

#[test]
fn test_capital_recognized_as_units_deploy() {
    let result = evaluate(&four_unit_fleet()).unwrap();
    let deployed: Vec<u32> = result.years.iter().map(|y| y.deployed_units).collect();
    assert_eq!(deployed, vec![1, 2, 3, 4, 4, 4, 4, 4, 4]);

    assert_eq!(result.years[0].capital_cost, dec!(100_000));
    assert_eq!(result.years[1].capital_cost, dec!(80_000));
    assert_eq!(result.years[4].capital_cost, Decimal::ZERO);

    let total: Decimal = result.years.iter().map(|y| y.capital_cost).sum();
    assert!((total - result.capex.fleet_total).abs() < dec!(0.000001));
}

#[test]
fn test_year_zero_builds_without_operating() {
    let result = evaluate(&four_unit_fleet()).unwrap();
    let y0 = &result.years[0];
    assert_eq!(y0.operating_units, 0);
    assert_eq!(y0.total_revenue, Decimal::ZERO);
    assert_eq!(y0.cash_flow, dec!(-100_000));
    assert_eq!(result.years[1].operating_units, 2);
}

// ===========================================================================
// Debt
// ===========================================================================

#[test]
fn test_debt_service_over_loan_term() {
    // 100k single unit, fully debt funded at 6% over 5 years
    let inputs = four_unit_fleet().with_overrides(&overrides(json!({
        "unit_count": 1,
        "equity_fraction": "0",
        "debt_rate_pct": "6",
        "loan_term_years": 5
    })));
    let result = evaluate(&inputs).unwrap();

    assert_eq!(result.debt.profile, RepaymentProfile::Amortized);
    assert!((result.debt.annual_payment - dec!(23_199.36)).abs() < dec!(0.05));

    // Five payments in years 0 through 4, the first before the unit runs.
    for y in &result.years[0..5] {
        assert_eq!(y.debt_service, result.debt.annual_payment);
        assert!(y.dscr.is_some());
    }
    for y in &result.years[5..] {
        assert_eq!(y.debt_service, Decimal::ZERO);
        assert_eq!(y.dscr, None);
    }

    assert_eq!(result.years[0].dscr, Some(Decimal::ZERO));
    assert_eq!(result.min_dscr, Some(Decimal::ZERO));
    assert!(result.diagnostics.iter().any(|d| d.is_critical()));

    // 87.6k EBITDA over ~23.2k debt service once operating
    for y in &result.years[1..5] {
        let dscr = y.dscr.unwrap();
        assert!(dscr > dec!(3.7) && dscr < dec!(3.8));
    }
}

#[test]
fn test_overflowing_scenario_returns_error() {
    let inputs = four_unit_fleet().with_overrides(&overrides(json!({
        "power_escalation_pct": "100",
        "project_years": 120
    })));
    assert!(matches!(
        evaluate(&inputs),
        Err(ChpFleetError::ArithmeticOverflow { .. })
    ));
}

// ===========================================================================
// Valuation and sensitivity
// ===========================================================================

#[test]
fn test_irr_found_for_conventional_fleet() {
    let result = evaluate(&four_unit_fleet()).unwrap();
    let irr = result.irr.expect("capex then revenue changes sign");
    assert!(irr > dec!(0.08));
    assert!(result.npv > Decimal::ZERO);
}

#[test]
fn test_higher_discount_rate_lowers_npv() {
    let base = evaluate(&four_unit_fleet()).unwrap().npv;
    let higher = four_unit_fleet().with_overrides(&overrides(json!({ "discount_rate_pct": "12" })));
    assert!(evaluate(&higher).unwrap().npv < base);
}

#[test]
fn test_tornado_over_public_api() {
    let rows = sensitivity::sensitivity(&four_unit_fleet()).unwrap();
    assert_eq!(rows.len(), SensitivityParameter::TRACKED.len());
    assert!(rows.windows(2).all(|w| w[0].range >= w[1].range));

    let equipment = rows
        .iter()
        .find(|r| r.parameter == SensitivityParameter::EquipmentCost)
        .unwrap();
    assert!(equipment.range > Decimal::ZERO);
    assert_eq!(equipment.base_value, dec!(100_000));
}
