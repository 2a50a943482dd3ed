use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::{diagnose, Diagnostic};
use crate::fleet::capex::{schedule_unit_costs, FleetCapex};
use crate::fleet::debt::{size_debt, DebtTerms};
use crate::projection::{project, RevenueBreakdown, YearRecord};
use crate::scenario::ScenarioInputs;
use crate::time_value::{checked_difference, checked_product, checked_sum};
use crate::types::{Money, Multiple, Percent, Rate};
use crate::valuation::value_projection;
use crate::error::ChpFleetError;
use crate::ChpFleetResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// What the host site pays for the same energy and waste service with and
/// without the fleet, in the first operating year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSavings {
    /// Electricity bought from the fleet (kWh)
    pub electricity_kwh: Decimal,
    /// Heat bought from the fleet (kWh thermal)
    pub heat_kwh: Decimal,
    /// Waste sent to the fleet instead of disposal (tonnes)
    pub waste_tonnes: Decimal,
    /// Cost at the customer's baseline utility and disposal rates
    pub baseline_cost: Money,
    /// Cost at the fleet's power, thermal and tipping prices
    pub project_cost: Money,
    pub annual_savings: Money,
    /// Savings as a percentage of baseline cost; 0 when baseline is 0
    pub savings_pct: Percent,
}

/// Complete result of one feasibility run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub npv: Money,
    /// Decimal rate (0.12 = 12%); `None` when undetermined
    pub irr: Option<Rate>,
    pub discounted_payback_year: Option<u32>,
    pub simple_payback_year: Option<u32>,
    /// Lowest DSCR over years with debt service; `None` without debt
    pub min_dscr: Option<Multiple>,
    pub year1_revenue: Money,
    pub year1_operating_cost: Money,
    pub year1_ebitda: Money,
    /// Year-1 revenue per operating unit; 0 when no unit operates
    pub revenue_per_unit: Money,
    pub revenue_per_unit_breakdown: RevenueBreakdown,
    pub customer_savings: CustomerSavings,
    pub capex: FleetCapex,
    pub debt: DebtTerms,
    pub years: Vec<YearRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Run the full feasibility pipeline for one scenario.
///
/// Capital schedule, debt sizing, projection, valuation and diagnostics, in
/// that order. Deterministic: the same inputs always give the same result,
/// and nothing is retained between calls. Fails only if a compounding or
/// discounting step leaves the decimal range.
pub fn evaluate(inputs: &ScenarioInputs) -> ChpFleetResult<ModelResult> {
    let capex =
        schedule_unit_costs(inputs.base_unit_cost()?, inputs.unit_count, inputs.learning_rate)?;
    let debt = size_debt(
        capex.fleet_total,
        inputs.equity_fraction,
        inputs.debt_rate_pct,
        inputs.loan_term_years,
        inputs.loan_fee_pct,
    )?;
    let projection = project(inputs, &capex, &debt)?;
    let valuation = value_projection(&projection);
    let min_dscr = projection.min_dscr();

    let diagnostics = diagnose(valuation.npv, inputs.discount_rate_pct, min_dscr);
    let warnings = diagnostics.iter().map(ToString::to_string).collect();

    let year1 = projection.years.get(1);
    let year1_revenue = year1.map_or(Decimal::ZERO, |y| y.total_revenue);
    let year1_operating_cost = year1.map_or(Decimal::ZERO, |y| y.operating_cost);
    let year1_ebitda = year1.map_or(Decimal::ZERO, |y| y.ebitda);
    let year1_units = year1.map_or(0, |y| y.operating_units);

    let revenue_per_unit_breakdown = year1
        .map(|y| y.revenue.per_unit(year1_units))
        .unwrap_or_default();
    let revenue_per_unit = revenue_per_unit_breakdown.total()?;

    let customer_savings = compare_customer_cost(inputs, year1)?;

    debug!(
        npv = %valuation.npv,
        irr = ?valuation.irr,
        min_dscr = ?min_dscr,
        warnings = diagnostics.len(),
        "scenario evaluated"
    );

    Ok(ModelResult {
        npv: valuation.npv,
        irr: valuation.irr,
        discounted_payback_year: projection.discounted_payback_year,
        simple_payback_year: projection.simple_payback_year,
        min_dscr,
        year1_revenue,
        year1_operating_cost,
        year1_ebitda,
        revenue_per_unit,
        revenue_per_unit_breakdown,
        customer_savings,
        capex,
        debt,
        years: projection.years,
        diagnostics,
        warnings,
    })
}

/// Year-1 bill for the host at baseline rates versus fleet prices.
fn compare_customer_cost(
    inputs: &ScenarioInputs,
    year1: Option<&YearRecord>,
) -> ChpFleetResult<CustomerSavings> {
    let units = Decimal::from(year1.map_or(0, |y| y.operating_units));
    let electricity_kwh = checked_product(
        "customer electricity",
        &[units, inputs.annual_energy_kwh()?, inputs.power_utilization],
    )?;
    let heat_kwh = checked_product(
        "customer heat",
        &[units, inputs.annual_heat_kwh()?, inputs.thermal_utilization],
    )?;
    let waste_tonnes = year1.map_or(Decimal::ZERO, |y| y.tipped_tonnes);

    let baseline_cost = checked_sum(
        "baseline cost",
        &[
            checked_product(
                "baseline electricity cost",
                &[electricity_kwh, inputs.baseline_electricity_rate],
            )?,
            checked_product("baseline heat cost", &[heat_kwh, inputs.baseline_heat_rate])?,
            checked_product(
                "baseline disposal cost",
                &[waste_tonnes, inputs.baseline_disposal_fee],
            )?,
        ],
    )?;
    let project_cost = match year1 {
        Some(y) => checked_sum(
            "project cost",
            &[y.revenue.power, y.revenue.thermal, y.revenue.tipping],
        )?,
        None => Decimal::ZERO,
    };
    let annual_savings = checked_difference("annual savings", baseline_cost, project_cost)?;
    let savings_pct = if baseline_cost.is_zero() {
        Decimal::ZERO
    } else {
        annual_savings
            .checked_div(baseline_cost)
            .and_then(|share| share.checked_mul(dec!(100)))
            .ok_or_else(|| ChpFleetError::ArithmeticOverflow {
                context: "savings percentage".into(),
            })?
    };

    Ok(CustomerSavings {
        electricity_kwh,
        heat_kwh,
        waste_tonnes,
        baseline_cost,
        project_cost,
        annual_savings,
        savings_pct,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{single_unit_power_scenario, standard_scenario};
    use crate::valuation::irr::{npv_at, IRR_TOLERANCE};
    use pretty_assertions::assert_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rust_decimal_macros::dec;

    #[test]
    fn test_worked_single_unit_scenario() {
        let result = evaluate(&single_unit_power_scenario()).unwrap();
        assert_eq!(result.years.len(), 2);
        assert_eq!(result.years[0].cash_flow, Decimal::ZERO);
        assert_eq!(result.years[1].revenue.power, dec!(87_600));
        assert_eq!(result.years[1].cash_flow, dec!(87_600));
        assert_eq!(result.npv, dec!(87_600));
        assert_eq!(result.irr, None);
        assert_eq!(result.discounted_payback_year, Some(1));
        assert_eq!(result.min_dscr, None);
        assert!(result.warnings.is_empty());
        assert_eq!(result.year1_revenue, dec!(87_600));
        assert_eq!(result.revenue_per_unit, dec!(87_600));
    }

    #[test]
    fn test_standard_scenario_is_viable() {
        let result = evaluate(&standard_scenario()).unwrap();
        assert!(result.npv > Decimal::ZERO);
        let irr = result.irr.expect("sign change expected");
        assert!(irr > dec!(0.08));
        assert!(result.discounted_payback_year.is_some());

        // Year 0 owes the first payment before any unit runs.
        assert_eq!(result.years[0].dscr, Some(Decimal::ZERO));
        assert_eq!(result.min_dscr, Some(Decimal::ZERO));
        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(result.diagnostics[0], Diagnostic::DebtDefault { .. }));

        // Every operating year of the loan clears the covenant.
        let operating_dscrs: Vec<Decimal> = result.years[1..10]
            .iter()
            .map(|y| y.dscr.unwrap())
            .collect();
        assert_eq!(operating_dscrs.len(), 9);
        assert!(operating_dscrs.iter().all(|d| *d > dec!(1.25)));
        assert!(result.years[10..].iter().all(|y| y.dscr.is_none()));
    }

    #[test]
    fn test_runaway_escalation_is_an_error_not_a_panic() {
        let mut inputs = standard_scenario();
        inputs.power_escalation_pct = dec!(100);
        inputs.project_years = 80;
        assert!(matches!(
            evaluate(&inputs),
            Err(ChpFleetError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_results_compare_by_value() {
        let inputs = standard_scenario();
        assert_eq!(evaluate(&inputs).unwrap(), evaluate(&inputs).unwrap());
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let inputs = standard_scenario();
        let a = serde_json::to_string(&evaluate(&inputs).unwrap()).unwrap();
        let b = serde_json::to_string(&evaluate(&inputs).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_irr_zeroes_npv_within_tolerance() {
        let result = evaluate(&standard_scenario()).unwrap();
        let irr = result.irr.unwrap();
        let cfs: Vec<Money> = result.years.iter().map(|y| y.cash_flow).collect();
        assert!(npv_at(irr - IRR_TOLERANCE, &cfs) > Decimal::ZERO);
        assert!(npv_at(irr + IRR_TOLERANCE, &cfs) < Decimal::ZERO);
    }

    #[test]
    fn test_no_debt_scenario() {
        let mut inputs = standard_scenario();
        inputs.equity_fraction = Decimal::ONE;
        let result = evaluate(&inputs).unwrap();
        assert_eq!(result.debt.annual_payment, Decimal::ZERO);
        assert!(result.years.iter().all(|y| y.dscr.is_none()));
        assert_eq!(result.min_dscr, None);
        assert!(!result
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::DebtDefault { .. } | Diagnostic::CovenantBreach { .. })));
    }

    #[test]
    fn test_zero_term_loan_has_no_debt_service() {
        let mut inputs = standard_scenario();
        inputs.loan_term_years = 0;
        let result = evaluate(&inputs).unwrap();
        assert!(result.years.iter().all(|y| y.debt_service.is_zero()));
        assert_eq!(result.min_dscr, None);
    }

    #[test]
    fn test_heavy_debt_triggers_default_warning() {
        let mut inputs = standard_scenario();
        inputs.equity_fraction = Decimal::ZERO;
        inputs.loan_term_years = 3;
        inputs.debt_rate_pct = dec!(12);
        let result = evaluate(&inputs).unwrap();
        assert!(result.min_dscr.unwrap() < Decimal::ONE);
        assert!(result.diagnostics.iter().any(Diagnostic::is_critical));
    }

    #[test]
    fn test_negative_npv_warning() {
        let mut inputs = standard_scenario();
        inputs.power_rate = dec!(0.01);
        inputs.thermal_rate = Decimal::ZERO;
        inputs.tipping_fee = Decimal::ZERO;
        inputs.carbon_price = Decimal::ZERO;
        inputs.equity_fraction = Decimal::ONE;
        let result = evaluate(&inputs).unwrap();
        assert!(result.npv < Decimal::ZERO);
        assert_eq!(result.warnings, vec!["NPV negative at discount rate 8%".to_string()]);
    }

    #[test]
    fn test_npv_falls_as_discount_rate_rises() {
        let mut inputs = standard_scenario();
        let mut last = None;
        for rate in [dec!(0), dec!(4), dec!(8), dec!(12), dec!(16)] {
            inputs.discount_rate_pct = rate;
            let npv = evaluate(&inputs).unwrap().npv;
            if let Some(prev) = last {
                assert!(npv < prev, "NPV at {rate}% should be below {prev}");
            }
            last = Some(npv);
        }
    }

    #[test]
    fn test_customer_savings() {
        let inputs = standard_scenario();
        let result = evaluate(&inputs).unwrap();
        let s = &result.customer_savings;
        assert_eq!(s.waste_tonnes, result.years[1].tipped_tonnes);
        assert_eq!(s.annual_savings, s.baseline_cost - s.project_cost);
        assert!(s.savings_pct > Decimal::ZERO);
    }

    #[test]
    fn test_customer_savings_zero_baseline() {
        let result = evaluate(&single_unit_power_scenario()).unwrap();
        assert_eq!(result.customer_savings.baseline_cost, Decimal::ZERO);
        assert_eq!(result.customer_savings.savings_pct, Decimal::ZERO);
    }

    #[test]
    fn test_empty_fleet_has_zero_revenue_per_unit() {
        let mut inputs = standard_scenario();
        inputs.unit_count = 0;
        let result = evaluate(&inputs).unwrap();
        assert_eq!(result.revenue_per_unit, Decimal::ZERO);
        assert_eq!(result.revenue_per_unit_breakdown, RevenueBreakdown::default());
        assert!(result.capex.unit_costs.is_empty());
    }

    #[test]
    fn test_zero_horizon_has_no_year_one() {
        let mut inputs = standard_scenario();
        inputs.project_years = 0;
        let result = evaluate(&inputs).unwrap();
        assert_eq!(result.years.len(), 1);
        assert_eq!(result.year1_revenue, Decimal::ZERO);
        assert_eq!(result.discounted_payback_year, None);
    }

    #[test]
    fn test_revenue_per_unit_breakdown_sums() {
        let result = evaluate(&standard_scenario()).unwrap();
        let y1 = &result.years[1];
        let expected = y1.total_revenue / Decimal::from(y1.operating_units);
        assert!((result.revenue_per_unit - expected).abs() < dec!(0.000001));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_evaluate_invariants(
            unit_count in 0u32..30,
            rollout_tenths in 0u32..80,
            learning_pct in 60u32..101,
            waste_tonnes in 0u32..40_000,
            equity_pct in 0u32..101,
            term in 0u32..25,
            horizon in 0u32..30,
        ) {
            let mut inputs = standard_scenario();
            inputs.unit_count = unit_count;
            inputs.units_per_year = Decimal::new(i64::from(rollout_tenths), 1);
            inputs.learning_rate = Decimal::new(i64::from(learning_pct), 2);
            inputs.available_waste_tonnes = Decimal::from(waste_tonnes);
            inputs.equity_fraction = Decimal::new(i64::from(equity_pct), 2);
            inputs.loan_term_years = term;
            inputs.project_years = horizon;

            let result = evaluate(&inputs).unwrap();
            prop_assert_eq!(result.years.len(), horizon as usize + 1);
            prop_assert_eq!(result.capex.unit_costs.len(), unit_count as usize);
            prop_assert!(result.years.windows(2).all(|w| w[1].deployed_units >= w[0].deployed_units));
            for y in &result.years {
                prop_assert!(y.deployed_units <= unit_count);
                prop_assert!(y.tipped_tonnes <= inputs.available_waste_tonnes);
                prop_assert_eq!(y.dscr.is_some(), y.debt_service > Decimal::ZERO);
            }
            if let Some(irr) = result.irr {
                let cfs: Vec<Money> = result.years.iter().map(|y| y.cash_flow).collect();
                prop_assert!(npv_at(irr - IRR_TOLERANCE, &cfs) * npv_at(irr + IRR_TOLERANCE, &cfs) <= Decimal::ZERO);
            }
        }
    }
}
