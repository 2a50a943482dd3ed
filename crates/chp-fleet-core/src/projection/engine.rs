use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ChpFleetError;
use crate::fleet::capex::FleetCapex;
use crate::fleet::debt::DebtTerms;
use crate::scenario::ScenarioInputs;
use crate::time_value::{
    checked_difference, checked_product, checked_sum, compound_factor, escalate, pct_to_rate,
};
use crate::types::{Money, Percent};
use crate::ChpFleetResult;

use super::records::{OperatingCostBreakdown, RevenueBreakdown, YearRecord};

/// Escalation applied to insurance and management costs. Not a scenario
/// input: every other escalation is caller-configurable, this one is fixed.
pub const FIXED_COST_ESCALATION_PCT: Percent = dec!(3);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Result of one projection pass over years `0..=project_years`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub years: Vec<YearRecord>,
    /// Final cumulative discounted cash flow
    pub npv: Money,
    /// Final cumulative undiscounted cash flow
    pub total_cash_flow: Money,
    /// First year > 0 where cumulative discounted cash flow is >= 0
    pub discounted_payback_year: Option<u32>,
    /// First year > 0 where cumulative cash flow is >= 0
    pub simple_payback_year: Option<u32>,
}

impl Projection {
    fn with_capacity(years: usize) -> Self {
        Projection {
            years: Vec::with_capacity(years),
            npv: Decimal::ZERO,
            total_cash_flow: Decimal::ZERO,
            discounted_payback_year: None,
            simple_payback_year: None,
        }
    }

    /// Cash flow of every year, in order.
    pub fn cash_flows(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.cash_flow).collect()
    }

    /// Smallest DSCR across years with debt service due.
    pub fn min_dscr(&self) -> Option<Decimal> {
        self.years.iter().filter_map(|y| y.dscr).min()
    }

    /// Fold step: append a year and carry the running totals forward.
    fn push(mut self, flows: YearFlows, discounted_cash_flow: Money) -> ChpFleetResult<Self> {
        let cumulative_cash_flow =
            checked_sum("cumulative cash flow", &[self.total_cash_flow, flows.cash_flow])?;
        let cumulative_discounted_cash_flow =
            checked_sum("cumulative discounted cash flow", &[self.npv, discounted_cash_flow])?;

        if flows.year > 0 {
            if self.discounted_payback_year.is_none() && cumulative_discounted_cash_flow >= Decimal::ZERO {
                self.discounted_payback_year = Some(flows.year);
            }
            if self.simple_payback_year.is_none() && cumulative_cash_flow >= Decimal::ZERO {
                self.simple_payback_year = Some(flows.year);
            }
        }

        self.years.push(YearRecord {
            year: flows.year,
            calendar_year: flows.calendar_year,
            deployed_units: flows.deployed_units,
            operating_units: flows.operating_units,
            revenue: flows.revenue,
            total_revenue: flows.total_revenue,
            operating_costs: flows.operating_costs,
            operating_cost: flows.operating_cost,
            ebitda: flows.ebitda,
            debt_service: flows.debt_service,
            dscr: flows.dscr,
            capital_cost: flows.capital_cost,
            tipped_tonnes: flows.tipped_tonnes,
            cash_flow: flows.cash_flow,
            discounted_cash_flow,
            cumulative_cash_flow,
            cumulative_discounted_cash_flow,
        });
        self.total_cash_flow = cumulative_cash_flow;
        self.npv = cumulative_discounted_cash_flow;
        Ok(self)
    }
}

/// Undiscounted flows of a single year, before accumulation.
#[derive(Debug, Clone)]
struct YearFlows {
    year: u32,
    calendar_year: i32,
    deployed_units: u32,
    operating_units: u32,
    revenue: RevenueBreakdown,
    total_revenue: Money,
    operating_costs: OperatingCostBreakdown,
    operating_cost: Money,
    ebitda: Money,
    debt_service: Money,
    dscr: Option<Decimal>,
    capital_cost: Money,
    tipped_tonnes: Decimal,
    cash_flow: Money,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Project the fleet year by year over `0..=project_years`.
///
/// Year 0 is the ordering year: unit 1 (and any others the rollout rate
/// brings in) is paid for but nothing operates yet. From year 1 every
/// deployed unit earns and spends for the full year. Running totals are
/// carried by a left fold, so each record is final once produced.
pub fn project(
    inputs: &ScenarioInputs,
    capex: &FleetCapex,
    debt: &DebtTerms,
) -> ChpFleetResult<Projection> {
    let discount_rate = pct_to_rate(inputs.discount_rate_pct);
    let horizon = inputs.project_years as usize + 1;

    (0..=inputs.project_years).try_fold(Projection::with_capacity(horizon), |acc, year| {
        let previously_deployed = acc.years.last().map_or(0, |r| r.deployed_units);
        let flows = project_year(inputs, capex, debt, year, previously_deployed)?;

        let discount = compound_factor(discount_rate, year)?;
        let discounted = flows.cash_flow.checked_div(discount).ok_or_else(|| {
            ChpFleetError::ArithmeticOverflow {
                context: format!("discounting year {year} cash flow"),
            }
        })?;

        trace!(
            year,
            deployed = flows.deployed_units,
            cash_flow = %flows.cash_flow,
            discounted = %discounted,
            "projected year"
        );

        acc.push(flows, discounted)
    })
}

/// Units ordered by the end of `year`: `floor(year · rate) + 1`, at least one,
/// never more than the fleet and never fewer than the year before.
pub fn deployed_units(year: u32, units_per_year: Decimal, unit_count: u32, previous: u32) -> u32 {
    // Out-of-range rollout products saturate; the fleet size caps them anyway.
    let ordered = match Decimal::from(year)
        .checked_mul(units_per_year)
        .and_then(|product| product.floor().checked_add(Decimal::ONE))
    {
        Some(n) if n <= Decimal::ONE => 1,
        Some(n) => n.to_u64().unwrap_or(u64::MAX),
        None if units_per_year.is_sign_negative() => 1,
        None => u64::MAX,
    };
    let capped = ordered.min(u64::from(unit_count)) as u32;
    capped.max(previous)
}

fn project_year(
    inputs: &ScenarioInputs,
    capex: &FleetCapex,
    debt: &DebtTerms,
    year: u32,
    previously_deployed: u32,
) -> ChpFleetResult<YearFlows> {
    let deployed = deployed_units(year, inputs.units_per_year, inputs.unit_count, previously_deployed);
    let operating = if year == 0 { 0 } else { deployed };
    let units = Decimal::from(operating);

    let energy = checked_product("fleet energy", &[units, inputs.annual_energy_kwh()?])?;
    let heat = checked_product("fleet heat", &[units, inputs.annual_heat_kwh()?])?;
    let throughput =
        checked_product("fleet throughput", &[units, inputs.annual_throughput_tonnes()?])?;
    let tipped_tonnes = throughput.min(inputs.available_waste_tonnes);

    // ── Revenue ──────────────────────────────────────────────────────
    let revenue = RevenueBreakdown {
        power: checked_product(
            "power revenue",
            &[
                energy,
                inputs.power_utilization,
                escalate(inputs.power_rate, inputs.power_escalation_pct, year)?,
            ],
        )?,
        thermal: checked_product(
            "thermal revenue",
            &[
                heat,
                inputs.thermal_utilization,
                escalate(inputs.thermal_rate, inputs.thermal_escalation_pct, year)?,
            ],
        )?,
        tipping: checked_product(
            "tipping revenue",
            &[
                tipped_tonnes,
                escalate(inputs.tipping_fee, inputs.tipping_escalation_pct, year)?,
            ],
        )?,
        carbon: checked_product(
            "carbon revenue",
            &[
                units,
                inputs.net_carbon_credits()?,
                escalate(inputs.carbon_price, inputs.carbon_escalation_pct, year)?,
            ],
        )?,
    };
    let total_revenue = revenue.total()?;

    // ── Operating cost ───────────────────────────────────────────────
    let fixed_per_unit = checked_sum(
        "fixed cost per unit",
        &[inputs.insurance_per_unit, inputs.management_per_unit],
    )?;
    let operating_costs = OperatingCostBreakdown {
        maintenance: checked_product(
            "maintenance cost",
            &[
                energy,
                escalate(inputs.maintenance_rate, inputs.opex_escalation_pct, year)?,
            ],
        )?,
        fuel_processing: checked_product(
            "fuel processing cost",
            &[
                throughput,
                escalate(inputs.fuel_processing_rate, inputs.opex_escalation_pct, year)?,
            ],
        )?,
        fixed: checked_product(
            "fixed cost",
            &[units, escalate(fixed_per_unit, FIXED_COST_ESCALATION_PCT, year)?],
        )?,
    };
    let operating_cost = operating_costs.total()?;

    let ebitda = checked_difference("EBITDA", total_revenue, operating_cost)?;

    // ── Debt service (years 0..term) ────────────────────────────────
    let debt_service = if year < debt.term_years {
        debt.annual_payment
    } else {
        Decimal::ZERO
    };
    let dscr = if debt_service > Decimal::ZERO {
        Some(ebitda.checked_div(debt_service).ok_or_else(|| {
            ChpFleetError::ArithmeticOverflow {
                context: format!("DSCR in year {year}"),
            }
        })?)
    } else {
        None
    };

    let capital_cost = capex.cost_of_units(previously_deployed, deployed)?;
    let cash_flow = checked_sum("cash flow", &[ebitda, -capital_cost, -debt_service])?;

    Ok(YearFlows {
        year,
        calendar_year: inputs.start_year + year as i32,
        deployed_units: deployed,
        operating_units: operating,
        revenue,
        total_revenue,
        operating_costs,
        operating_cost,
        ebitda,
        debt_service,
        dscr,
        capital_cost,
        tipped_tonnes,
        cash_flow,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
