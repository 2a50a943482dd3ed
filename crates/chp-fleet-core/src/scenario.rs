use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::{checked_difference, checked_product, checked_sum};
use crate::types::{Money, Percent};
use crate::ChpFleetResult;

/// Hours in a non-leap year; unit outputs are rated per hour.
pub const HOURS_PER_YEAR: Decimal = dec!(8760);

/// Days in a non-leap year; feedstock is rated per day.
pub const DAYS_PER_YEAR: Decimal = dec!(365);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Complete input set for a single feasibility run.
///
/// Flat and fully typed. Percent fields (`*_pct`) are percentages (5 = 5%);
/// availability, utilization, equity and learning-rate fields are fractions.
/// Nothing here is validated: out-of-domain values flow through the formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInputs {
    // ── Unit performance ────────────────────────────────────────────
    /// Rated electrical output per unit (kW)
    pub electrical_output_kw: Decimal,
    /// Rated thermal output per unit (kW thermal)
    pub thermal_output_kw: Decimal,
    /// Fraction of the year a unit is available to run
    pub availability: Decimal,
    /// Feedstock consumed per unit (tonnes/day)
    pub feedstock_tonnes_per_day: Decimal,

    // ── Power sales ─────────────────────────────────────────────────
    /// Price per kWh of electricity sold
    pub power_rate: Money,
    /// Fraction of generated electricity that is sold
    pub power_utilization: Decimal,
    pub power_escalation_pct: Percent,

    // ── Thermal sales ───────────────────────────────────────────────
    /// Price per kWh of heat sold
    pub thermal_rate: Money,
    /// Fraction of recovered heat that is sold
    pub thermal_utilization: Decimal,
    pub thermal_escalation_pct: Percent,

    // ── Tipping fees ────────────────────────────────────────────────
    /// Fee earned per tonne of waste accepted
    pub tipping_fee: Money,
    pub tipping_escalation_pct: Percent,
    /// Total waste supply available to the whole fleet (tonnes/year)
    pub available_waste_tonnes: Decimal,

    // ── Carbon credits (tCO2e per unit per year) ────────────────────
    pub methane_offset_tco2e: Decimal,
    pub fuel_offset_tco2e: Decimal,
    pub project_emissions_tco2e: Decimal,
    /// Price per tCO2e credit
    pub carbon_price: Money,
    pub carbon_escalation_pct: Percent,

    // ── Customer baseline (what the host pays without the project) ──
    pub baseline_electricity_rate: Money,
    pub baseline_heat_rate: Money,
    /// Landfill / hauling cost per tonne of waste
    pub baseline_disposal_fee: Money,

    // ── Capital cost per unit (first-of-fleet) ──────────────────────
    pub equipment_cost: Money,
    pub ancillary_equipment_cost: Money,
    pub installation_cost: Money,

    // ── Operating costs ─────────────────────────────────────────────
    /// Maintenance cost per kWh generated
    pub maintenance_rate: Money,
    /// Processing cost per tonne of feedstock
    pub fuel_processing_rate: Money,
    /// Annual insurance per operating unit
    pub insurance_per_unit: Money,
    /// Annual management fee per operating unit
    pub management_per_unit: Money,
    /// Escalation for maintenance and fuel processing
    pub opex_escalation_pct: Percent,

    // ── Financing ───────────────────────────────────────────────────
    /// Share of fleet capital funded by equity (1.0 = no debt)
    pub equity_fraction: Decimal,
    pub debt_rate_pct: Percent,
    pub loan_term_years: u32,
    /// Up-front lender fee, added to the loan amount
    pub loan_fee_pct: Percent,

    // ── Valuation ───────────────────────────────────────────────────
    pub discount_rate_pct: Percent,
    /// Horizon; the projection covers years 0..=project_years
    pub project_years: u32,
    /// Calendar year of year index 0
    pub start_year: i32,

    // ── Fleet rollout ───────────────────────────────────────────────
    pub unit_count: u32,
    /// Cost of unit 2 relative to unit 1 (0.9 = 10% learning)
    pub learning_rate: Decimal,
    /// Units brought online per year after the first
    pub units_per_year: Decimal,
}

impl ScenarioInputs {
    /// First-of-fleet capital cost of one unit.
    pub fn base_unit_cost(&self) -> ChpFleetResult<Money> {
        checked_sum(
            "base unit cost",
            &[self.equipment_cost, self.ancillary_equipment_cost, self.installation_cost],
        )
    }

    /// Electricity generated by one unit in a year (kWh).
    pub fn annual_energy_kwh(&self) -> ChpFleetResult<Decimal> {
        checked_product(
            "annual energy per unit",
            &[self.electrical_output_kw, HOURS_PER_YEAR, self.availability],
        )
    }

    /// Heat recovered by one unit in a year (kWh thermal).
    pub fn annual_heat_kwh(&self) -> ChpFleetResult<Decimal> {
        checked_product(
            "annual heat per unit",
            &[self.thermal_output_kw, HOURS_PER_YEAR, self.availability],
        )
    }

    /// Feedstock processed by one unit in a year (tonnes).
    pub fn annual_throughput_tonnes(&self) -> ChpFleetResult<Decimal> {
        checked_product(
            "annual throughput per unit",
            &[self.feedstock_tonnes_per_day, DAYS_PER_YEAR, self.availability],
        )
    }

    /// Creditable offsets per unit per year, floored at zero.
    pub fn net_carbon_credits(&self) -> ChpFleetResult<Decimal> {
        let offsets = checked_sum(
            "carbon offsets",
            &[self.methane_offset_tco2e, self.fuel_offset_tco2e],
        )?;
        let net = checked_difference("net carbon credits", offsets, self.project_emissions_tco2e)?;
        Ok(net.max(Decimal::ZERO))
    }

    /// Apply a partial override set, returning a new input struct.
    ///
    /// Every `Some` field in `overrides` replaces the corresponding field;
    /// everything else is carried over unchanged.
    pub fn with_overrides(&self, overrides: &ScenarioOverrides) -> ScenarioInputs {
        let mut next = self.clone();

        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = overrides.$field {
                        next.$field = value;
                    }
                )*
            };
        }

        apply!(
            electrical_output_kw,
            thermal_output_kw,
            availability,
            feedstock_tonnes_per_day,
            power_rate,
            power_utilization,
            power_escalation_pct,
            thermal_rate,
            thermal_utilization,
            thermal_escalation_pct,
            tipping_fee,
            tipping_escalation_pct,
            available_waste_tonnes,
            methane_offset_tco2e,
            fuel_offset_tco2e,
            project_emissions_tco2e,
            carbon_price,
            carbon_escalation_pct,
            baseline_electricity_rate,
            baseline_heat_rate,
            baseline_disposal_fee,
            equipment_cost,
            ancillary_equipment_cost,
            installation_cost,
            maintenance_rate,
            fuel_processing_rate,
            insurance_per_unit,
            management_per_unit,
            opex_escalation_pct,
            equity_fraction,
            debt_rate_pct,
            loan_term_years,
            loan_fee_pct,
            discount_rate_pct,
            project_years,
            start_year,
            unit_count,
            learning_rate,
            units_per_year,
        );

        next
    }
}

/// Partial scenario used to layer a preset or user edits over a base case.
///
/// Missing fields deserialize as `None` and leave the base value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electrical_output_kw: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal_output_kw: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedstock_tonnes_per_day: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_rate: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_utilization: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_escalation_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal_rate: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal_utilization: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thermal_escalation_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipping_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipping_escalation_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_waste_tonnes: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methane_offset_tco2e: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_offset_tco2e: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_emissions_tco2e: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_escalation_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_electricity_rate: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_heat_rate: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_disposal_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment_cost: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancillary_equipment_cost: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_cost: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_rate: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_processing_rate: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_per_unit: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_per_unit: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opex_escalation_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_fraction: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_rate_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_fee_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate_pct: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_per_year: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// A ten-unit rollout with 70% debt, used across the crate's tests.
#[cfg(test)]
pub(crate) fn standard_scenario() -> ScenarioInputs {
    ScenarioInputs {
        electrical_output_kw: dec!(100),
        thermal_output_kw: dec!(200),
        availability: dec!(0.92),
        feedstock_tonnes_per_day: dec!(3),
        power_rate: dec!(0.12),
        power_utilization: dec!(0.95),
        power_escalation_pct: dec!(2.5),
        thermal_rate: dec!(0.04),
        thermal_utilization: dec!(0.70),
        thermal_escalation_pct: dec!(2),
        tipping_fee: dec!(45),
        tipping_escalation_pct: dec!(2),
        available_waste_tonnes: dec!(20_000),
        methane_offset_tco2e: dec!(500),
        fuel_offset_tco2e: dec!(150),
        project_emissions_tco2e: dec!(50),
        carbon_price: dec!(15),
        carbon_escalation_pct: dec!(3),
        baseline_electricity_rate: dec!(0.16),
        baseline_heat_rate: dec!(0.06),
        baseline_disposal_fee: dec!(65),
        equipment_cost: dec!(450_000),
        ancillary_equipment_cost: dec!(120_000),
        installation_cost: dec!(80_000),
        maintenance_rate: dec!(0.02),
        fuel_processing_rate: dec!(8),
        insurance_per_unit: dec!(6_500),
        management_per_unit: dec!(12_000),
        opex_escalation_pct: dec!(2.5),
        equity_fraction: dec!(0.30),
        debt_rate_pct: dec!(7),
        loan_term_years: 10,
        loan_fee_pct: dec!(1.5),
        discount_rate_pct: dec!(8),
        project_years: 20,
        start_year: 2026,
        unit_count: 10,
        learning_rate: dec!(0.90),
        units_per_year: dec!(4),
    }
}

/// One unit selling 100 kW of power at 0.10 with everything else zeroed.
#[cfg(test)]
pub(crate) fn single_unit_power_scenario() -> ScenarioInputs {
    ScenarioInputs {
        electrical_output_kw: dec!(100),
        thermal_output_kw: Decimal::ZERO,
        availability: Decimal::ONE,
        feedstock_tonnes_per_day: Decimal::ZERO,
        power_rate: dec!(0.10),
        power_utilization: Decimal::ONE,
        power_escalation_pct: Decimal::ZERO,
        thermal_rate: Decimal::ZERO,
        thermal_utilization: Decimal::ZERO,
        thermal_escalation_pct: Decimal::ZERO,
        tipping_fee: Decimal::ZERO,
        tipping_escalation_pct: Decimal::ZERO,
        available_waste_tonnes: Decimal::ZERO,
        methane_offset_tco2e: Decimal::ZERO,
        fuel_offset_tco2e: Decimal::ZERO,
        project_emissions_tco2e: Decimal::ZERO,
        carbon_price: Decimal::ZERO,
        carbon_escalation_pct: Decimal::ZERO,
        baseline_electricity_rate: Decimal::ZERO,
        baseline_heat_rate: Decimal::ZERO,
        baseline_disposal_fee: Decimal::ZERO,
        equipment_cost: Decimal::ZERO,
        ancillary_equipment_cost: Decimal::ZERO,
        installation_cost: Decimal::ZERO,
        maintenance_rate: Decimal::ZERO,
        fuel_processing_rate: Decimal::ZERO,
        insurance_per_unit: Decimal::ZERO,
        management_per_unit: Decimal::ZERO,
        opex_escalation_pct: Decimal::ZERO,
        equity_fraction: Decimal::ONE,
        debt_rate_pct: Decimal::ZERO,
        loan_term_years: 0,
        loan_fee_pct: Decimal::ZERO,
        discount_rate_pct: Decimal::ZERO,
        project_years: 1,
        start_year: 2026,
        unit_count: 1,
        learning_rate: Decimal::ONE,
        units_per_year: Decimal::ONE,
    }
}
