use std::time::Instant;

use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use chp_fleet_core::sensitivity::{self, SweepAxis};
use chp_fleet_core::types::with_metadata;
use chp_fleet_core::{ScenarioInputs, ScenarioOverrides};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct OverrideRequest {
    base: ScenarioInputs,
    #[serde(default)]
    overrides: ScenarioOverrides,
}

#[derive(Deserialize)]
struct GridRequest {
    scenario: ScenarioInputs,
    variable_1: SweepAxis,
    variable_2: SweepAxis,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_scenario(input_json: String) -> NapiResult<String> {
    let input: ScenarioInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let start = Instant::now();
    let result = chp_fleet_core::evaluate(&input).map_err(to_napi_error)?;
    let output = with_metadata(
        "Fleet DCF projection with learning-curve capex, amortized debt and bisection IRR",
        &serde_json::json!({
            "unit_count": input.unit_count,
            "project_years": input.project_years,
            "discount_rate_pct": input.discount_rate_pct,
        }),
        result.warnings.clone(),
        start.elapsed().as_micros() as u64,
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn apply_overrides(input_json: String) -> NapiResult<String> {
    let input: OverrideRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let scenario = input.base.with_overrides(&input.overrides);
    serde_json::to_string(&scenario).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn run_sensitivity(input_json: String) -> NapiResult<String> {
    let input: ScenarioInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let start = Instant::now();
    let result = sensitivity::tornado(&input).map_err(to_napi_error)?;
    let output = with_metadata(
        "One-at-a-time NPV sensitivity (tornado)",
        &serde_json::json!({
            "downside_factor": sensitivity::tornado::DOWNSIDE_FACTOR,
            "upside_factor": sensitivity::tornado::UPSIDE_FACTOR,
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_npv_grid(input_json: String) -> NapiResult<String> {
    let input: GridRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let start = Instant::now();
    let grid = sensitivity::npv_grid(&input.scenario, &input.variable_1, &input.variable_2)
        .map_err(to_napi_error)?;
    let output = with_metadata(
        "2-Way NPV Sensitivity Grid",
        &serde_json::json!({
            "variable_1": input.variable_1,
            "variable_2": input.variable_2,
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        grid,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}
