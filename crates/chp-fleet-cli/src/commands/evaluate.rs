use clap::Args;
use serde_json::Value;
use std::time::Instant;

use chp_fleet_core::evaluate;
use chp_fleet_core::projection::FIXED_COST_ESCALATION_PCT;
use chp_fleet_core::types::with_metadata;

use super::load_scenario;

/// Arguments for a full feasibility run
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to scenario file (JSON or YAML); reads stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a partial scenario layered over the input
    #[arg(long)]
    pub overrides: Option<String>,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_scenario(args.input.as_deref(), args.overrides.as_deref())?;

    let start = Instant::now();
    let result = evaluate(&inputs)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let output = with_metadata(
        "Fleet DCF projection with learning-curve capex, amortized debt and bisection IRR",
        &serde_json::json!({
            "unit_count": inputs.unit_count,
            "project_years": inputs.project_years,
            "discount_rate_pct": inputs.discount_rate_pct,
            "learning_rate": inputs.learning_rate,
            "fixed_cost_escalation_pct": FIXED_COST_ESCALATION_PCT,
            "year_zero": "build year, no operations",
        }),
        result.warnings.clone(),
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
