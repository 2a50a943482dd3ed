use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use chp_fleet_core::sensitivity::tornado::{DOWNSIDE_FACTOR, UPSIDE_FACTOR};
use chp_fleet_core::sensitivity::{npv_grid, tornado, SensitivityParameter, SweepAxis};
use chp_fleet_core::types::with_metadata;

use super::load_scenario;

/// Arguments for the one-at-a-time sensitivity sweep
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to scenario file (JSON or YAML); reads stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a partial scenario layered over the input
    #[arg(long)]
    pub overrides: Option<String>,
}

/// Arguments for a two-way NPV grid
#[derive(Args)]
pub struct NpvGridArgs {
    /// Path to scenario file (JSON or YAML); reads stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a partial scenario layered over the input
    #[arg(long)]
    pub overrides: Option<String>,

    /// First swept parameter in format name:min:max:step
    /// (e.g. "power_rate:0.10:0.14:0.01")
    #[arg(long)]
    pub var1: String,

    /// Second swept parameter in format name:min:max:step
    /// (e.g. "discount_rate_pct:6:10:1")
    #[arg(long)]
    pub var2: String,
}

fn parse_sweep_axis(spec: &str) -> Result<SweepAxis, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sweep variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    let number = |raw: &str| -> Result<Decimal, Box<dyn std::error::Error>> {
        let value = raw
            .trim()
            .parse::<Decimal>()
            .map_err(|e| format!("Invalid number '{}' in '{}': {}", raw, spec, e))?;
        Ok(value)
    };
    Ok(SweepAxis {
        parameter: parts[0].parse::<SensitivityParameter>()?,
        min: number(parts[1])?,
        max: number(parts[2])?,
        step: number(parts[3])?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_scenario(args.input.as_deref(), args.overrides.as_deref())?;

    let start = Instant::now();
    let result = tornado(&inputs)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let tracked: Vec<&str> = SensitivityParameter::TRACKED
        .iter()
        .map(|p| p.key())
        .collect();
    let output = with_metadata(
        "One-at-a-time NPV sensitivity (tornado)",
        &serde_json::json!({
            "downside_factor": DOWNSIDE_FACTOR,
            "upside_factor": UPSIDE_FACTOR,
            "parameters": tracked,
            "clamped": false,
        }),
        Vec::new(),
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_npv_grid(args: NpvGridArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let axis_1 = parse_sweep_axis(&args.var1)?;
    let axis_2 = parse_sweep_axis(&args.var2)?;
    let inputs = load_scenario(args.input.as_deref(), args.overrides.as_deref())?;

    let start = Instant::now();
    let grid = npv_grid(&inputs, &axis_1, &axis_2)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let mut warnings = Vec::new();
    if axis_1.parameter == axis_2.parameter {
        warnings.push(format!(
            "Both axes sweep '{}'; the second axis overrides the first",
            axis_1.parameter.key()
        ));
    }

    let output = with_metadata(
        "2-Way NPV Sensitivity Grid",
        &serde_json::json!({
            "variable_1": axis_1,
            "variable_2": axis_2,
        }),
        warnings,
        elapsed,
        grid,
    );
    Ok(serde_json::to_value(output)?)
}
