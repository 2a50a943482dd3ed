use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use chp_fleet_core::time_value::{npv, pct_to_rate};
use chp_fleet_core::types::{with_metadata, Money, Percent, Rate};
use chp_fleet_core::valuation::irr::{IRR_LOWER_BOUND, IRR_UPPER_BOUND};
use chp_fleet_core::valuation::solve_irr;

/// Arguments for a standalone IRR calculation
#[derive(Args)]
pub struct IrrArgs {
    /// Yearly cash flows starting at t = 0 (comma-separated, e.g. "-100,60,60")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub cash_flows: Vec<Decimal>,

    /// Also report NPV at this discount rate (percent, e.g. 8)
    #[arg(long)]
    pub discount_rate_pct: Option<Percent>,
}

#[derive(Debug, Serialize)]
struct IrrOutput {
    irr: Option<Rate>,
    npv: Option<Money>,
    periods: usize,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let irr = solve_irr(&args.cash_flows);
    let npv = args
        .discount_rate_pct
        .map(|pct| npv(pct_to_rate(pct), &args.cash_flows))
        .transpose()?;

    let mut warnings = Vec::new();
    if irr.is_none() {
        warnings.push(format!(
            "IRR undetermined: no sign change between {} and {}",
            IRR_LOWER_BOUND, IRR_UPPER_BOUND
        ));
    }

    let output = IrrOutput {
        irr,
        npv,
        periods: args.cash_flows.len(),
    };
    let elapsed = start.elapsed().as_micros() as u64;
    let envelope = with_metadata(
        "Bisection IRR",
        &serde_json::json!({
            "lower_bound": IRR_LOWER_BOUND,
            "upper_bound": IRR_UPPER_BOUND,
            "discount_rate_pct": args.discount_rate_pct,
        }),
        warnings,
        elapsed,
        output,
    );
    Ok(serde_json::to_value(envelope)?)
}
