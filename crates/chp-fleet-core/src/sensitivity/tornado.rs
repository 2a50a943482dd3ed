use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::evaluate;
use crate::scenario::ScenarioInputs;
use crate::time_value::checked_difference;
use crate::types::Money;
use crate::ChpFleetResult;

use super::SensitivityParameter;

/// Multiplier for the downside case (−20%).
pub const DOWNSIDE_FACTOR: Decimal = dec!(0.8);

/// Multiplier for the upside case (+20%).
pub const UPSIDE_FACTOR: Decimal = dec!(1.2);

/// NPV response to one parameter moved ±20%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub parameter: SensitivityParameter,
    pub label: String,
    /// Parameter value in the unperturbed scenario
    pub base_value: Decimal,
    /// NPV(parameter × 0.8) − base NPV
    pub npv_delta_low: Money,
    /// NPV(parameter × 1.2) − base NPV
    pub npv_delta_high: Money,
    /// |npv_delta_high − npv_delta_low|
    pub range: Money,
}

/// Rows ordered for a tornado chart, with the NPV they are measured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tornado {
    pub base_npv: Money,
    pub rows: Vec<SensitivityRow>,
}

/// One-at-a-time ±20% sweep over every tracked parameter.
///
/// The baseline NPV is computed once; each perturbed copy is an independent
/// full model run. Rows come back widest swing first.
pub fn sensitivity(inputs: &ScenarioInputs) -> ChpFleetResult<Vec<SensitivityRow>> {
    Ok(tornado(inputs)?.rows)
}

/// [`sensitivity`] plus the baseline NPV the deltas are measured against.
pub fn tornado(inputs: &ScenarioInputs) -> ChpFleetResult<Tornado> {
    let base_npv = evaluate(inputs)?.npv;

    let mut rows = SensitivityParameter::TRACKED
        .into_iter()
        .map(|parameter| sweep_parameter(inputs, parameter, base_npv))
        .collect::<ChpFleetResult<Vec<_>>>()?;

    // Stable: equal swings keep their tracked order.
    rows.sort_by(|a, b| b.range.cmp(&a.range));

    Ok(Tornado { base_npv, rows })
}

fn sweep_parameter(
    inputs: &ScenarioInputs,
    parameter: SensitivityParameter,
    base_npv: Money,
) -> ChpFleetResult<SensitivityRow> {
    let low_npv = evaluate(&parameter.scaled(inputs, DOWNSIDE_FACTOR)?)?.npv;
    let high_npv = evaluate(&parameter.scaled(inputs, UPSIDE_FACTOR)?)?.npv;

    let npv_delta_low = checked_difference("downside NPV delta", low_npv, base_npv)?;
    let npv_delta_high = checked_difference("upside NPV delta", high_npv, base_npv)?;
    let range = checked_difference("NPV swing", npv_delta_high, npv_delta_low)?.abs();

    debug!(
        parameter = parameter.key(),
        delta_low = %npv_delta_low,
        delta_high = %npv_delta_high,
        "sensitivity sweep"
    );

    Ok(SensitivityRow {
        parameter,
        label: parameter.label().to_string(),
        base_value: parameter.value(inputs),
        npv_delta_low,
        npv_delta_high,
        range,
    })
}
