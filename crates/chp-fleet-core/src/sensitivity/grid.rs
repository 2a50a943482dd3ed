use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ChpFleetError;
use crate::model::evaluate;
use crate::scenario::ScenarioInputs;
use crate::types::Money;
use crate::ChpFleetResult;

use super::SensitivityParameter;

/// Most values a single sweep axis may produce.
pub const MAX_SWEEP_POINTS: usize = 500;

/// One axis of a two-way sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub parameter: SensitivityParameter,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// NPV over every combination of two swept parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpvGrid {
    pub variable_1: SensitivityParameter,
    pub variable_2: SensitivityParameter,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    /// matrix[i][j] = NPV at variable_1_values[i], variable_2_values[j]
    pub matrix: Vec<Vec<Money>>,
    /// NPV of the unmodified scenario
    pub base_npv: Money,
    /// Cell nearest the scenario's own values (row, col)
    pub base_case_position: (usize, usize),
}

/// Values from `min` to `max` by `step`, with `max` appended if the step
/// does not land on it. Axes longer than [`MAX_SWEEP_POINTS`] are rejected.
fn generate_sweep_values(axis: &SweepAxis) -> ChpFleetResult<Vec<Decimal>> {
    if axis.step <= Decimal::ZERO {
        return Err(ChpFleetError::InvalidInput {
            field: format!("variable:{}", axis.parameter.key()),
            reason: "Step must be positive".into(),
        });
    }
    if axis.min > axis.max {
        return Err(ChpFleetError::InvalidInput {
            field: format!("variable:{}", axis.parameter.key()),
            reason: "Min must be <= max".into(),
        });
    }

    let too_many = || ChpFleetError::InvalidInput {
        field: format!("variable:{}", axis.parameter.key()),
        reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
    };

    let mut values = Vec::new();
    let mut current = Some(axis.min);
    while let Some(value) = current.filter(|v| *v <= axis.max) {
        if values.len() == MAX_SWEEP_POINTS {
            return Err(too_many());
        }
        values.push(value);
        current = value.checked_add(axis.step);
    }
    if let Some(&last) = values.last() {
        if last < axis.max {
            if values.len() == MAX_SWEEP_POINTS {
                return Err(too_many());
            }
            values.push(axis.max);
        }
    }

    Ok(values)
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| v.checked_sub(target).map_or(Decimal::MAX, |d| d.abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate the full model at every (axis_1, axis_2) combination.
///
/// Both axes are validated before any model run.
pub fn npv_grid(
    inputs: &ScenarioInputs,
    axis_1: &SweepAxis,
    axis_2: &SweepAxis,
) -> ChpFleetResult<NpvGrid> {
    let v1_values = generate_sweep_values(axis_1)?;
    let v2_values = generate_sweep_values(axis_2)?;

    let base_npv = evaluate(inputs)?.npv;

    let mut matrix = Vec::with_capacity(v1_values.len());
    for v1 in &v1_values {
        let row_inputs = axis_1.parameter.with_value(inputs, *v1);
        let row = v2_values
            .iter()
            .map(|v2| {
                let cell = axis_2.parameter.with_value(&row_inputs, *v2);
                evaluate(&cell).map(|r| r.npv)
            })
            .collect::<ChpFleetResult<Vec<_>>>()?;
        matrix.push(row);
    }

    let base_row = closest_index(&v1_values, axis_1.parameter.value(inputs));
    let base_col = closest_index(&v2_values, axis_2.parameter.value(inputs));

    tracing::debug!(
        rows = v1_values.len(),
        cols = v2_values.len(),
        "npv grid evaluated"
    );

    Ok(NpvGrid {
        variable_1: axis_1.parameter,
        variable_2: axis_2.parameter,
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        matrix,
        base_npv,
        base_case_position: (base_row, base_col),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::standard_scenario;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn power_axis() -> SweepAxis {
        SweepAxis {
            parameter: SensitivityParameter::PowerRate,
            min: dec!(0.10),
            max: dec!(0.14),
            step: dec!(0.01),
        }
    }

    fn discount_axis() -> SweepAxis {
        SweepAxis {
            parameter: SensitivityParameter::DiscountRate,
            min: dec!(6),
            max: dec!(10),
            step: dec!(2),
        }
    }

    #[test]
    fn test_sweep_values_inclusive() {
        let values = generate_sweep_values(&power_axis()).unwrap();
        assert_eq!(
            values,
            vec![dec!(0.10), dec!(0.11), dec!(0.12), dec!(0.13), dec!(0.14)]
        );
    }

    #[test]
    fn test_sweep_appends_max() {
        let axis = SweepAxis {
            step: dec!(0.03),
            ..power_axis()
        };
        let values = generate_sweep_values(&axis).unwrap();
        assert_eq!(values, vec![dec!(0.10), dec!(0.13), dec!(0.14)]);
    }

    #[test]
    fn test_single_point_axis() {
        let axis = SweepAxis {
            min: dec!(0.12),
            max: dec!(0.12),
            ..power_axis()
        };
        assert_eq!(generate_sweep_values(&axis).unwrap(), vec![dec!(0.12)]);
    }

    #[test]
    fn test_invalid_axes_rejected() {
        let zero_step = SweepAxis {
            step: Decimal::ZERO,
            ..power_axis()
        };
        assert!(matches!(
            npv_grid(&standard_scenario(), &zero_step, &discount_axis()),
            Err(ChpFleetError::InvalidInput { .. })
        ));

        let inverted = SweepAxis {
            min: dec!(0.2),
            ..power_axis()
        };
        assert!(matches!(
            generate_sweep_values(&inverted),
            Err(ChpFleetError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_oversized_sweep_rejected_before_evaluation() {
        let dense = SweepAxis {
            min: Decimal::ZERO,
            max: dec!(1_000_000),
            step: dec!(0.000001),
            ..power_axis()
        };
        assert!(matches!(
            generate_sweep_values(&dense),
            Err(ChpFleetError::InvalidInput { .. })
        ));
        assert!(matches!(
            npv_grid(&standard_scenario(), &power_axis(), &dense),
            Err(ChpFleetError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_sweep_at_point_limit_accepted() {
        let axis = SweepAxis {
            min: dec!(1),
            max: Decimal::from(MAX_SWEEP_POINTS),
            step: Decimal::ONE,
            ..power_axis()
        };
        assert_eq!(generate_sweep_values(&axis).unwrap().len(), MAX_SWEEP_POINTS);

        let one_more = SweepAxis {
            max: Decimal::from(MAX_SWEEP_POINTS + 1),
            ..axis
        };
        assert!(generate_sweep_values(&one_more).is_err());
    }

    #[test]
    fn test_grid_shape_and_base_cell() {
        let inputs = standard_scenario();
        let grid = npv_grid(&inputs, &power_axis(), &discount_axis()).unwrap();
        assert_eq!(grid.matrix.len(), 5);
        assert!(grid.matrix.iter().all(|row| row.len() == 3));

        // power 0.12 and discount 8% are the scenario's own values
        assert_eq!(grid.base_case_position, (2, 1));
        assert_eq!(grid.matrix[2][1], grid.base_npv);
        assert_eq!(grid.base_npv, evaluate(&inputs).unwrap().npv);
    }

    #[test]
    fn test_grid_monotone_along_each_axis() {
        let grid = npv_grid(&standard_scenario(), &power_axis(), &discount_axis()).unwrap();
        for row in &grid.matrix {
            assert!(row.windows(2).all(|w| w[0] > w[1]));
        }
        for j in 0..grid.variable_2_values.len() {
            assert!(grid.matrix.windows(2).all(|w| w[0][j] < w[1][j]));
        }
    }
}
