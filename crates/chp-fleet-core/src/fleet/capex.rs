use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ChpFleetError;
use crate::time_value::checked_sum;
use crate::types::Money;
use crate::ChpFleetResult;

/// Capital cost of every unit in the fleet, in deployment order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetCapex {
    /// First-of-fleet unit cost (equipment + ancillary + install)
    pub base_unit_cost: Money,
    /// Learning exponent b = log(LR) / log(2); `None` when LR <= 0
    pub learning_exponent: Option<Decimal>,
    /// Cost of unit n at index n - 1
    pub unit_costs: Vec<Money>,
    /// Sum of `unit_costs`
    pub fleet_total: Money,
}

impl FleetCapex {
    /// Sum of the costs of units `from + 1 ..= to` (1-based, inclusive).
    ///
    /// Used to recognize capital for the units newly deployed in a year.
    pub fn cost_of_units(&self, from: u32, to: u32) -> ChpFleetResult<Money> {
        let start = (from as usize).min(self.unit_costs.len());
        let end = (to as usize).min(self.unit_costs.len());
        if end <= start {
            return Ok(Decimal::ZERO);
        }
        checked_sum("capital of deployed units", &self.unit_costs[start..end])
    }
}

/// Build the learning-curve cost schedule for a fleet of `unit_count` units.
///
/// `cost(n) = base · n^b` with `b = log(LR)/log(2)`, so every doubling of
/// cumulative units multiplies cost by `LR`. Power-of-two indices are
/// evaluated as `base · LR^k` and are exact; unit 1 is always `base` and
/// unit 2 is always `base · LR`. A learning rate of 1 or more is accepted.
/// A learning rate of zero or below has no logarithm and is treated as the
/// LR -> 0 limit: every unit after the first costs nothing.
pub fn schedule_unit_costs(
    base_unit_cost: Money,
    unit_count: u32,
    learning_rate: Decimal,
) -> ChpFleetResult<FleetCapex> {
    let learning_exponent = if learning_rate == Decimal::ONE {
        Some(Decimal::ZERO)
    } else if learning_rate > Decimal::ZERO {
        Some(learning_rate.ln() / dec!(2).ln())
    } else {
        None
    };

    let unit_costs = (1..=unit_count)
        .map(|n| unit_cost(base_unit_cost, n, learning_rate, learning_exponent))
        .collect::<ChpFleetResult<Vec<Money>>>()?;

    let fleet_total = checked_sum("fleet capital", &unit_costs)?;

    Ok(FleetCapex {
        base_unit_cost,
        learning_exponent,
        unit_costs,
        fleet_total,
    })
}

/// Cost of the n-th unit (1-based).
fn unit_cost(
    base: Money,
    n: u32,
    learning_rate: Decimal,
    exponent: Option<Decimal>,
) -> ChpFleetResult<Money> {
    if n == 1 {
        return Ok(base);
    }

    let Some(b) = exponent else {
        return Ok(Decimal::ZERO);
    };
    if b.is_zero() {
        return Ok(base);
    }

    let factor = if n.is_power_of_two() {
        // n = 2^k  =>  n^b = LR^k
        learning_rate.checked_powi(i64::from(n.trailing_zeros()))
    } else {
        Decimal::from(n).checked_powd(b)
    };

    factor
        .and_then(|f| base.checked_mul(f))
        .ok_or_else(|| ChpFleetError::ArithmeticOverflow {
            context: format!("learning-curve cost of unit {n}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_and_second_unit_exact() {
        let capex = schedule_unit_costs(dec!(650_000), 5, dec!(0.9)).unwrap();
        assert_eq!(capex.unit_costs[0], dec!(650_000));
        assert_eq!(capex.unit_costs[1], dec!(585_000));
    }

    #[test]
    fn test_powers_of_two_follow_learning_rate() {
        let capex = schedule_unit_costs(dec!(1000), 8, dec!(0.8)).unwrap();
        assert_eq!(capex.unit_costs[3], dec!(640)); // unit 4 = 1000 * 0.8^2
        assert_eq!(capex.unit_costs[7], dec!(512)); // unit 8 = 1000 * 0.8^3
    }

    #[test]
    fn test_intermediate_units_between_neighbours() {
        let capex = schedule_unit_costs(dec!(1000), 4, dec!(0.8)).unwrap();
        // unit 3 = 1000 * 3^(log2 0.8) ≈ 702.1
        let u3 = capex.unit_costs[2];
        assert!(u3 < capex.unit_costs[1] && u3 > capex.unit_costs[3]);
        assert!((u3 - dec!(702.1)).abs() < dec!(0.5));
    }

    #[test]
    fn test_one_cost_per_unit_and_total() {
        let capex = schedule_unit_costs(dec!(100), 7, dec!(0.85)).unwrap();
        assert_eq!(capex.unit_costs.len(), 7);
        let sum: Decimal = capex.unit_costs.iter().copied().sum();
        assert_eq!(capex.fleet_total, sum);
    }

    #[test]
    fn test_learning_rate_one_is_flat() {
        let capex = schedule_unit_costs(dec!(250), 6, Decimal::ONE).unwrap();
        assert!(capex.unit_costs.iter().all(|c| *c == dec!(250)));
        assert_eq!(capex.fleet_total, dec!(1500));
    }

    #[test]
    fn test_learning_rate_above_one_rises() {
        let capex = schedule_unit_costs(dec!(100), 4, dec!(1.1)).unwrap();
        assert!(capex.unit_costs.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(capex.unit_costs[1], dec!(110));
    }

    #[test]
    fn test_non_positive_learning_rate_zeroes_followers() {
        let capex = schedule_unit_costs(dec!(100), 3, Decimal::ZERO).unwrap();
        assert_eq!(capex.learning_exponent, None);
        assert_eq!(capex.unit_costs, vec![dec!(100), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_empty_fleet() {
        let capex = schedule_unit_costs(dec!(100), 0, dec!(0.9)).unwrap();
        assert!(capex.unit_costs.is_empty());
        assert_eq!(capex.fleet_total, Decimal::ZERO);
    }

    #[test]
    fn test_cost_of_units_ranges() {
        let capex = schedule_unit_costs(dec!(100), 4, Decimal::ONE).unwrap();
        assert_eq!(capex.cost_of_units(0, 1).unwrap(), dec!(100));
        assert_eq!(capex.cost_of_units(1, 3).unwrap(), dec!(200));
        assert_eq!(capex.cost_of_units(3, 3).unwrap(), Decimal::ZERO);
        assert_eq!(capex.cost_of_units(2, 99).unwrap(), dec!(200));
    }

    #[test]
    fn test_fleet_total_overflow_is_an_error() {
        let result = schedule_unit_costs(Decimal::MAX, 3, Decimal::ONE);
        assert!(matches!(
            result,
            Err(ChpFleetError::ArithmeticOverflow { .. })
        ));
    }
}
