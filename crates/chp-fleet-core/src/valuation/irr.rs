use std::cmp::Ordering;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Lowest rate searched.
pub const IRR_LOWER_BOUND: Rate = dec!(-0.5);
/// Highest rate searched.
pub const IRR_UPPER_BOUND: Rate = dec!(2.0);
pub const IRR_MAX_ITERATIONS: u32 = 100;
/// Bracket width at which the search stops.
pub const IRR_TOLERANCE: Rate = dec!(0.0001);
/// A result this close to either bound means no sign change was found.
pub const IRR_EDGE_MARGIN: Rate = dec!(0.01);

/// Search parameters for [`solve_irr_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BisectionConfig {
    pub lower: Rate,
    pub upper: Rate,
    pub max_iterations: u32,
    pub tolerance: Rate,
    pub edge_margin: Rate,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        BisectionConfig {
            lower: IRR_LOWER_BOUND,
            upper: IRR_UPPER_BOUND,
            max_iterations: IRR_MAX_ITERATIONS,
            tolerance: IRR_TOLERANCE,
            edge_margin: IRR_EDGE_MARGIN,
        }
    }
}

/// IRR of a yearly cash-flow sequence (first flow at t = 0) by bisection
/// over [-50%, 200%]. `None` when no root lies inside the bracket.
pub fn solve_irr(cash_flows: &[Money]) -> Option<Rate> {
    solve_irr_with(cash_flows, &BisectionConfig::default())
}

/// Bisection with explicit bracket, iteration cap and tolerance.
///
/// NPV is assumed to fall as the rate rises: a positive NPV at the midpoint
/// moves the lower bound up, anything else moves the upper bound down. When
/// every flow shares a sign the search runs into one end of the bracket, so
/// a converged rate within `edge_margin` of either initial bound is
/// reported as undetermined.
pub fn solve_irr_with(cash_flows: &[Money], config: &BisectionConfig) -> Option<Rate> {
    let mut low = config.lower;
    let mut high = config.upper;

    for _ in 0..config.max_iterations {
        let mid = (low + high) / dec!(2);
        if npv_at(mid, cash_flows) > Decimal::ZERO {
            low = mid;
        } else {
            high = mid;
        }
        if high - low < config.tolerance {
            break;
        }
    }

    let rate = (low + high) / dec!(2);
    let at_lower_edge = (rate - config.lower).abs() < config.edge_margin;
    let at_upper_edge = (config.upper - rate).abs() < config.edge_margin;

    tracing::trace!(rate = %rate, at_lower_edge, at_upper_edge, "irr bisection finished");

    if at_lower_edge || at_upper_edge {
        None
    } else {
        Some(rate)
    }
}

/// `Σ cf[t] / (1 + rate)^t`, saturating instead of failing.
///
/// Only the sign of this value drives the bisection, so a discount factor
/// that grows past the decimal range ends the sum (later terms vanish) and
/// one that decays to nothing saturates toward the sign of the flow it can
/// no longer discount.
pub fn npv_at(rate: Rate, cash_flows: &[Money]) -> Money {
    let one_plus_r = Decimal::ONE + rate;
    let mut total = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) if !d.is_zero() => discount = d,
                Some(_) => return saturate(remaining_sign(&cash_flows[t..]), total),
                None => break,
            }
        }
        let term = match cf.checked_div(discount) {
            Some(term) => term,
            None => return saturate(sign_of(*cf), total),
        };
        total = match total.checked_add(term) {
            Some(sum) => sum,
            None => return saturate(sign_of(term), total),
        };
    }

    total
}

fn sign_of(value: Decimal) -> Ordering {
    value.cmp(&Decimal::ZERO)
}

fn remaining_sign(cash_flows: &[Money]) -> Ordering {
    cash_flows
        .iter()
        .find(|cf| !cf.is_zero())
        .map_or(Ordering::Equal, |cf| sign_of(*cf))
}

fn saturate(sign: Ordering, fallback: Money) -> Money {
    match sign {
        Ordering::Greater => Decimal::MAX,
        Ordering::Less => Decimal::MIN,
        Ordering::Equal => fallback,
    }
}
