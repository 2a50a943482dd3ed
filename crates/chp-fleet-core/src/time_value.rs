use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ChpFleetError;
use crate::types::{Money, Percent, Rate};
use crate::ChpFleetResult;

/// Convert a percentage input (5 = 5%) to a decimal rate (0.05).
pub fn pct_to_rate(pct: Percent) -> Rate {
    pct / dec!(100)
}

/// Compounding factor `(1 + rate)^periods`.
pub fn compound_factor(rate: Rate, periods: u32) -> ChpFleetResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| ChpFleetError::ArithmeticOverflow {
            context: format!("compounding {rate} over {periods} periods"),
        })
}

/// Escalate a year-0 price by a percentage growth rate over `years`.
pub fn escalate(base: Money, escalation_pct: Percent, years: u32) -> ChpFleetResult<Money> {
    let factor = compound_factor(pct_to_rate(escalation_pct), years)?;
    base.checked_mul(factor)
        .ok_or_else(|| ChpFleetError::ArithmeticOverflow {
            context: format!("escalating {base} at {escalation_pct}% for {years} years"),
        })
}

fn overflow(context: &str) -> ChpFleetError {
    ChpFleetError::ArithmeticOverflow {
        context: context.to_string(),
    }
}

/// Product of `factors`, or `ArithmeticOverflow` naming `context` if any
/// partial product leaves the decimal range.
pub fn checked_product(context: &str, factors: &[Decimal]) -> ChpFleetResult<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(*f))
        .ok_or_else(|| overflow(context))
}

/// Sum of `terms`, or `ArithmeticOverflow` naming `context`.
pub fn checked_sum(context: &str, terms: &[Decimal]) -> ChpFleetResult<Decimal> {
    terms
        .iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(*t))
        .ok_or_else(|| overflow(context))
}

/// `a - b`, or `ArithmeticOverflow` naming `context`.
pub fn checked_difference(context: &str, a: Decimal, b: Decimal) -> ChpFleetResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}

/// Net Present Value of a series of cash flows, first flow at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ChpFleetResult<Money> {
    if rate <= dec!(-1) {
        return Err(ChpFleetError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                ChpFleetError::ArithmeticOverflow {
                    context: format!("NPV discount factor at period {t}"),
                }
            })?;
        }
        result = cf
            .checked_div(discount)
            .and_then(|term| result.checked_add(term))
            .ok_or_else(|| overflow("NPV accumulation"))?;
    }

    Ok(result)
}

/// Payment (PMT), spreadsheet sign convention: a positive present value
/// yields a negative payment.
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> ChpFleetResult<Money> {
    if nper == 0 {
        return Err(ChpFleetError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        let total = checked_sum("PMT principal", &[present_value, future_value])?;
        return Ok(-total / Decimal::from(nper));
    }

    let factor = compound_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| overflow("PMT annuity factor"))?;

    if annuity_factor.is_zero() {
        return Err(ChpFleetError::InvalidInput {
            field: "rate".into(),
            reason: "PMT annuity factor is zero".into(),
        });
    }

    let grown = checked_product("PMT future value", &[present_value, factor])?;
    let owed = checked_sum("PMT future value", &[grown, future_value])?;
    owed.checked_div(annuity_factor)
        .map(|payment| -payment)
        .ok_or_else(|| overflow("PMT payment"))
}
