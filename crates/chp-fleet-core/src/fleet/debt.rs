use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ChpFleetError;
use crate::time_value::{checked_difference, checked_product, checked_sum, pct_to_rate, pmt};
use crate::types::{Money, Percent};
use crate::ChpFleetResult;

/// Loan payments are made monthly; debt service is reported annually.
pub const PAYMENTS_PER_YEAR: u32 = 12;

/// How the annual payment was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentProfile {
    /// Monthly-compounded level annuity
    Amortized,
    /// Interest-free: loan amount spread evenly over the term
    StraightLine,
    /// Nothing to repay (no principal or no term)
    NoDebt,
}

/// Financing terms for the debt-funded share of fleet capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTerms {
    /// Fleet capital not covered by equity
    pub principal: Money,
    /// Principal grossed up by the lender fee
    pub loan_amount: Money,
    /// Level payment due in each year of the loan term
    pub annual_payment: Money,
    pub term_years: u32,
    pub profile: RepaymentProfile,
}

/// Size the loan and derive its constant annual payment.
///
/// `principal = fleet_total · (1 − equity_fraction)` and
/// `loan = principal · (1 + fee/100)`. With a positive rate and term the
/// payment is the monthly annuity times twelve; a zero rate falls back to
/// straight-line; no principal (including a negative one from an equity
/// fraction above 1) or no term means no payment.
pub fn size_debt(
    fleet_total: Money,
    equity_fraction: Decimal,
    debt_rate_pct: Percent,
    term_years: u32,
    loan_fee_pct: Percent,
) -> ChpFleetResult<DebtTerms> {
    let debt_share = checked_difference("debt share", Decimal::ONE, equity_fraction)?;
    let principal = checked_product("loan principal", &[fleet_total, debt_share])?;
    let fee_factor = checked_sum("loan fee factor", &[Decimal::ONE, loan_fee_pct / dec!(100)])?;
    let loan_amount = checked_product("loan amount", &[principal, fee_factor])?;

    let (annual_payment, profile) = if principal <= Decimal::ZERO || term_years == 0 {
        (Decimal::ZERO, RepaymentProfile::NoDebt)
    } else if debt_rate_pct > Decimal::ZERO {
        let monthly_rate = pct_to_rate(debt_rate_pct) / Decimal::from(PAYMENTS_PER_YEAR);
        let months = term_years * PAYMENTS_PER_YEAR;
        let monthly = -pmt(monthly_rate, months, loan_amount, Decimal::ZERO)?;
        (
            checked_product("annual payment", &[monthly, Decimal::from(PAYMENTS_PER_YEAR)])?,
            RepaymentProfile::Amortized,
        )
    } else {
        let straight_line = loan_amount
            .checked_div(Decimal::from(term_years))
            .ok_or_else(|| ChpFleetError::ArithmeticOverflow {
                context: "straight-line payment".into(),
            })?;
        (straight_line, RepaymentProfile::StraightLine)
    };

    Ok(DebtTerms {
        principal,
        loan_amount,
        annual_payment,
        term_years,
        profile,
    })
}
