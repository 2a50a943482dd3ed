use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Multiple, Percent};

/// Below this coverage the fleet cannot meet its loan payments.
pub const DSCR_DEFAULT_THRESHOLD: Multiple = dec!(1.0);

/// Typical lender covenant floor.
pub const DSCR_COVENANT_THRESHOLD: Multiple = dec!(1.25);

/// A warning raised against a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    NegativeNpv { discount_rate_pct: Percent },
    DebtDefault { min_dscr: Multiple },
    CovenantBreach { min_dscr: Multiple },
}

impl Diagnostic {
    pub fn is_critical(&self) -> bool {
        matches!(self, Diagnostic::DebtDefault { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NegativeNpv { discount_rate_pct } => write!(
                f,
                "NPV negative at discount rate {}%",
                discount_rate_pct.normalize()
            ),
            Diagnostic::DebtDefault { min_dscr } => write!(
                f,
                "CRITICAL: minimum DSCR of {}x is below {}x; operating cash cannot cover debt service (default risk)",
                min_dscr.round_dp(2),
                DSCR_DEFAULT_THRESHOLD.round_dp(2)
            ),
            Diagnostic::CovenantBreach { min_dscr } => write!(
                f,
                "Minimum DSCR of {}x is below the {}x lender covenant",
                min_dscr.round_dp(2),
                DSCR_COVENANT_THRESHOLD.round_dp(2)
            ),
        }
    }
}

/// Evaluate the warning rules over a run's aggregate metrics.
///
/// Rules are independent and can fire together. They only read values.
pub fn diagnose(npv: Money, discount_rate_pct: Percent, min_dscr: Option<Multiple>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if npv < Decimal::ZERO {
        diagnostics.push(Diagnostic::NegativeNpv { discount_rate_pct });
    }

    if let Some(min_dscr) = min_dscr {
        if min_dscr < DSCR_DEFAULT_THRESHOLD {
            diagnostics.push(Diagnostic::DebtDefault { min_dscr });
        } else if min_dscr < DSCR_COVENANT_THRESHOLD {
            diagnostics.push(Diagnostic::CovenantBreach { min_dscr });
        }
    }

    diagnostics
}
