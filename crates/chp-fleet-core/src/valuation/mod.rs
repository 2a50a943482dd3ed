pub mod irr;

use serde::{Deserialize, Serialize};

use crate::projection::Projection;
use crate::types::{Money, Rate};

pub use irr::{solve_irr, solve_irr_with, BisectionConfig};

/// Investor metrics derived from a completed projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub npv: Money,
    /// `None` when the cash flows never change sign inside the search bracket
    pub irr: Option<Rate>,
}

/// NPV is read straight from the projection; IRR is solved on its cash flows.
pub fn value_projection(projection: &Projection) -> Valuation {
    Valuation {
        npv: projection.npv,
        irr: solve_irr(&projection.cash_flows()),
    }
}
