use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_value::checked_sum;
use crate::types::{Money, Multiple};
use crate::ChpFleetResult;

/// Revenue split by stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub power: Money,
    pub thermal: Money,
    pub tipping: Money,
    pub carbon: Money,
}

impl RevenueBreakdown {
    pub fn total(&self) -> ChpFleetResult<Money> {
        checked_sum(
            "total revenue",
            &[self.power, self.thermal, self.tipping, self.carbon],
        )
    }

    /// Each stream divided by `units`; all zero when no units operate.
    pub fn per_unit(&self, units: u32) -> RevenueBreakdown {
        if units == 0 {
            return RevenueBreakdown::default();
        }
        let n = Decimal::from(units);
        RevenueBreakdown {
            power: self.power / n,
            thermal: self.thermal / n,
            tipping: self.tipping / n,
            carbon: self.carbon / n,
        }
    }
}

/// Operating cost split by bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingCostBreakdown {
    pub maintenance: Money,
    pub fuel_processing: Money,
    /// Insurance and management, escalated at the fixed-cost rate
    pub fixed: Money,
}

impl OperatingCostBreakdown {
    pub fn total(&self) -> ChpFleetResult<Money> {
        checked_sum(
            "operating cost",
            &[self.maintenance, self.fuel_processing, self.fixed],
        )
    }
}

/// One simulated project year. Built once by the projection fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    /// Year index, 0 = ordering/build year
    pub year: u32,
    pub calendar_year: i32,
    /// Units ordered to date (non-decreasing, capped at fleet size)
    pub deployed_units: u32,
    /// Units generating revenue this year (zero in year 0)
    pub operating_units: u32,
    pub revenue: RevenueBreakdown,
    pub total_revenue: Money,
    pub operating_costs: OperatingCostBreakdown,
    pub operating_cost: Money,
    pub ebitda: Money,
    pub debt_service: Money,
    /// EBITDA / debt service; `None` when no debt service is due
    pub dscr: Option<Multiple>,
    /// Capital recognized for units newly deployed this year
    pub capital_cost: Money,
    /// Waste tonnage billed at the tipping fee, capped at the supply
    pub tipped_tonnes: Decimal,
    pub cash_flow: Money,
    pub discounted_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    pub cumulative_discounted_cash_flow: Money,
}
