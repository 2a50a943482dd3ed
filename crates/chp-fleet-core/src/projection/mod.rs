pub mod engine;
pub mod records;

pub use engine::{project, Projection, FIXED_COST_ESCALATION_PCT};
pub use records::{OperatingCostBreakdown, RevenueBreakdown, YearRecord};
