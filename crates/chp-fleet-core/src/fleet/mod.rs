pub mod capex;
pub mod debt;
