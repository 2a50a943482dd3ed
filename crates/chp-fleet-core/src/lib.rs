pub mod diagnostics;
pub mod error;
pub mod fleet;
pub mod model;
pub mod projection;
pub mod scenario;
pub mod time_value;
pub mod types;
pub mod valuation;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use error::ChpFleetError;
pub use model::{evaluate, ModelResult};
pub use scenario::{ScenarioInputs, ScenarioOverrides};
pub use types::*;

#[cfg(feature = "sensitivity")]
pub use sensitivity::{sensitivity, SensitivityRow};

/// Standard result type for all chp-fleet operations
pub type ChpFleetResult<T> = Result<T, ChpFleetError>;
