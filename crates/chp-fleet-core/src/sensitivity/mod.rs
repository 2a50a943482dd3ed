pub mod grid;
pub mod tornado;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ChpFleetError;
use crate::scenario::ScenarioInputs;
use crate::time_value::checked_product;
use crate::ChpFleetResult;

pub use grid::{npv_grid, NpvGrid, SweepAxis};
pub use tornado::{sensitivity, tornado, SensitivityRow, Tornado};

/// Scenario inputs the sensitivity tools know how to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityParameter {
    Availability,
    PowerRate,
    ThermalRate,
    TippingFee,
    CarbonPrice,
    EquipmentCost,
    MaintenanceRate,
    DiscountRate,
}

impl SensitivityParameter {
    /// Every tracked parameter, in report order.
    pub const TRACKED: [SensitivityParameter; 8] = [
        SensitivityParameter::Availability,
        SensitivityParameter::PowerRate,
        SensitivityParameter::ThermalRate,
        SensitivityParameter::TippingFee,
        SensitivityParameter::CarbonPrice,
        SensitivityParameter::EquipmentCost,
        SensitivityParameter::MaintenanceRate,
        SensitivityParameter::DiscountRate,
    ];

    /// Human-readable label for reports and charts.
    pub fn label(self) -> &'static str {
        match self {
            SensitivityParameter::Availability => "Unit availability",
            SensitivityParameter::PowerRate => "Power rate",
            SensitivityParameter::ThermalRate => "Thermal rate",
            SensitivityParameter::TippingFee => "Tipping fee",
            SensitivityParameter::CarbonPrice => "Carbon credit price",
            SensitivityParameter::EquipmentCost => "Equipment cost",
            SensitivityParameter::MaintenanceRate => "Maintenance rate",
            SensitivityParameter::DiscountRate => "Discount rate",
        }
    }

    /// Identifier accepted by [`FromStr`].
    pub fn key(self) -> &'static str {
        match self {
            SensitivityParameter::Availability => "availability",
            SensitivityParameter::PowerRate => "power_rate",
            SensitivityParameter::ThermalRate => "thermal_rate",
            SensitivityParameter::TippingFee => "tipping_fee",
            SensitivityParameter::CarbonPrice => "carbon_price",
            SensitivityParameter::EquipmentCost => "equipment_cost",
            SensitivityParameter::MaintenanceRate => "maintenance_rate",
            SensitivityParameter::DiscountRate => "discount_rate_pct",
        }
    }

    /// Current value of this parameter in `inputs`.
    pub fn value(self, inputs: &ScenarioInputs) -> Decimal {
        match self {
            SensitivityParameter::Availability => inputs.availability,
            SensitivityParameter::PowerRate => inputs.power_rate,
            SensitivityParameter::ThermalRate => inputs.thermal_rate,
            SensitivityParameter::TippingFee => inputs.tipping_fee,
            SensitivityParameter::CarbonPrice => inputs.carbon_price,
            SensitivityParameter::EquipmentCost => inputs.equipment_cost,
            SensitivityParameter::MaintenanceRate => inputs.maintenance_rate,
            SensitivityParameter::DiscountRate => inputs.discount_rate_pct,
        }
    }

    /// Copy of `inputs` with this parameter set to `value`, all else unchanged.
    pub fn with_value(self, inputs: &ScenarioInputs, value: Decimal) -> ScenarioInputs {
        let mut next = inputs.clone();
        let slot = match self {
            SensitivityParameter::Availability => &mut next.availability,
            SensitivityParameter::PowerRate => &mut next.power_rate,
            SensitivityParameter::ThermalRate => &mut next.thermal_rate,
            SensitivityParameter::TippingFee => &mut next.tipping_fee,
            SensitivityParameter::CarbonPrice => &mut next.carbon_price,
            SensitivityParameter::EquipmentCost => &mut next.equipment_cost,
            SensitivityParameter::MaintenanceRate => &mut next.maintenance_rate,
            SensitivityParameter::DiscountRate => &mut next.discount_rate_pct,
        };
        *slot = value;
        next
    }

    /// Copy of `inputs` with this parameter multiplied by `factor`.
    ///
    /// Not clamped: fractions such as availability may leave [0, 1].
    pub fn scaled(
        self,
        inputs: &ScenarioInputs,
        factor: Decimal,
    ) -> ChpFleetResult<ScenarioInputs> {
        let value = checked_product(self.key(), &[self.value(inputs), factor])?;
        Ok(self.with_value(inputs, value))
    }
}

impl fmt::Display for SensitivityParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SensitivityParameter {
    type Err = ChpFleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SensitivityParameter::TRACKED
            .into_iter()
            .find(|p| {
                p.key() == wanted
                    || (wanted == "discount_rate" && *p == SensitivityParameter::DiscountRate)
            })
            .ok_or_else(|| ChpFleetError::InvalidInput {
                field: "parameter".into(),
                reason: format!(
                    "unknown sensitivity parameter '{s}'; expected one of: {}",
                    SensitivityParameter::TRACKED
                        .iter()
                        .map(|p| p.key())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}
