pub mod evaluate;
pub mod irr;
pub mod sensitivity;

use chp_fleet_core::{ScenarioInputs, ScenarioOverrides};

use crate::input;

/// Base scenario from `--input` (or piped stdin), with an optional
/// overrides file layered on top.
pub fn load_scenario(
    input_path: Option<&str>,
    overrides_path: Option<&str>,
) -> Result<ScenarioInputs, Box<dyn std::error::Error>> {
    let base: ScenarioInputs = if let Some(path) = input_path {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <scenario.json|yaml> or stdin required".into());
    };

    match overrides_path {
        Some(path) => {
            let overrides: ScenarioOverrides = input::file::read_document(path)?;
            tracing::debug!(path, "applying scenario overrides");
            Ok(base.with_overrides(&overrides))
        }
        None => Ok(base),
    }
}
