//! Forecast command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::{MarineForecastTool, Tool};
use anyhow::Result;

/// Run the forecast command: call the marine tool directly, without the model.
pub async fn run_forecast(buoy_id: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Forecast) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let tool = MarineForecastTool::from_settings(&settings.forecast)?;
    let arguments = serde_json::json!({ "buoy_id": buoy_id });

    let spinner = Output::spinner(&format!("Reading buoy {}...", buoy_id));
    let result = tool.execute(&arguments).await;
    spinner.finish_and_clear();

    match result {
        Ok(sentence) => {
            println!("{}", sentence);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Forecast failed: {}", e));
            Err(e.into())
        }
    }
}
