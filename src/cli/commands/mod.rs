//! CLI command implementations.

mod ask;
mod config;
mod forecast;
mod locations;

pub use ask::run_ask;
pub use config::run_config;
pub use forecast::run_forecast;
pub use locations::run_locations;
