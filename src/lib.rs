pub mod error;
pub mod market_data;
pub mod persist;
pub mod settings;
pub mod telemetry;

pub use error::{PipelineError, PipelineResult};
