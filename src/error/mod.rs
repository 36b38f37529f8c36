mod app;
mod config;
mod http;
mod sink;
mod tracker;
mod validation;
mod workflow;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::HttpError;
pub use sink::{SinkError, SinkKind};
pub use tracker::TrackerError;
pub use validation::ValidationError;
pub use workflow::WorkflowError;
