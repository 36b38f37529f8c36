use thiserror::Error;

use super::{ConfigError, HttpError, SinkError, TrackerError, ValidationError, WorkflowError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn http<E>(error: E) -> Self
    where
        E: Into<HttpError>,
    {
        error.into().into()
    }

    pub fn sink<E>(error: E) -> Self
    where
        E: Into<SinkError>,
    {
        error.into().into()
    }

    pub fn tracker<E>(error: E) -> Self
    where
        E: Into<TrackerError>,
    {
        error.into().into()
    }

    pub fn workflow<E>(error: E) -> Self
    where
        E: Into<WorkflowError>,
    {
        error.into().into()
    }
}
