use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to read workflow '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse workflow '{path}': {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Workflow '{path}' is not a mapping.")]
    NotAMapping { path: PathBuf },
    #[error("Workflow '{path}' is missing a string 'workflow_id'.")]
    MissingWorkflowId { path: PathBuf },
    #[error("Workflow '{path}' cannot be represented as JSON: {source}")]
    ToJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
}
