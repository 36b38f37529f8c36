//! Workflow documents: YAML on disk, posted to the server as JSON unchanged.
//! Steps are never interpreted here.
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{AppError, AppResult, WorkflowError};

/// Server route that accepts workflow submissions.
pub const WORKFLOW_ENDPOINT: &str = "/sequential-workflows";

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDocument {
    pub path: PathBuf,
    pub workflow_id: String,
    pub definition: Value,
}

impl WorkflowDocument {
    #[must_use]
    pub fn test_name(&self) -> String {
        format!("Workflow: {}", self.workflow_id)
    }
}

/// Reads and converts one workflow document.
///
/// # Errors
///
/// Returns an error when the file cannot be read, is not a YAML mapping, has
/// no string `workflow_id`, or has no JSON representation.
pub fn load_workflow(path: &Path) -> AppResult<WorkflowDocument> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::workflow(WorkflowError::Read {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    parse_workflow(path, &content)
}

/// # Errors
///
/// See [`load_workflow`].
pub fn load_workflows(paths: &[PathBuf]) -> AppResult<Vec<WorkflowDocument>> {
    paths.iter().map(|path| load_workflow(path)).collect()
}

pub(crate) fn parse_workflow(path: &Path, content: &str) -> AppResult<WorkflowDocument> {
    let document: serde_yaml::Value = serde_yaml::from_str(content).map_err(|err| {
        AppError::workflow(WorkflowError::ParseYaml {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    if !document.is_mapping() {
        return Err(AppError::workflow(WorkflowError::NotAMapping {
            path: path.to_path_buf(),
        }));
    }
    let workflow_id = document
        .get("workflow_id")
        .and_then(serde_yaml::Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            AppError::workflow(WorkflowError::MissingWorkflowId {
                path: path.to_path_buf(),
            })
        })?;
    let definition = serde_json::to_value(&document).map_err(|err| {
        AppError::workflow(WorkflowError::ToJson {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    Ok(WorkflowDocument {
        path: path.to_path_buf(),
        workflow_id,
        definition,
    })
}
