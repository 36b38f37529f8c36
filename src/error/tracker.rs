use thiserror::Error;

/// Contract violations on a request tracker. These indicate a harness bug,
/// never a failure of the target server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Outcome already attached for '{test_name}' (kept '{kept}', rejected '{rejected}').")]
    OutcomeAlreadyAttached {
        test_name: String,
        kept: &'static str,
        rejected: &'static str,
    },
    #[error("Tracker for '{test_name}' was already finalized.")]
    AlreadyFinalized { test_name: String },
}
