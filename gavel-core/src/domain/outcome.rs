//! Run outcome types

use serde::{Deserialize, Serialize};

/// Decoded result of one completed run
///
/// Derived exactly once, when a terminal status is observed. Exactly one
/// of `output` / `error` is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Program output of a successful run
    pub output: Option<String>,
    /// Error text of a failed run (stderr, status description, timeout or
    /// transport message)
    pub error: Option<String>,
}

impl ExecutionOutcome {
    /// Outcome carrying program output
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            output: Some(text.into()),
            error: None,
        }
    }

    /// Outcome carrying error text
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            output: None,
            error: Some(text.into()),
        }
    }
}
