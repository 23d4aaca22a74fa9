//! Result DTOs

use serde::{Deserialize, Serialize};

use crate::domain::status::ExecutionStatus;

/// Numeric status id the service uses for a successful run
pub const SUCCESS_STATUS_ID: i32 = 3;

/// Status description of a submission the service is still executing
pub const PROCESSING_DESCRIPTION: &str = "Processing";

/// Status block of a result payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub id: i32,
    pub description: String,
}

impl StatusInfo {
    /// Whether the service has finished with this submission
    ///
    /// Any description other than `"Processing"` is terminal.
    pub fn is_terminal(&self) -> bool {
        self.description != PROCESSING_DESCRIPTION
    }

    /// Whether this status denotes a successful run
    pub fn is_success(&self) -> bool {
        self.id == SUCCESS_STATUS_ID
    }

    /// Interprets the raw descriptor into a domain status
    pub fn interpret(&self) -> ExecutionStatus {
        if !self.is_terminal() {
            ExecutionStatus::Processing
        } else if self.is_success() {
            ExecutionStatus::Succeeded
        } else {
            ExecutionStatus::Failed(self.description.clone())
        }
    }
}

/// Response body for `GET /results/{token}`
///
/// `stdout` and `stderr` may be base64-encoded depending on the
/// `base64_encoded` query parameter of the request. `error` is populated
/// by the service instead of a result when the query itself is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    pub status: StatusInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
