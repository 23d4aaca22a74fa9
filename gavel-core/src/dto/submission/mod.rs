//! Submission DTOs

use serde::{Deserialize, Serialize};

use crate::domain::submission::SubmissionToken;

/// Request body for `POST /execute`
///
/// The snippet may be any string, including empty; the service is
/// authoritative and no client-side validation is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub code: String,
}

/// Response body for `POST /execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub token: SubmissionToken,
}
