//! Submission endpoints

use tracing::debug;

use crate::ExecutionClient;
use crate::error::{ClientError, Result};
use gavel_core::domain::submission::SubmissionToken;
use gavel_core::dto::result::ResultResponse;
use gavel_core::dto::submission::{SubmitRequest, SubmitResponse};

impl ExecutionClient {
    /// Submit a source snippet for execution
    ///
    /// The snippet may be any string, including empty; the service is
    /// authoritative about what it will execute.
    ///
    /// # Arguments
    /// * `code` - The source snippet to execute
    ///
    /// # Returns
    /// The token correlating this submission to its eventual result
    ///
    /// # Example
    /// ```no_run
    /// # use gavel_client::ExecutionClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ExecutionClient::new("http://localhost:5000");
    /// let token = client.submit("print('hi')").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit(&self, code: impl Into<String>) -> Result<SubmissionToken> {
        let url = format!("{}/execute", self.base_url);
        let req = SubmitRequest { code: code.into() };

        debug!("Submitting {} byte snippet", req.code.len());

        let response = self.client.post(&url).json(&req).send().await?;
        let body: SubmitResponse = self.handle_response(response).await?;

        Ok(body.token)
    }

    /// Fetch the current result of a submission
    ///
    /// Non-terminal payloads carry a `"Processing"` status description;
    /// callers are expected to query again later. With `base64_output`
    /// set, the service base64-encodes stdout/stderr so they survive JSON
    /// transport.
    ///
    /// # Arguments
    /// * `token` - The token returned by `submit`
    /// * `base64_output` - Request base64-encoded stdout/stderr
    ///
    /// # Returns
    /// The current result payload for the submission
    pub async fn fetch_result(
        &self,
        token: &SubmissionToken,
        base64_output: bool,
    ) -> Result<ResultResponse> {
        let url = format!(
            "{}/results/{}?base64_encoded={}",
            self.base_url,
            token,
            base64_output
        );

        let response = self.client.get(&url).send().await?;
        let body: ResultResponse = self.handle_response(response).await?;

        // A well-formed 2xx body can still carry a service-side rejection.
        if let Some(message) = body.error {
            return Err(ClientError::Service(message));
        }

        Ok(body)
    }
}
