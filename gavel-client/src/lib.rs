//! Gavel HTTP Client
//!
//! A simple, type-safe HTTP client for the remote code-execution service.
//!
//! The service accepts a source snippet, answers with an opaque token, and
//! is then queried for that token's result until it turns terminal. This
//! crate covers exactly those two endpoints; the polling cadence and the
//! run-session state machine live in `gavel-session`.
//!
//! # Example
//!
//! ```no_run
//! use gavel_client::ExecutionClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ExecutionClient::new("http://localhost:5000");
//!
//!     let token = client.submit("print('hi')").await?;
//!     let result = client.fetch_result(&token, true).await?;
//!
//!     println!("status: {}", result.status.description);
//!     Ok(())
//! }
//! ```

pub mod error;
mod submissions;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use gavel_core::domain::submission::SubmissionToken;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the execution service API
///
/// This client provides one method per service endpoint:
/// - `submit`: create a submission and obtain its token
/// - `fetch_result`: query the current result for a token
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    /// Base URL of the execution service (e.g., "http://localhost:5000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ExecutionClient {
    /// Create a new execution service client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the service (e.g., "http://localhost:5000")
    ///
    /// # Example
    /// ```
    /// use gavel_client::ExecutionClient;
    ///
    /// let client = ExecutionClient::new("http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the execution service
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the execution service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns a backend error if the request
    /// failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::backend(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
