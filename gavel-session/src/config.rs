//! Session configuration
//!
//! Defines all configurable parameters for driving runs against the
//! execution service, including the poll cadence and the result deadline.

use std::time::Duration;

use gavel_core::decode::TransportEncoding;

use crate::poller::PollOptions;

/// Session configuration
///
/// Cadence and deadline are tunable to allow different interactive
/// profiles (a snippet runner wants seconds, a batch runner can wait).
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Execution service base URL (e.g., "http://localhost:5000")
    pub service_url: String,

    /// Cadence between status queries for an in-flight submission
    pub poll_interval: Duration,

    /// Maximum wall-clock time to wait for a terminal status
    pub deadline: Duration,

    /// Ask the service to base64-encode stdout/stderr in result payloads
    pub base64_output: bool,
}

impl RunnerConfig {
    /// Creates a new configuration with defaults
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            poll_interval: Duration::from_secs(1),
            deadline: Duration::from_secs(10),
            base64_output: true,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - GAVEL_SERVICE_URL (required)
    /// - GAVEL_POLL_INTERVAL_MS (optional, default: 1000)
    /// - GAVEL_DEADLINE_MS (optional, default: 10000)
    /// - GAVEL_BASE64_OUTPUT (optional, default: true)
    pub fn from_env() -> anyhow::Result<Self> {
        let service_url = std::env::var("GAVEL_SERVICE_URL")
            .map_err(|_| anyhow::anyhow!("GAVEL_SERVICE_URL environment variable not set"))?;

        let poll_interval = std::env::var("GAVEL_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(1000));

        let deadline = std::env::var("GAVEL_DEADLINE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(10_000));

        let base64_output = std::env::var("GAVEL_BASE64_OUTPUT")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(true);

        Ok(Self {
            service_url,
            poll_interval,
            deadline,
            base64_output,
        })
    }

    /// The polling options derived from this configuration
    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: self.poll_interval,
            deadline: self.deadline,
            base64_output: self.base64_output,
        }
    }

    /// The transport encoding result payloads will arrive in
    pub fn transport_encoding(&self) -> TransportEncoding {
        if self.base64_output {
            TransportEncoding::Base64
        } else {
            TransportEncoding::Plain
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service_url.is_empty() {
            anyhow::bail!("service_url cannot be empty");
        }

        if !self.service_url.starts_with("http://") && !self.service_url.starts_with("https://") {
            anyhow::bail!("service_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.deadline < self.poll_interval {
            anyhow::bail!("deadline must be at least one poll_interval");
        }

        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}
