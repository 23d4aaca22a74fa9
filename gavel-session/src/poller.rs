//! Result poller
//!
//! Repeatedly queries the execution service for a submission's result
//! until the status turns terminal, the deadline expires, or a query
//! fails. Queries are strictly sequential: the next one is scheduled only
//! after the previous response has been processed, so no two queries for
//! the same token are ever in flight concurrently.

use std::time::Duration;

use gavel_client::{ClientError, ExecutionClient};
use gavel_core::dto::result::ResultResponse;
use gavel_core::domain::submission::SubmissionToken;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// Options for one polling session
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Cadence between status queries
    pub interval: Duration,
    /// Maximum wall-clock time before the session is declared timed out
    pub deadline: Duration,
    /// Request base64-encoded stdout/stderr
    pub base64_output: bool,
}

/// The single terminal event of one polling session
#[derive(Debug)]
pub enum PollOutcome {
    /// The service reported a terminal status
    Terminal(ResultResponse),
    /// No terminal status arrived before the deadline
    TimedOut,
    /// A status query failed
    TransportFailed(ClientError),
}

/// Polls until the submission reaches a terminal state.
///
/// Exactly one outcome is returned per call. The deadline races every
/// suspension point: a query still in flight when the deadline passes is
/// abandoned, so a terminal payload arriving late is never honored.
///
/// A populated stderr on a non-terminal payload does not end the session;
/// the streams only matter once the status is terminal.
pub async fn poll_until_terminal(
    client: &ExecutionClient,
    token: &SubmissionToken,
    options: PollOptions,
) -> PollOutcome {
    let deadline = Instant::now() + options.deadline;
    let mut ticker = time::interval(options.interval);

    // The interval's first tick completes immediately; consume it so the
    // first query lands one cadence after submission.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = time::sleep_until(deadline) => {
                debug!("Deadline expired while waiting to query token {}", token);
                return PollOutcome::TimedOut;
            }
        }

        match time::timeout_at(deadline, client.fetch_result(token, options.base64_output)).await {
            Err(_) => {
                debug!("Deadline expired with a query in flight for token {}", token);
                return PollOutcome::TimedOut;
            }
            Ok(Err(e)) => {
                warn!("Status query failed for token {}: {}", token, e);
                return PollOutcome::TransportFailed(e);
            }
            Ok(Ok(result)) if result.status.is_terminal() => {
                debug!(
                    "Token {} reached terminal status: {}",
                    token, result.status.description
                );
                return PollOutcome::Terminal(result);
            }
            Ok(Ok(_)) => {
                debug!("Token {} still processing", token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant as StdInstant;

    fn options(interval_ms: u64, deadline_ms: u64) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(interval_ms),
            deadline: Duration::from_millis(deadline_ms),
            base64_output: false,
        }
    }

    #[tokio::test]
    async fn test_terminal_after_several_queries() {
        let mut server = mockito::Server::new_async().await;
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        // Two non-terminal payloads (one with transient stderr, which must
        // be ignored), then a terminal one.
        server
            .mock("GET", "/results/tok-1?base64_encoded=false")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => r#"{"status":{"id":2,"description":"Processing"}}"#,
                    1 => r#"{"status":{"id":2,"description":"Processing"},"stderr":"partial"}"#,
                    _ => r#"{"status":{"id":3,"description":"Accepted"},"stdout":"done"}"#,
                }
                .into()
            })
            .expect_at_least(3)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let token = SubmissionToken::new("tok-1");

        let outcome = poll_until_terminal(&client, &token, options(25, 2_000)).await;

        match outcome {
            PollOutcome::Terminal(result) => {
                assert!(result.status.is_success());
                assert_eq!(result.stdout.as_deref(), Some("done"));
            }
            other => panic!("expected terminal outcome, got {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_times_out_while_processing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/results/tok-2?base64_encoded=false")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"id":2,"description":"Processing"}}"#)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let token = SubmissionToken::new("tok-2");

        let started = StdInstant::now();
        let outcome = poll_until_terminal(&client, &token, options(30, 150)).await;

        assert!(matches!(outcome, PollOutcome::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_transport_failure_ends_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/results/tok-3?base64_encoded=false")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let token = SubmissionToken::new("tok-3");

        let outcome = poll_until_terminal(&client, &token, options(25, 2_000)).await;

        match outcome {
            PollOutcome::TransportFailed(e) => assert!(e.is_server_error()),
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_shorter_than_cadence_never_queries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/results/tok-4?base64_encoded=false")
            .expect(0)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let token = SubmissionToken::new("tok-4");

        let outcome = poll_until_terminal(&client, &token, options(500, 60)).await;

        assert!(matches!(outcome, PollOutcome::TimedOut));
        mock.assert_async().await;
    }
}
