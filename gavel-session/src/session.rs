//! Run sessions
//!
//! Owns the observable state a collaborator watches while a submission is
//! in flight, and enforces the one-session-at-a-time discipline: starting
//! a new run tears down the previous session's poll loop (and with it the
//! deadline, which lives in the same task) before anything else happens.

use std::sync::{Arc, Mutex};

use gavel_client::{ClientError, ExecutionClient};
use gavel_core::decode::{self, TransportEncoding};
use gavel_core::domain::outcome::ExecutionOutcome;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::RunnerConfig;
use crate::poller::{self, PollOptions, PollOutcome};

/// User-visible message for a run that exceeded the deadline
pub const TIMEOUT_MESSAGE: &str = "Execution timed out";

/// Observable state of the current run
///
/// Exactly one of `output` / `error` is non-empty once a run has
/// terminated; both are cleared when a new run starts. `loading` returns
/// to false on every exit path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// True from the moment a run starts until its single terminal event
    pub loading: bool,
    /// Decoded output of a successful run
    pub output: String,
    /// Error text of a failed, timed-out, or unreachable run
    pub error: String,
}

/// Bookkeeping for the in-flight session
struct Session {
    /// Bumped on every `run_code`; a task holding a stale generation can
    /// no longer publish
    generation: u64,
    /// Poll task of the in-flight run, if any
    task: Option<JoinHandle<()>>,
}

/// Drives submissions and publishes their results
///
/// At most one run is in flight per runner. `run_code` supersedes the
/// previous session before touching the network, so the state cells are
/// only ever written by the session that currently owns them.
pub struct CodeRunner {
    config: RunnerConfig,
    client: Arc<ExecutionClient>,
    state_tx: watch::Sender<RunState>,
    current: Mutex<Session>,
}

impl CodeRunner {
    /// Creates a runner with a client derived from the configuration
    pub fn new(config: RunnerConfig) -> Self {
        let client = Arc::new(ExecutionClient::new(config.service_url.clone()));
        Self::with_client(config, client)
    }

    /// Creates a runner around an existing client
    pub fn with_client(config: RunnerConfig, client: Arc<ExecutionClient>) -> Self {
        let (state_tx, _) = watch::channel(RunState::default());
        Self {
            config,
            client,
            state_tx,
            current: Mutex::new(Session {
                generation: 0,
                task: None,
            }),
        }
    }

    /// Snapshot of the observable state
    pub fn state(&self) -> RunState {
        self.state_tx.borrow().clone()
    }

    /// Watch the observable state for changes
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Starts a new run, superseding any run still in flight.
    ///
    /// Returns immediately; progress is observable through `state` /
    /// `subscribe`. The previous session's poll task is aborted and its
    /// generation invalidated before the new submission is issued, so no
    /// callback of a superseded run is ever observable.
    pub fn run_code(self: &Arc<Self>, source: impl Into<String>) {
        let source = source.into();

        let generation = {
            let mut current = self.current.lock().unwrap();
            if let Some(task) = current.task.take() {
                debug!("Superseding in-flight run (generation {})", current.generation);
                task.abort();
            }
            current.generation += 1;
            self.state_tx.send_replace(RunState {
                loading: true,
                ..RunState::default()
            });
            current.generation
        };

        let runner = Arc::clone(self);
        let task = tokio::spawn(async move {
            runner.drive(generation, source).await;
        });

        let mut current = self.current.lock().unwrap();
        if current.generation == generation {
            current.task = Some(task);
        } else {
            // An even newer run started while this one was being spawned.
            task.abort();
        }
    }

    /// Waits until the current run, if any, has published its terminal
    /// state.
    pub async fn wait_idle(&self) {
        let mut rx = self.state_tx.subscribe();
        while rx.borrow_and_update().loading {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Submit, poll, decode, publish: the whole life of one session.
    async fn drive(&self, generation: u64, source: String) {
        info!("Submitting run (generation {})", generation);

        let token = match self.client.submit(source).await {
            Ok(token) => token,
            Err(e) => {
                self.publish(
                    generation,
                    RunState {
                        error: e.to_string(),
                        ..RunState::default()
                    },
                );
                return;
            }
        };

        debug!("Run {} accepted as token {}, polling", generation, token);

        let outcome = match poller::poll_until_terminal(
            &self.client,
            &token,
            self.config.poll_options(),
        )
        .await
        {
            PollOutcome::Terminal(payload) => {
                decode::decode(&payload, self.config.transport_encoding())
            }
            PollOutcome::TimedOut => ExecutionOutcome::error(TIMEOUT_MESSAGE),
            PollOutcome::TransportFailed(e) => ExecutionOutcome::error(e.to_string()),
        };

        self.publish(
            generation,
            RunState {
                loading: false,
                output: outcome.output.unwrap_or_default(),
                error: outcome.error.unwrap_or_default(),
            },
        );
    }

    /// Publishes the terminal state for `generation`, unless a newer run
    /// has taken over in the meantime. Checking the generation and writing
    /// the cells happen under one lock, so a superseded session can never
    /// interleave with its successor.
    fn publish(&self, generation: u64, state: RunState) -> bool {
        let mut current = self.current.lock().unwrap();
        if current.generation != generation {
            debug!("Suppressing result from superseded run {}", generation);
            return false;
        }
        current.task = None;
        self.state_tx.send_replace(state);
        true
    }
}

/// Submits a snippet and waits for its decoded outcome.
///
/// One-shot variant of [`CodeRunner`] for callers that need neither the
/// observable cells nor supersession. The deadline semantics are
/// identical; a timeout is reported as an error outcome, while submit and
/// poll transport failures propagate as errors.
pub async fn run_to_completion(
    client: &ExecutionClient,
    code: impl Into<String>,
    options: PollOptions,
) -> Result<ExecutionOutcome, ClientError> {
    let token = client.submit(code).await?;

    let encoding = if options.base64_output {
        TransportEncoding::Base64
    } else {
        TransportEncoding::Plain
    };

    match poller::poll_until_terminal(client, &token, options).await {
        PollOutcome::Terminal(payload) => Ok(decode::decode(&payload, encoding)),
        PollOutcome::TimedOut => Ok(ExecutionOutcome::error(TIMEOUT_MESSAGE)),
        PollOutcome::TransportFailed(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use std::time::Duration;
    use tokio::time::sleep;

    fn test_config(url: String) -> RunnerConfig {
        let mut config = RunnerConfig::new(url);
        config.poll_interval = Duration::from_millis(25);
        config.deadline = Duration::from_secs(2);
        config
    }

    #[tokio::test]
    async fn test_successful_run_decodes_base64_output() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"tok-a"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/results/tok-a?base64_encoded=true")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"id":3,"description":"Accepted"},"stdout":"aGk=\n"}"#)
            .create_async()
            .await;

        let runner = Arc::new(CodeRunner::new(test_config(server.url())));
        runner.run_code("print('hi')");

        assert!(runner.state().loading);
        runner.wait_idle().await;

        let state = runner.state();
        assert_eq!(state.output, "hi");
        assert_eq!(state.error, "");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_submit_failure_skips_polling() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(500)
            .with_body("database down")
            .create_async()
            .await;
        let results = server
            .mock("GET", mockito::Matcher::Regex("^/results/.*".to_string()))
            .expect(0)
            .create_async()
            .await;

        let runner = Arc::new(CodeRunner::new(test_config(server.url())));
        runner.run_code("print('hi')");
        runner.wait_idle().await;

        let state = runner.state();
        assert!(state.error.contains("Backend error"));
        assert_eq!(state.output, "");
        assert!(!state.loading);
        results.assert_async().await;
    }

    #[tokio::test]
    async fn test_deadline_surfaces_timeout_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"tok-c"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/results/tok-c?base64_encoded=true")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"id":2,"description":"Processing"}}"#)
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.poll_interval = Duration::from_millis(30);
        config.deadline = Duration::from_millis(150);

        let runner = Arc::new(CodeRunner::new(config));
        runner.run_code("while True: pass");
        runner.wait_idle().await;

        let state = runner.state();
        assert_eq!(state.error, TIMEOUT_MESSAGE);
        assert_eq!(state.output, "");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_failed_status_routes_stderr_to_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"tok-d"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/results/tok-d?base64_encoded=false")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":{"id":11,"description":"Runtime Error"},"stderr":"TypeError: x"}"#,
            )
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.base64_output = false;

        let runner = Arc::new(CodeRunner::new(config));
        runner.run_code("boom()");
        runner.wait_idle().await;

        let state = runner.state();
        assert_eq!(state.error, "TypeError: x");
        assert_eq!(state.output, "");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_new_run_supersedes_in_flight_session() {
        let mut server = mockito::Server::new_async().await;

        // First submission never finishes; second finishes promptly.
        server
            .mock("POST", "/execute")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"code":"first"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"tok-first"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/execute")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"code":"second"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"tok-second"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/results/tok-first?base64_encoded=false")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"id":2,"description":"Processing"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/results/tok-second?base64_encoded=false")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"id":3,"description":"Accepted"},"stdout":"second done"}"#)
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.base64_output = false;

        let runner = Arc::new(CodeRunner::new(config));
        runner.run_code("first");

        // Let the first session get as far as polling before replacing it.
        sleep(Duration::from_millis(80)).await;
        runner.run_code("second");
        runner.wait_idle().await;

        let state = runner.state();
        assert_eq!(state.output, "second done");
        assert_eq!(state.error, "");
        assert!(!state.loading);

        // Nothing from the superseded session may surface later.
        sleep(Duration::from_millis(150)).await;
        assert_eq!(runner.state(), state);
    }

    #[tokio::test]
    async fn test_run_to_completion_returns_outcome() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token":"tok-e"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/results/tok-e?base64_encoded=false")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":{"id":3,"description":"Accepted"},"stdout":"ok"}"#)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let options = PollOptions {
            interval: Duration::from_millis(25),
            deadline: Duration::from_secs(2),
            base64_output: false,
        };

        let outcome = run_to_completion(&client, "print('ok')", options)
            .await
            .unwrap();
        assert_eq!(outcome, ExecutionOutcome::output("ok"));
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_no_run() {
        let runner = Arc::new(CodeRunner::new(test_config(
            "http://localhost:5000".to_string(),
        )));
        runner.wait_idle().await;
        assert_eq!(runner.state(), RunState::default());
    }
}
