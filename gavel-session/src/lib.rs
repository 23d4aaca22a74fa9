//! Gavel Session
//!
//! Drives one code submission from source text to an observable result.
//!
//! Architecture:
//! - Configuration: service URL, poll cadence, deadline, transport options
//! - Poller: strictly sequential status queries under a wall-clock deadline
//! - Session: cancel-before-replace run management with observable state
//!
//! The session layer owns the only mutable state in the workspace: the
//! {loading, output, error} cells a collaborator watches. At most one run
//! session is live at a time; starting a new run supersedes the previous
//! one before any network call is issued.

pub mod config;
pub mod poller;
pub mod session;

pub use config::RunnerConfig;
pub use poller::{PollOptions, PollOutcome, poll_until_terminal};
pub use session::{CodeRunner, RunState, TIMEOUT_MESSAGE, run_to_completion};
