//! Interpreted execution status

/// State of a submission as reported by the execution service
///
/// Derived from the wire-level status descriptor. The status is monotonic
/// for a given token: once terminal (`Succeeded` or `Failed`), it never
/// returns to `Processing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// The service is still executing the submission
    Processing,
    /// Terminal: the submission completed successfully
    Succeeded,
    /// Terminal: the service finished with a non-success verdict
    /// (carries the service's status description)
    Failed(String),
}

impl ExecutionStatus {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}
