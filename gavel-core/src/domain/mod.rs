//! Core domain types
//!
//! This module contains the domain structures shared between the HTTP
//! client and the session layer: the opaque submission handle, the
//! interpreted execution status, and the decoded run outcome.

pub mod outcome;
pub mod status;
pub mod submission;
