//! Data Transfer Objects for the execution service API
//!
//! This module contains the wire shapes exchanged with the remote
//! execution service: the submission request/response pair and the
//! result payload returned by status queries.

pub mod result;
pub mod submission;
