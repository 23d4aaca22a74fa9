//! Gavel Core
//!
//! Core types for the gavel code-execution client.
//!
//! This crate contains:
//! - Domain types: interpreted execution status and run outcomes
//! - DTOs: wire shapes for the execution service API
//! - Decoder: normalization of terminal payloads into a single outcome

pub mod decode;
pub mod domain;
pub mod dto;
