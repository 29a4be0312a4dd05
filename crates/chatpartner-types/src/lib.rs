//! Shared domain types for ChatPartner.
//!
//! This crate contains the core domain types used across the workspace:
//! messages, LLM request/response shapes, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod image;
pub mod llm;
pub mod message;
