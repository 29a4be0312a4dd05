//! Diagnostic logging for ChatPartner.

pub mod tracing_setup;
