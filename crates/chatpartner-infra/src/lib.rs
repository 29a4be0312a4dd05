//! Infrastructure layer for ChatPartner.
//!
//! Contains implementations of the port traits defined in `chatpartner-core`:
//! SQLite storage for transcripts and the audit trail, the OpenAI-compatible
//! completion and image clients, the tiktoken tokenizer, and the
//! configuration loader.

pub mod config;
pub mod image;
pub mod llm;
pub mod sqlite;
pub mod tokenizer;
