//! Conversation logic and port trait definitions for ChatPartner.
//!
//! This crate defines the "ports" (repository, provider, tokenizer and image
//! traits) that the infrastructure layer implements. It depends only on
//! `chatpartner-types` -- never on `chatpartner-infra` or any database/IO crate.

pub mod channel;
pub mod chat;
pub mod conversation;
pub mod llm;
pub mod picture;
pub mod username;

#[cfg(test)]
pub(crate) mod testing;
