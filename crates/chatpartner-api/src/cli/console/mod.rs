//! Interactive terminal chat.
//!
//! Multi-line prompts, slash commands, highlighted code blocks in replies.
//! Entry point: `loop_runner::run_console`.

pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;

pub use loop_runner::run_console;
