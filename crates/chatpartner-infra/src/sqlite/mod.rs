//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod conversation;
mod message_row;
pub mod pool;
pub mod system_log;
