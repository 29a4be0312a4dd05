//! Conversation orchestration: the per-turn message pipeline.

pub mod service;

use chatpartner_types::error::RepositoryError;
use chatpartner_types::llm::LlmError;

/// Errors from chat service operations.
///
/// Completion failures inside a turn are turned into a synthetic reply and
/// never surface here; `Llm` only carries failures from paths without a
/// local recovery.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("completion error: {0}")]
    Llm(#[from] LlmError),
}

impl ChatError {
    /// Whether a process-level retry could help.
    pub fn is_connectivity(&self) -> bool {
        match self {
            ChatError::Llm(err) => err.is_connectivity(),
            ChatError::Repository(RepositoryError::Connection) => true,
            ChatError::Repository(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_classification() {
        assert!(ChatError::from(LlmError::Connection("timeout".into())).is_connectivity());
        assert!(ChatError::from(RepositoryError::Connection).is_connectivity());
        assert!(!ChatError::from(RepositoryError::NotFound).is_connectivity());
        assert!(!ChatError::from(LlmError::AuthenticationFailed).is_connectivity());
    }
}
