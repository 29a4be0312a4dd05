//! Process-level retry of a front-end after connectivity failures.

use std::future::Future;

use console::style;
use tracing::warn;

use chatpartner_core::chat::ChatError;
use chatpartner_types::llm::LlmError;

/// Whether an error came from losing the completion or messaging backend.
pub fn is_connectivity(err: &anyhow::Error) -> bool {
    if let Some(err) = err.downcast_ref::<ChatError>() {
        return err.is_connectivity();
    }
    if let Some(err) = err.downcast_ref::<LlmError>() {
        return err.is_connectivity();
    }
    matches!(
        err.downcast_ref::<teloxide::RequestError>(),
        Some(teloxide::RequestError::Network(_) | teloxide::RequestError::Io(_))
    )
}

/// Run a front-end, restarting it after a connectivity failure.
///
/// Makes at most `max_tries + 1` attempts. Each connectivity failure prints
/// `notice` with the cause. Other errors, and the failure of the final
/// attempt, are returned.
pub async fn with_retries<F, Fut>(max_tries: u32, notice: &str, mut run: F) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let attempts = max_tries.saturating_add(1);
    let mut attempt = 1;
    loop {
        match run().await {
            Ok(()) => return Ok(()),
            Err(err) if is_connectivity(&err) => {
                eprintln!("{}:\n{err:#}", style(notice).yellow().bold());
                warn!(attempt, attempts, error = %err, "connectivity failure");
                if attempt >= attempts {
                    return Err(err);
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
