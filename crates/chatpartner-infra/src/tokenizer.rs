//! tiktoken-based token counting.

use chatpartner_core::llm::tokenizer::{EstimatingTokenizer, Tokenizer};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Exact BPE token counts for OpenAI models.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    /// Encoding for `model`, or `cl100k_base` when the model is unknown.
    pub fn for_model(model: &str) -> Option<Self> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Some(Self { bpe }),
            Err(err) => {
                debug!(model, error = %err, "no encoding for model, using cl100k_base");
                tiktoken_rs::cl100k_base().ok().map(|bpe| Self { bpe })
            }
        }
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count(&self, text: &str) -> u32 {
        self.bpe.encode_with_special_tokens(text).len() as u32
    }
}

/// The best available tokenizer for `model`.
pub fn tokenizer_for_model(model: &str) -> Box<dyn Tokenizer> {
    match TiktokenTokenizer::for_model(model) {
        Some(tokenizer) => Box::new(tokenizer),
        None => {
            warn!(model, "failed to load a BPE encoding, estimating token counts");
            Box::new(EstimatingTokenizer)
        }
    }
}
