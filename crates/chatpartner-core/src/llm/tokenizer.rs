//! Token counting port.
//!
//! Estimates are per message text. Exact counts for sent and received
//! messages come back from the provider's usage counters and overwrite the
//! estimate.

/// Counts the tokens a text occupies for the configured model.
pub trait Tokenizer: Send + Sync {
    fn count(&self, text: &str) -> u32;
}

/// Rough ~4 characters per token estimate.
///
/// Used when no model-specific encoding is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatingTokenizer;

impl EstimatingTokenizer {
    const CHARS_PER_TOKEN: usize = 4;
}

impl Tokenizer for EstimatingTokenizer {
    fn count(&self, text: &str) -> u32 {
        let chars = text.chars().count();
        chars.div_ceil(Self::CHARS_PER_TOKEN) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_empty_is_zero() {
        assert_eq!(EstimatingTokenizer.count(""), 0);
    }

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(EstimatingTokenizer.count("abc"), 1);
        assert_eq!(EstimatingTokenizer.count("abcd"), 1);
        assert_eq!(EstimatingTokenizer.count("abcde"), 2);
    }

    #[test]
    fn test_estimate_counts_chars_not_bytes() {
        // four two-byte characters
        assert_eq!(EstimatingTokenizer.count("äöüß"), 1);
    }
}
