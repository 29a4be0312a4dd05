//! Display-name normalization.
//!
//! Completion backends only accept participant names matching
//! `^[A-Za-z_-]{1,64}$`, and the same identifier is used as the sender of the
//! stored messages.

/// Maximum length of a normalized username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

fn transliterate(c: char) -> Option<&'static str> {
    match c {
        'ä' => Some("ae"),
        'ö' => Some("oe"),
        'ü' => Some("ue"),
        'Ä' => Some("Ae"),
        'Ö' => Some("Oe"),
        'Ü' => Some("Ue"),
        'ß' => Some("ss"),
        _ => None,
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-'
}

/// Map a display name to a storage-safe identifier.
///
/// Spaces become underscores, German umlauts become ASCII digraphs, every
/// other character outside `[A-Za-z_-]` is dropped, and the result is capped
/// at [`MAX_USERNAME_LEN`]. Normalizing twice gives the same result.
pub fn normalize_username(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c == ' ' {
            out.push('_');
        } else if let Some(digraph) = transliterate(c) {
            out.push_str(digraph);
        } else if is_allowed(c) {
            out.push(c);
        }
    }
    // all remaining chars are ASCII, so byte truncation is char-safe
    out.truncate(MAX_USERNAME_LEN);
    out
}
