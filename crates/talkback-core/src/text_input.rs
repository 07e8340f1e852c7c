//! Bounded text field holding the next utterance.

use tracing::debug;

/// Return at most the first `limit` characters of `text`.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Text entry whose contents never exceed a fixed character count.
///
/// Truncation happens when text is entered, not when it is spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    text: String,
    max_chars: usize,
}

impl TextField {
    /// Create an empty field bounded to [`crate::MAX_TEXT_LENGTH`] characters
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(crate::MAX_TEXT_LENGTH)
    }

    /// Create an empty field with a custom character limit
    #[must_use]
    pub fn with_limit(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            max_chars,
        }
    }

    /// Replace the contents, silently dropping everything past the limit
    pub fn set_text(&mut self, text: &str) {
        let kept = truncate_chars(text, self.max_chars);
        if kept.len() < text.len() {
            debug!(
                "Truncated input to {} characters ({} bytes dropped)",
                self.max_chars,
                text.len() - kept.len()
            );
        }
        self.text.clear();
        self.text.push_str(kept);
    }

    /// Current contents
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Contents with surrounding whitespace removed
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Whether the field holds nothing but whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }

    /// Character limit
    #[must_use]
    pub const fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Empty the field
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self::new()
    }
}
