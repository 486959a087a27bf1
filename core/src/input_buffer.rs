//! Raw input buffer of a composition.
//!
//! The buffer stores the symbols typed so far (e.g., "nihao"). Symbols are only
//! ever appended or removed from the end; there is no cursor inside the buffer.

/// Input buffer tracking raw, not-yet-committed input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    /// Create a new empty input buffer.
    pub fn new() -> Self {
        Self {
            text: String::new(),
        }
    }

    /// Get the raw input text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Append a symbol at the end.
    pub fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    /// Remove the last symbol (backspace).
    /// Returns the removed symbol, or None if the buffer was empty.
    pub fn pop(&mut self) -> Option<char> {
        self.text.pop()
    }
}
