//! Per-session composition state machine.
//!
//! A `CompositionState` is either *Empty* (no buffered input, no candidates) or
//! *Composing*. Every buffer change rebuilds the candidate list with exactly
//! one provider call, so `candidates == provider.lookup(buffer)` holds after
//! every transition (an empty buffer always has no candidates).

use crate::candidate::{Candidate, CandidateList, PageInfo};
use crate::error::{Error, Result};
use crate::input_buffer::InputBuffer;
use crate::keys::{KeyEvent, KeyResult};
use crate::provider::LookupProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Composing,
}

/// Events accepted by [`CompositionState::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionEvent {
    /// Append a symbol; only `a`-`z` belong to the input alphabet.
    Symbol(char),
    /// Remove the last symbol.
    Erase,
    /// Confirm; succeeds only when there is something to commit.
    Commit,
    /// Choose the candidate at this index.
    Select(usize),
    /// Drop all input.
    Clear,
    /// A key code the IME does not handle.
    Unrecognized(i32),
}

impl From<KeyEvent> for CompositionEvent {
    fn from(key: KeyEvent) -> Self {
        match key {
            KeyEvent::Char(ch) => CompositionEvent::Symbol(ch),
            KeyEvent::Backspace => CompositionEvent::Erase,
            KeyEvent::Enter => CompositionEvent::Commit,
            KeyEvent::Other(code) => CompositionEvent::Unrecognized(code),
        }
    }
}

/// Whether `ch` belongs to the input alphabet.
pub fn is_input_symbol(ch: char) -> bool {
    ch.is_ascii_lowercase()
}

/// Observable fields of a composition at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub composition: String,
    pub candidates: Vec<Candidate>,
    pub page: PageInfo,
}

/// Composition state of one session.
pub struct CompositionState {
    buffer: InputBuffer,
    candidates: CandidateList,
    provider: Arc<dyn LookupProvider>,
}

impl CompositionState {
    pub fn new(provider: Arc<dyn LookupProvider>) -> Self {
        Self {
            buffer: InputBuffer::new(),
            candidates: CandidateList::new(),
            provider,
        }
    }

    /// Create a state that reports `page_size` to the host.
    pub fn with_page_size(provider: Arc<dyn LookupProvider>, page_size: usize) -> Self {
        Self {
            candidates: CandidateList::with_page_size(page_size),
            ..Self::new(provider)
        }
    }

    pub fn phase(&self) -> Phase {
        if self.buffer.is_empty() {
            Phase::Empty
        } else {
            Phase::Composing
        }
    }

    /// The raw input typed so far.
    pub fn composition(&self) -> &str {
        self.buffer.text()
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.candidates.candidates()
    }

    pub fn page_info(&self) -> PageInfo {
        self.candidates.page_info()
    }

    /// Apply one event.
    ///
    /// Errors leave the state untouched.
    pub fn apply(&mut self, event: CompositionEvent) -> Result<KeyResult> {
        let result = match event {
            CompositionEvent::Symbol(ch) => Ok(self.push_symbol(ch)),
            CompositionEvent::Erase => {
                self.erase();
                Ok(KeyResult::Handled)
            }
            CompositionEvent::Commit => self.commit().map(|()| KeyResult::Handled),
            CompositionEvent::Select(index) => self.select(index).map(KeyResult::Selected),
            CompositionEvent::Clear => {
                self.clear();
                Ok(KeyResult::Handled)
            }
            CompositionEvent::Unrecognized(_) => Ok(KeyResult::NotHandled),
        };
        tracing::debug!(
            ?event,
            composition = self.composition(),
            candidates = self.candidates.len(),
            "applied event"
        );
        result
    }

    /// Decode and apply a host key event.
    pub fn process_key(&mut self, key: KeyEvent) -> Result<KeyResult> {
        self.apply(key.into())
    }

    /// Append a symbol. Symbols outside the input alphabet are not handled.
    pub fn push_symbol(&mut self, ch: char) -> KeyResult {
        if !is_input_symbol(ch) {
            return KeyResult::NotHandled;
        }
        self.buffer.push(ch);
        self.refresh_candidates();
        KeyResult::Handled
    }

    /// Remove the last symbol. No-op on an empty buffer.
    pub fn erase(&mut self) {
        if self.buffer.pop().is_some() {
            self.refresh_candidates();
        }
    }

    /// Check that there is something to commit. Does not change state; the
    /// host decides which candidate (if any) Enter accepts.
    pub fn commit(&self) -> Result<()> {
        if self.candidates.is_empty() {
            Err(Error::NothingToCommit)
        } else {
            Ok(())
        }
    }

    /// Take the candidate at `index` and reset to Empty.
    pub fn select(&mut self, index: usize) -> Result<String> {
        let text = match self.candidates.get(index) {
            Some(candidate) => candidate.text.clone(),
            None => {
                return Err(Error::OutOfRange {
                    index,
                    len: self.candidates.len(),
                })
            }
        };
        self.clear();
        Ok(text)
    }

    /// Reset to Empty.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.candidates.clear();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            composition: self.composition().to_string(),
            candidates: self.candidates().to_vec(),
            page: self.page_info(),
        }
    }

    fn refresh_candidates(&mut self) {
        if self.buffer.is_empty() {
            self.candidates.clear();
        } else {
            let found = self.provider.lookup(self.buffer.text());
            self.candidates.set_candidates(found);
        }
    }
}

impl fmt::Debug for CompositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionState")
            .field("buffer", &self.buffer)
            .field("candidates", &self.candidates)
            .field("provider", &self.provider.name())
            .finish()
    }
}
