//! Candidate types for IME text conversion.
//!
//! This module provides:
//! - `Candidate`: A single text candidate with its annotation
//! - `CandidateList`: The derived candidate list of a session plus its paging fields
//! - `PageInfo`: The paging fields as they are reported to the host

use serde::{Deserialize, Serialize};

/// Default number of candidates per page reported to the host.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// A single text candidate.
///
/// Ranking is expressed by position in the provider's output; the candidate
/// carries no score of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    /// Free-form note shown next to the candidate (e.g. "拼音: ni").
    #[serde(default)]
    pub annotation: String,
}

impl Candidate {
    pub fn new<T: Into<String>, A: Into<String>>(text: T, annotation: A) -> Self {
        Candidate {
            text: text.into(),
            annotation: annotation.into(),
        }
    }

    /// Candidate without annotation.
    pub fn plain<T: Into<String>>(text: T) -> Self {
        Self::new(text, String::new())
    }
}

/// Paging fields of a candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_size: usize,
    pub page_no: usize,
    pub is_last_page: bool,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_no: 0,
            is_last_page: true,
        }
    }
}

/// The candidate list of one session.
///
/// All candidates are presented as a single page: `page_no` stays 0 and the
/// page is always the last one. `page_size` is carried through so a provider
/// that pages can be dropped in without changing the transfer layout.
#[derive(Debug, Clone)]
pub struct CandidateList {
    /// All available candidates
    candidates: Vec<Candidate>,

    /// Number of candidates per page
    page_size: usize,

    /// Current page index (0-based)
    current_page: usize,
}

impl CandidateList {
    /// Create a new empty candidate list.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create a candidate list with specified page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            page_size: page_size.max(1),
            current_page: 0,
        }
    }

    /// Get the page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the candidates, resetting pagination state.
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.current_page = 0;
    }

    /// Get all candidates.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Get the total number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Get the current page index (0-based).
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Paging fields for the host.
    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            page_size: self.page_size,
            page_no: self.current_page,
            is_last_page: true,
        }
    }

    /// Clear the candidate list.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.current_page = 0;
    }
}

impl Default for CandidateList {
    fn default() -> Self {
        Self::new()
    }
}
