//! Fixed-layout result structures handed across the C boundary.
//!
//! `RimeResult` is what every session call writes into the host's out-pointer.
//! Strings are stored inline in fixed `char` arrays; the candidate list is the
//! only heap allocation. Ownership of that array passes to the host with the
//! result and comes back through [`RimeResult::release`] (`RimeFreeResult`).
//!
//! Known limitation: strings longer than their array are truncated silently
//! (at a UTF-8 character boundary) rather than reported.

use rimebridge_core::{Candidate, CompositionState, PageInfo, Snapshot};
use serde::Serialize;
use std::ffi::{c_char, c_int};
use std::ptr;

pub const ERROR_MESSAGE_CAPACITY: usize = 512;
pub const SELECTED_TEXT_CAPACITY: usize = 256;
pub const COMPOSITION_CAPACITY: usize = 512;
pub const CANDIDATE_TEXT_CAPACITY: usize = 256;
pub const CANDIDATE_COMMENT_CAPACITY: usize = 256;

/// `success` value: the operation was applied.
pub const RIME_STATUS_OK: c_int = 1;
/// `success` value: the operation failed; see `error_message`.
pub const RIME_STATUS_FAILED: c_int = 0;
/// `success` value: the key is outside the IME alphabet; the host should
/// handle it as ordinary text input.
pub const RIME_STATUS_NOT_HANDLED: c_int = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Ok,
    Failed,
    NotHandled,
}

impl Status {
    pub fn as_raw(self) -> c_int {
        match self {
            Status::Ok => RIME_STATUS_OK,
            Status::Failed => RIME_STATUS_FAILED,
            Status::NotHandled => RIME_STATUS_NOT_HANDLED,
        }
    }

    /// Unknown values read as `Failed`.
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            RIME_STATUS_OK => Status::Ok,
            RIME_STATUS_NOT_HANDLED => Status::NotHandled,
            _ => Status::Failed,
        }
    }
}

/// One candidate as the host sees it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RimeCandidate {
    pub text: [c_char; CANDIDATE_TEXT_CAPACITY],
    pub comment: [c_char; CANDIDATE_COMMENT_CAPACITY],
    pub index: c_int,
}

impl RimeCandidate {
    fn new(index: usize, candidate: &Candidate) -> Self {
        let mut out = RimeCandidate {
            text: [0; CANDIDATE_TEXT_CAPACITY],
            comment: [0; CANDIDATE_COMMENT_CAPACITY],
            index: to_c_int(index),
        };
        write_c_str(&mut out.text, &candidate.text);
        write_c_str(&mut out.comment, &candidate.annotation);
        out
    }

    pub fn text(&self) -> String {
        read_c_str(&self.text)
    }

    pub fn comment(&self) -> String {
        read_c_str(&self.comment)
    }
}

/// Composition state block embedded in every result.
///
/// `candidates` is either null (with `candidate_count == 0`) or an array of
/// exactly `candidate_count` elements allocated by this library.
#[repr(C)]
#[derive(Debug)]
pub struct RimeInputState {
    composition: [c_char; COMPOSITION_CAPACITY],
    candidates: *mut RimeCandidate,
    candidate_count: c_int,
    page_size: c_int,
    page_no: c_int,
    is_last_page: c_int,
}

impl RimeInputState {
    fn zeroed() -> Self {
        Self {
            composition: [0; COMPOSITION_CAPACITY],
            candidates: ptr::null_mut(),
            candidate_count: 0,
            page_size: 0,
            page_no: 0,
            is_last_page: 0,
        }
    }

    fn fill(&mut self, state: &CompositionState) {
        if write_c_str(&mut self.composition, state.composition()) {
            tracing::debug!(len = state.composition().len(), "composition truncated");
        }

        let page = state.page_info();
        self.page_size = to_c_int(page.page_size);
        self.page_no = to_c_int(page.page_no);
        self.is_last_page = c_int::from(page.is_last_page);

        let candidates = state.candidates();
        if candidates.is_empty() {
            return;
        }
        let items: Box<[RimeCandidate]> = candidates
            .iter()
            .take(c_int::MAX as usize)
            .enumerate()
            .map(|(i, c)| RimeCandidate::new(i, c))
            .collect();
        self.candidate_count = to_c_int(items.len());
        self.candidates = Box::into_raw(items).cast::<RimeCandidate>();
    }

    pub fn composition(&self) -> String {
        read_c_str(&self.composition)
    }

    pub fn candidate_count(&self) -> usize {
        if self.candidates.is_null() {
            0
        } else {
            usize::try_from(self.candidate_count).unwrap_or(0)
        }
    }

    /// The candidate array as a slice (empty when absent).
    pub fn candidates(&self) -> &[RimeCandidate] {
        let len = self.candidate_count();
        if len == 0 {
            return &[];
        }
        // SAFETY: the pointer and count were produced together by `fill` from
        // a boxed slice of exactly `len` elements and stay untouched until
        // `release`, which resets both.
        unsafe { std::slice::from_raw_parts(self.candidates, len) }
    }

    pub fn candidates_ptr(&self) -> *const RimeCandidate {
        self.candidates
    }

    pub fn page_info(&self) -> PageInfo {
        PageInfo {
            page_size: usize::try_from(self.page_size).unwrap_or(0),
            page_no: usize::try_from(self.page_no).unwrap_or(0),
            is_last_page: self.is_last_page != 0,
        }
    }

    fn release(&mut self) {
        let len = self.candidate_count();
        if len > 0 {
            let slice = ptr::slice_from_raw_parts_mut(self.candidates, len);
            // SAFETY: see `candidates`; after this the pointer is nulled so a
            // second release finds nothing to free.
            drop(unsafe { Box::from_raw(slice) });
        }
        self.candidates = ptr::null_mut();
        self.candidate_count = 0;
    }
}

/// Outcome of one boundary call.
#[repr(C)]
#[derive(Debug)]
pub struct RimeResult {
    success: c_int,
    error_message: [c_char; ERROR_MESSAGE_CAPACITY],
    selected_text: [c_char; SELECTED_TEXT_CAPACITY],
    state: RimeInputState,
}

impl RimeResult {
    /// A result with every field zeroed (status `Failed`, no state).
    pub fn zeroed() -> Self {
        Self {
            success: RIME_STATUS_FAILED,
            error_message: [0; ERROR_MESSAGE_CAPACITY],
            selected_text: [0; SELECTED_TEXT_CAPACITY],
            state: RimeInputState::zeroed(),
        }
    }

    /// Build a result snapshot.
    ///
    /// Without `state` the state block stays zeroed; it never refers to a
    /// session that does not exist.
    pub fn encode(
        status: Status,
        error: Option<&str>,
        selected: Option<&str>,
        state: Option<&CompositionState>,
    ) -> Self {
        let mut result = Self::zeroed();
        result.success = status.as_raw();
        if let Some(message) = error {
            write_c_str(&mut result.error_message, message);
        }
        if let Some(text) = selected {
            write_c_str(&mut result.selected_text, text);
        }
        if let Some(state) = state {
            result.state.fill(state);
        }
        result
    }

    /// Failed result without a state block.
    pub fn failure(message: &str) -> Self {
        Self::encode(Status::Failed, Some(message), None, None)
    }

    /// Free the candidate array and reset pointer and count.
    ///
    /// Safe to call any number of times.
    pub fn release(&mut self) {
        self.state.release();
    }

    pub fn status(&self) -> Status {
        Status::from_raw(self.success)
    }

    pub fn is_success(&self) -> bool {
        self.success == RIME_STATUS_OK
    }

    pub fn error_message(&self) -> String {
        read_c_str(&self.error_message)
    }

    pub fn selected_text(&self) -> String {
        read_c_str(&self.selected_text)
    }

    pub fn state(&self) -> &RimeInputState {
        &self.state
    }

    /// Read the result back into owned values for inspection.
    pub fn decode(&self) -> DecodedResult {
        DecodedResult {
            status: self.status(),
            error_message: self.error_message(),
            selected_text: self.selected_text(),
            snapshot: Snapshot {
                composition: self.state.composition(),
                candidates: self
                    .state
                    .candidates()
                    .iter()
                    .map(|c| Candidate::new(c.text(), c.comment()))
                    .collect(),
                page: self.state.page_info(),
            },
        }
    }
}

impl Default for RimeResult {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Drop for RimeResult {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owned, Rust-side view of a `RimeResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedResult {
    pub status: Status,
    pub error_message: String,
    pub selected_text: String,
    pub snapshot: Snapshot,
}

/// Copy `src` into `dst` as a NUL-terminated string.
///
/// At most `dst.len() - 1` bytes are copied, cut back to a character boundary.
/// The remainder of `dst` is zeroed. Returns whether `src` was truncated.
pub fn write_c_str(dst: &mut [c_char], src: &str) -> bool {
    dst.fill(0);
    let Some(max) = dst.len().checked_sub(1) else {
        return !src.is_empty();
    };
    let mut end = src.len().min(max);
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    for (slot, byte) in dst.iter_mut().zip(&src.as_bytes()[..end]) {
        *slot = *byte as c_char;
    }
    end < src.len()
}

/// Read a NUL-terminated string out of a fixed array.
///
/// Stops at the first NUL or at the end of the array; invalid UTF-8 is
/// replaced.
pub fn read_c_str(src: &[c_char]) -> String {
    let bytes: Vec<u8> = src.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn to_c_int(value: usize) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}
