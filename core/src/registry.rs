//! Session registry.
//!
//! Maps opaque session handles to their `CompositionState`. Handles start at 1
//! and only ever grow, so a destroyed handle is never handed out again by the
//! same registry. Handle 0 is reserved for "invalid / failed".

use crate::composition::CompositionState;
use crate::error::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default upper bound on concurrently live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Largest handle that still fits the host's signed `int`.
const MAX_HANDLE: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u32);

impl SessionId {
    pub const INVALID: SessionId = SessionId(0);

    pub fn from_raw(raw: u32) -> Self {
        SessionId(raw)
    }

    /// Convert a host handle. Negative values map to `INVALID`.
    pub fn from_handle(handle: i32) -> Self {
        u32::try_from(handle).map(SessionId).unwrap_or(Self::INVALID)
    }

    /// Host representation; every id the registry issues fits.
    pub fn to_handle(self) -> i32 {
        i32::try_from(self.0).unwrap_or(0)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exclusive owner of all live composition states.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: AHashMap<SessionId, CompositionState>,
    next_id: u32,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_max_sessions(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            sessions: AHashMap::new(),
            next_id: 1,
            max_sessions,
        }
    }

    /// Insert a new session and return its handle.
    pub fn create(&mut self, state: CompositionState) -> Result<SessionId> {
        if self.sessions.len() >= self.max_sessions || self.next_id > MAX_HANDLE {
            tracing::warn!(
                live = self.sessions.len(),
                next = self.next_id,
                "session capacity exhausted"
            );
            return Err(Error::ResourceExhausted);
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.sessions.insert(id, state);
        tracing::info!(session = %id, "session created");
        Ok(id)
    }

    /// Remove and drop a session. Unknown handles are ignored.
    ///
    /// Returns whether a session was removed.
    pub fn destroy(&mut self, id: SessionId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::info!(session = %id, "session destroyed");
        } else {
            tracing::debug!(session = %id, "destroy on unknown session");
        }
        removed
    }

    pub fn get(&self, id: SessionId) -> Result<&CompositionState> {
        self.sessions.get(&id).ok_or(Error::InvalidSession(id))
    }

    pub fn get_mut(&mut self, id: SessionId) -> Result<&mut CompositionState> {
        self.sessions.get_mut(&id).ok_or(Error::InvalidSession(id))
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Live handles in ascending order.
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LexiconProvider;
    use std::sync::Arc;

    fn state() -> CompositionState {
        CompositionState::new(Arc::new(LexiconProvider::builtin()))
    }

    #[test]
    fn handles_start_at_one_and_increase() {
        let mut reg = SessionRegistry::new();
        let a = reg.create(state()).unwrap();
        let b = reg.create(state()).unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(reg.ids(), vec![a, b]);
    }

    #[test]
    fn handles_are_not_reused_after_destroy() {
        let mut reg = SessionRegistry::new();
        let a = reg.create(state()).unwrap();
        assert!(reg.destroy(a));
        let b = reg.create(state()).unwrap();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut reg = SessionRegistry::new();
        let a = reg.create(state()).unwrap();
        assert!(reg.destroy(a));
        assert!(!reg.destroy(a));
        assert!(!reg.destroy(SessionId::INVALID));
        assert!(!reg.destroy(SessionId::from_raw(999)));
        assert!(reg.is_empty());
    }

    #[test]
    fn lookup_of_unknown_handle_is_an_error() {
        let mut reg = SessionRegistry::new();
        assert!(matches!(reg.get(SessionId::from_raw(7)), Err(Error::InvalidSession(_))));
        assert!(matches!(reg.get_mut(SessionId::INVALID), Err(Error::InvalidSession(_))));
    }

    #[test]
    fn sessions_are_isolated() {
        let mut reg = SessionRegistry::new();
        let a = reg.create(state()).unwrap();
        let b = reg.create(state()).unwrap();
        reg.get_mut(a).unwrap().push_symbol('n');
        assert_eq!(reg.get(a).unwrap().composition(), "n");
        assert_eq!(reg.get(b).unwrap().composition(), "");
    }

    #[test]
    fn session_limit_exhausts() {
        let mut reg = SessionRegistry::with_max_sessions(2);
        let a = reg.create(state()).unwrap();
        reg.create(state()).unwrap();
        assert!(matches!(reg.create(state()), Err(Error::ResourceExhausted)));

        reg.destroy(a);
        let c = reg.create(state()).unwrap();
        assert_eq!(c.get(), 3);
    }

    #[test]
    fn handle_space_exhausts() {
        let mut reg = SessionRegistry::new();
        reg.next_id = MAX_HANDLE;
        let last = reg.create(state()).unwrap();
        assert_eq!(last.to_handle(), i32::MAX);
        assert!(matches!(reg.create(state()), Err(Error::ResourceExhausted)));
    }

    #[test]
    fn host_handle_conversion() {
        assert_eq!(SessionId::from_handle(-5), SessionId::INVALID);
        assert_eq!(SessionId::from_handle(0), SessionId::INVALID);
        assert_eq!(SessionId::from_handle(12).get(), 12);
        assert!(!SessionId::INVALID.is_valid());
    }
}
