//! Session operations behind the exported C functions.
//!
//! `Bridge` owns a `SessionRegistry` and turns every operation into a
//! `RimeResult`. Failures are encoded as data; no method panics or returns a
//! Rust error to the caller. Hosts embedding the library from Rust (and the
//! tests) can hold as many independent bridges as they like; the C exports
//! use a single process-wide one.

use crate::transfer::{RimeResult, Status};
use rimebridge_core::{
    load_provider, CompositionEvent, CompositionState, Config, DataPaths, Error, KeyEvent,
    KeyResult, LookupProvider, SessionId, SessionRegistry,
};
use std::sync::Arc;

/// Version string returned by `RimeGetVersion`.
#[cfg(feature = "lexicon")]
pub const VERSION: &str = concat!(
    "rimebridge v",
    env!("CARGO_PKG_VERSION"),
    " (lexicon backend)"
);
#[cfg(not(feature = "lexicon"))]
pub const VERSION: &str = concat!(
    "rimebridge v",
    env!("CARGO_PKG_VERSION"),
    " (built-in dictionary)"
);

pub fn version() -> &'static str {
    VERSION
}

/// Whether the compiled-lexicon backend is linked into this build.
pub fn is_available() -> bool {
    cfg!(feature = "lexicon")
}

#[derive(Debug)]
pub struct Bridge {
    registry: SessionRegistry,
    defaults: Config,
}

impl Bridge {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// `config` supplies the session limit and the settings of sessions whose
    /// user directory has no config file.
    ///
    /// The session limit is fixed here for the bridge's lifetime; a
    /// `max_sessions` in a user directory's config file does not change it.
    pub fn with_config(config: Config) -> Self {
        Self {
            registry: SessionRegistry::with_max_sessions(config.max_sessions),
            defaults: config,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Create a session whose provider and config come from `paths`.
    ///
    /// Returns `SessionId::INVALID` when no session can be created.
    pub fn initialize(&mut self, paths: &DataPaths) -> SessionId {
        let config = Config::load_or(paths, &self.defaults);
        if config.max_sessions != self.registry.max_sessions() {
            tracing::warn!(
                requested = config.max_sessions,
                limit = self.registry.max_sessions(),
                "max_sessions in a user config file is ignored; set it on the bridge"
            );
        }
        let provider = load_provider(paths, &config);
        self.insert(CompositionState::with_page_size(provider, config.page_size))
    }

    /// Create a session backed by a caller-supplied provider.
    pub fn initialize_with_provider(&mut self, provider: Arc<dyn LookupProvider>) -> SessionId {
        self.insert(CompositionState::with_page_size(provider, self.defaults.page_size))
    }

    fn insert(&mut self, state: CompositionState) -> SessionId {
        match self.registry.create(state) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("initialize failed: {}", e);
                SessionId::INVALID
            }
        }
    }

    /// Destroy a session. Unknown handles are ignored.
    pub fn destroy(&mut self, id: SessionId) {
        self.registry.destroy(id);
    }

    pub fn process_key(&mut self, id: SessionId, key_code: i32) -> RimeResult {
        tracing::debug!(session = %id, key_code, "process_key");
        self.apply(id, KeyEvent::from_keysym(key_code).into())
    }

    /// Negative indices are out of range like any other.
    pub fn select_candidate(&mut self, id: SessionId, index: i32) -> RimeResult {
        tracing::debug!(session = %id, index, "select_candidate");
        let index = usize::try_from(index).unwrap_or(usize::MAX);
        self.apply(id, CompositionEvent::Select(index))
    }

    pub fn clear_composition(&mut self, id: SessionId) -> RimeResult {
        tracing::debug!(session = %id, "clear_composition");
        self.apply(id, CompositionEvent::Clear)
    }

    pub fn current_state(&self, id: SessionId) -> RimeResult {
        match self.registry.get(id) {
            Ok(state) => RimeResult::encode(Status::Ok, None, None, Some(state)),
            Err(e) => error_result(&e),
        }
    }

    fn apply(&mut self, id: SessionId, event: CompositionEvent) -> RimeResult {
        let state = match self.registry.get_mut(id) {
            Ok(state) => state,
            Err(e) => return error_result(&e),
        };
        let outcome = state.apply(event);
        respond(state, outcome)
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

fn respond(state: &CompositionState, outcome: rimebridge_core::Result<KeyResult>) -> RimeResult {
    match outcome {
        Ok(KeyResult::Handled) => RimeResult::encode(Status::Ok, None, None, Some(state)),
        Ok(KeyResult::NotHandled) => {
            RimeResult::encode(Status::NotHandled, None, None, Some(state))
        }
        Ok(KeyResult::Selected(text)) => {
            RimeResult::encode(Status::Ok, None, Some(&text), Some(state))
        }
        Err(e) => {
            tracing::debug!("operation failed: {}", e);
            RimeResult::encode(Status::Failed, Some(&e.to_string()), None, Some(state))
        }
    }
}

/// Failure that is not tied to a live session; the state block stays zeroed.
fn error_result(error: &Error) -> RimeResult {
    tracing::debug!("{}", error);
    RimeResult::failure(&error.to_string())
}
