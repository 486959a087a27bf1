//! rimebridge-core
//!
//! Session-oriented input-method composition core used by the `rimebridge`
//! C boundary. Nothing in this crate keeps global state: a host (or a test)
//! owns a `SessionRegistry` and drives `CompositionState`s through it.
//!
//! Public API:
//! - `CompositionState` - Buffer + candidate state machine of one session
//! - `SessionRegistry` - Handle → state map with create/destroy lifecycle
//! - `LookupProvider` - Pluggable composition → candidates capability
//! - `Lexicon` / `LexiconProvider` - Dictionary-backed provider
//! - `CachedProvider` - LRU cache in front of a provider
//! - `KeyEvent` / `KeyResult` - Host key codes and processing outcome
//! - `Config` - Per-session configuration
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod candidate;
pub use candidate::{Candidate, CandidateList, PageInfo, DEFAULT_PAGE_SIZE};

pub mod composition;
pub use composition::{CompositionEvent, CompositionState, Phase, Snapshot};

pub mod error;
pub use error::{Error, Result};

pub mod input_buffer;
pub use input_buffer::InputBuffer;

pub mod keys;
pub use keys::{KeyEvent, KeyResult, KEY_BACKSPACE, KEY_RETURN};

pub mod lexicon;
pub use lexicon::{LexEntry, Lexicon};

pub mod provider;
pub use provider::{load_provider, CachedProvider, DataPaths, LexiconProvider, LookupProvider};

pub mod registry;
pub use registry::{SessionId, SessionRegistry, DEFAULT_MAX_SESSIONS};

/// Name of the config file looked up in the user data directory.
pub const CONFIG_FILE: &str = "rimebridge.toml";

/// Session configuration.
///
/// Missing fields take their defaults, so a config file only needs to list
/// what it changes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Page size reported to the host with every candidate list
    pub page_size: usize,

    /// Maximum number of live sessions per registry
    pub max_sessions: usize,

    // Cache Management
    /// Maximum number of entries in the composition -> candidates cache (0 disables it)
    pub max_cache_size: usize,

    /// Prefix of each candidate's annotation; the composition is appended
    pub annotation_prefix: String,

    /// Maximum candidates per lookup (0 = unlimited)
    pub candidate_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_sessions: DEFAULT_MAX_SESSIONS,
            // 1000 entries is plenty for interactive typing
            max_cache_size: 1000,
            annotation_prefix: "拼音: ".to_string(),
            candidate_limit: 0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load the config for a session from its user directory, falling back
    /// to `fallback`.
    ///
    /// A missing file is not worth a warning; an unreadable or malformed one is.
    pub fn load_or(paths: &DataPaths, fallback: &Config) -> Self {
        let Some(path) = paths.config_file() else {
            return fallback.clone();
        };
        if !path.exists() {
            return fallback.clone();
        }
        match Self::load_toml(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring config: {}", e);
                fallback.clone()
            }
        }
    }

    pub fn load_or_default(paths: &DataPaths) -> Self {
        Self::load_or(paths, &Self::default())
    }
}
