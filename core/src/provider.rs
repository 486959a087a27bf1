//! Lookup providers: the pluggable capability that turns a composition string
//! into an ordered candidate list.
//!
//! `CompositionState` only sees `dyn LookupProvider`. The crate ships:
//! - `LexiconProvider`: layered `Lexicon` lookup with a fixed annotation prefix
//! - `CachedProvider`: LRU memoisation in front of any provider
//! - `load_provider`: builds the provider for a new session from its data paths

use crate::candidate::Candidate;
use crate::lexicon::Lexicon;
use crate::Config;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File names looked up inside the data directories.
pub const USER_DICTIONARY_FILE: &str = "user_dictionary.json";
pub const SHARED_DICTIONARY_FILE: &str = "dictionary.json";
pub const LEXICON_FST_FILE: &str = "lexicon.fst";
pub const LEXICON_BINCODE_FILE: &str = "lexicon.bincode";

/// Maps a composition string to its ranked candidates.
///
/// Implementations must be deterministic for a given input and must not block
/// for long: they are called synchronously on every buffer change.
pub trait LookupProvider: Send + Sync {
    /// Ranked candidates for `composition`; empty when nothing matches.
    fn lookup(&self, composition: &str) -> Vec<Candidate>;

    /// Human-readable name (for logging).
    fn name(&self) -> &str {
        "provider"
    }
}

impl<P: LookupProvider + ?Sized> LookupProvider for Arc<P> {
    fn lookup(&self, composition: &str) -> Vec<Candidate> {
        (**self).lookup(composition)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: LookupProvider + ?Sized> LookupProvider for Box<P> {
    fn lookup(&self, composition: &str) -> Vec<Candidate> {
        (**self).lookup(composition)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Provider backed by one or more lexicons.
///
/// Layers are consulted in order and their phrases concatenated, dropping
/// phrases an earlier layer already produced. Each candidate is annotated with
/// `annotation_prefix` followed by the composition.
#[derive(Debug, Clone)]
pub struct LexiconProvider {
    layers: Vec<Lexicon>,
    annotation_prefix: String,
    limit: usize,
}

impl LexiconProvider {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            layers: vec![lexicon],
            annotation_prefix: Config::default().annotation_prefix,
            limit: 0,
        }
    }

    /// Provider over the built-in demo dictionary.
    pub fn builtin() -> Self {
        Self::new(Lexicon::builtin())
    }

    pub fn from_layers(layers: Vec<Lexicon>) -> Self {
        Self {
            layers,
            ..Self::new(Lexicon::new())
        }
    }

    pub fn with_annotation_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.annotation_prefix = prefix.into();
        self
    }

    /// Cap the number of candidates returned; 0 means unlimited.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl LookupProvider for LexiconProvider {
    fn lookup(&self, composition: &str) -> Vec<Candidate> {
        let mut phrases: Vec<String> = Vec::new();
        for layer in &self.layers {
            for phrase in layer.lookup(composition) {
                if !phrases.contains(&phrase) {
                    phrases.push(phrase);
                }
            }
        }
        if self.limit > 0 {
            phrases.truncate(self.limit);
        }

        let annotation = format!("{}{}", self.annotation_prefix, composition);
        phrases
            .into_iter()
            .map(|text| Candidate::new(text, annotation.clone()))
            .collect()
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

struct CacheState {
    entries: lru::LruCache<String, Vec<Candidate>>,
    hits: usize,
    misses: usize,
}

/// LRU cache in front of another provider.
///
/// Typing and erasing revisit the same prefixes, so most backspaces are hits.
/// The cache assumes the inner provider is deterministic.
pub struct CachedProvider<P> {
    inner: P,
    state: Mutex<CacheState>,
}

impl<P: LookupProvider> CachedProvider<P> {
    pub fn new(inner: P, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            state: Mutex::new(CacheState {
                entries: lru::LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Get cache statistics for monitoring.
    ///
    /// Returns (hits, misses) tuple.
    pub fn cache_stats(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.hits, state.misses)
    }

    /// Get cache hit rate as a percentage (0.0 to 100.0).
    ///
    /// Returns None if no cache accesses have been made yet.
    pub fn cache_hit_rate(&self) -> Option<f32> {
        let (hits, misses) = self.cache_stats();
        let total = hits + misses;
        if total == 0 {
            None
        } else {
            Some((hits as f32 / total as f32) * 100.0)
        }
    }

    /// Get current cache size (number of entries).
    pub fn cache_size(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Get cache capacity (maximum entries).
    pub fn cache_capacity(&self) -> usize {
        self.state.lock().entries.cap().get()
    }

    /// Drop all cached entries and reset the statistics.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
    }
}

impl<P: LookupProvider> LookupProvider for CachedProvider<P> {
    fn lookup(&self, composition: &str) -> Vec<Candidate> {
        {
            let mut state = self.state.lock();
            if let Some(cached) = state.entries.get(composition).cloned() {
                state.hits += 1;
                return cached;
            }
            state.misses += 1;
        }

        // The inner lookup runs without the lock held.
        let candidates = self.inner.lookup(composition);
        self.state
            .lock()
            .entries
            .put(composition.to_string(), candidates.clone());
        candidates
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Data directories handed to `initialize`. Both are advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataPaths {
    pub user_data_dir: Option<PathBuf>,
    pub shared_data_dir: Option<PathBuf>,
}

impl DataPaths {
    pub fn new(user_data_dir: Option<PathBuf>, shared_data_dir: Option<PathBuf>) -> Self {
        Self {
            user_data_dir,
            shared_data_dir,
        }
    }

    /// Path of the per-user config file, if a user directory was given.
    pub fn config_file(&self) -> Option<PathBuf> {
        self.user_data_dir
            .as_ref()
            .map(|dir| dir.join(crate::CONFIG_FILE))
    }
}

/// Build the provider for a new session.
///
/// Layer order: the user dictionary (if present), then the shared compiled
/// lexicon or shared JSON dictionary, falling back to the built-in demo
/// dictionary when the shared directory yields nothing. Unreadable files are
/// logged and skipped; this never fails.
pub fn load_provider(paths: &DataPaths, config: &Config) -> Arc<dyn LookupProvider> {
    let mut layers = Vec::new();

    if let Some(dir) = &paths.user_data_dir {
        let path = dir.join(USER_DICTIONARY_FILE);
        if path.exists() {
            match Lexicon::load_json(&path) {
                Ok(lex) => {
                    tracing::debug!(
                        path = %path.display(),
                        keys = lex.len(),
                        "loaded user dictionary"
                    );
                    layers.push(lex);
                }
                Err(e) => tracing::warn!("skipping user dictionary: {:#}", e),
            }
        }
    }

    match paths.shared_data_dir.as_deref().and_then(load_shared_lexicon) {
        Some(lex) => layers.push(lex),
        None => {
            tracing::debug!("using built-in dictionary");
            layers.push(Lexicon::builtin());
        }
    }

    let provider = LexiconProvider::from_layers(layers)
        .with_annotation_prefix(config.annotation_prefix.clone())
        .with_limit(config.candidate_limit);

    match NonZeroUsize::new(config.max_cache_size) {
        Some(capacity) => Arc::new(CachedProvider::new(provider, capacity)),
        None => Arc::new(provider),
    }
}

fn load_shared_lexicon(dir: &Path) -> Option<Lexicon> {
    #[cfg(feature = "lexicon")]
    {
        let fst_path = dir.join(LEXICON_FST_FILE);
        let bincode_path = dir.join(LEXICON_BINCODE_FILE);
        if fst_path.exists() && bincode_path.exists() {
            match Lexicon::load_from_fst_bincode(&fst_path, &bincode_path) {
                Ok(lex) => {
                    tracing::debug!(dir = %dir.display(), "loaded compiled lexicon");
                    return Some(lex);
                }
                Err(e) => tracing::warn!("skipping compiled lexicon: {:#}", e),
            }
        }
    }

    let json_path = dir.join(SHARED_DICTIONARY_FILE);
    if json_path.exists() {
        match Lexicon::load_json(&json_path) {
            Ok(lex) => return Some(lex),
            Err(e) => tracing::warn!("skipping shared dictionary: {:#}", e),
        }
    }

    None
}
