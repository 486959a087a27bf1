//! Pinyin-key → phrase dictionary.
//!
//! Lookups map a joined pinyin key (e.g. "nihao") to an ordered list of
//! phrases. Entries live in an in-memory map; with the `lexicon` feature a
//! compiled FST index plus bincode payload vector can back the map.

use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lexicon entry matching the compiled payload format (`Vec<Vec<LexEntry>>`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LexEntry {
    pub utf8: String,
    pub token: u32,
    pub freq: u32,
}

/// Entries of the built-in demo dictionary.
const BUILTIN_ENTRIES: &[(&str, &[&str])] = &[
    ("ni", &["你", "尼", "泥"]),
    ("hao", &["好", "号", "豪"]),
    ("nihao", &["你好"]),
    ("shi", &["是", "时", "事"]),
    ("jie", &["界", "接", "街"]),
    ("shijie", &["世界"]),
    ("zhong", &["中", "钟", "重"]),
    ("guo", &["国", "果", "过"]),
    ("zhongguo", &["中国"]),
    ("wo", &["我", "握", "卧"]),
    ("ai", &["爱", "哀", "挨"]),
    ("woai", &["我爱"]),
];

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    // In-memory map for dynamic entries
    map: AHashMap<String, Vec<String>>,
    // FST map for key -> index lookups
    #[cfg(feature = "lexicon")]
    fst_map: Option<fst::Map<Vec<u8>>>,
    // Bincode-serialized payload vector (index -> Vec<LexEntry>)
    #[cfg(feature = "lexicon")]
    payloads: Option<Vec<Vec<LexEntry>>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// The small demo dictionary used when no data directory provides one.
    pub fn builtin() -> Self {
        let mut lex = Self::new();
        for (key, phrases) in BUILTIN_ENTRIES {
            for phrase in phrases.iter() {
                lex.insert(*key, *phrase);
            }
        }
        lex
    }

    /// Insert a mapping from pinyin key to phrase.
    ///
    /// Phrases keep insertion order; inserting the same phrase twice under one
    /// key is ignored.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, phrase: V) {
        let phrase = phrase.into();
        let entry = self.map.entry(key.into()).or_default();
        if !entry.contains(&phrase) {
            entry.push(phrase);
        }
    }

    /// Number of keys in the in-memory map (compiled entries are not counted).
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && !self.has_compiled()
    }

    /// Whether a compiled FST lexicon is attached.
    #[cfg(feature = "lexicon")]
    pub fn has_compiled(&self) -> bool {
        self.fst_map.is_some() && self.payloads.is_some()
    }

    #[cfg(not(feature = "lexicon"))]
    pub fn has_compiled(&self) -> bool {
        false
    }

    /// Lookup phrases for a given pinyin key.
    pub fn lookup(&self, key: &str) -> Vec<String> {
        // Prefer in-memory map entries
        if let Some(v) = self.map.get(key) {
            return v.clone();
        }

        #[cfg(feature = "lexicon")]
        {
            if let (Some(map), Some(payloads)) = (&self.fst_map, &self.payloads) {
                if let Some(entries) = map.get(key).and_then(|idx| payloads.get(idx as usize)) {
                    return entries.iter().map(|e| e.utf8.clone()).collect();
                }
            }
        }

        Vec::new()
    }

    /// Parse a JSON object of the form `{"ni": ["你", "尼"], ...}`.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: std::collections::BTreeMap<String, Vec<String>> =
            serde_json::from_str(content).context("parse dictionary json")?;
        let mut lex = Self::new();
        for (key, phrases) in raw {
            for phrase in phrases {
                lex.insert(key.clone(), phrase);
            }
        }
        Ok(lex)
    }

    /// Load a JSON dictionary file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read dictionary {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("load {}", path.display()))
    }

    /// Load lexicon from FST + bincode artifacts.
    ///
    /// - fst_path: lexicon.fst file mapping keys to indices
    /// - bincode_path: lexicon.bincode file containing Vec<Vec<LexEntry>>
    #[cfg(feature = "lexicon")]
    pub fn load_from_fst_bincode<P: AsRef<Path>>(fst_path: P, bincode_path: P) -> Result<Self> {
        let fst_path = fst_path.as_ref();
        let bincode_path = bincode_path.as_ref();

        let buf = std::fs::read(fst_path)
            .with_context(|| format!("open fst {}", fst_path.display()))?;
        let map = fst::Map::new(buf).context("fst map")?;

        let buf = std::fs::read(bincode_path)
            .with_context(|| format!("open bincode {}", bincode_path.display()))?;
        let payloads: Vec<Vec<LexEntry>> =
            bincode::deserialize(&buf).context("deserialize bincode")?;

        Ok(Self {
            map: AHashMap::new(),
            fst_map: Some(map),
            payloads: Some(payloads),
        })
    }
}
