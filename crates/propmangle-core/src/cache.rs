//! The name cache: original name to substitute, plus the generation seed.
//!
//! Entries are append-only. Once a name has a substitute it keeps it for the
//! lifetime of the cache, which may span any number of runs and files.

use crate::alphabet::{debug_name, Generator};
use crate::config::CacheOptions;
use crate::error::{Error, Result};
use crate::version::SCHEMA_VERSION;
use propmangle_parser::is_reserved_word;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// How a missing substitute is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstituteMode<'a> {
    /// Next name from the generator.
    Generated,
    /// `_$name$suffix_` with this suffix.
    Debug(&'a str),
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitute {
    pub name: String,
    /// Whether the entry was created by this lookup.
    pub fresh: bool,
}

/// A store of substitutes the engine can draw from.
pub trait NameTable {
    /// The substitute for `name`, creating one if needed. Generated candidates
    /// for which `blocked` holds are skipped.
    fn substitute(&mut self, name: &str, mode: SubstituteMode<'_>, blocked: &dyn Fn(&str) -> bool) -> Substitute;
}

/// Serialisable copy of a cache's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub schema_version: u32,
    pub seed: u64,
    pub names: BTreeMap<String, String>,
}

impl CacheSnapshot {
    /// Read a snapshot written by [`CacheSnapshot::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::NameMapRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::NameMapParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the snapshot as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::other(e.to_string()))?;
        std::fs::write(path, json + "\n")?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct NameCache {
    generator: Generator,
    names: FxHashMap<String, String>,
    used: FxHashSet<String>,
    seed: u64,
}

impl NameCache {
    pub fn new(options: CacheOptions) -> Result<Self> {
        let generator = Generator::new(&options.alphabet, &options.prefix, options.shuffle_seed)?;
        Ok(Self {
            generator,
            names: FxHashMap::default(),
            used: FxHashSet::default(),
            seed: 0,
        })
    }

    /// Continue from a persisted table.
    ///
    /// The options must describe the alphabet the snapshot was generated
    /// with, or later names may repeat earlier ones.
    pub fn restore(options: CacheOptions, snapshot: CacheSnapshot) -> Result<Self> {
        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(Error::other(format!(
                "name map schema version {} is not supported (expected {SCHEMA_VERSION})",
                snapshot.schema_version
            )));
        }
        let mut cache = Self::new(options)?;
        cache.seed = snapshot.seed;
        for (name, substitute) in snapshot.names {
            cache.used.insert(substitute.clone());
            cache.names.insert(name, substitute);
        }
        debug!(names = cache.len(), seed = cache.seed, "restored name cache");
        Ok(cache)
    }

    /// Number of generated names handed out so far (including skipped candidates).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    /// Copy of the current table, ordered by original name.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            schema_version: SCHEMA_VERSION,
            seed: self.seed,
            names: self.names.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    fn next_generated(&mut self, blocked: &dyn Fn(&str) -> bool) -> String {
        loop {
            let candidate = self.generator.generate(self.seed);
            self.seed += 1;
            if is_reserved_word(&candidate) || blocked(&candidate) || self.used.contains(&candidate) {
                trace!(candidate = %candidate, "skipping unusable name");
                continue;
            }
            return candidate;
        }
    }
}

impl NameTable for NameCache {
    fn substitute(&mut self, name: &str, mode: SubstituteMode<'_>, blocked: &dyn Fn(&str) -> bool) -> Substitute {
        if let Some(existing) = self.names.get(name) {
            return Substitute {
                name: existing.clone(),
                fresh: false,
            };
        }

        let substitute = match mode {
            SubstituteMode::Generated => self.next_generated(blocked),
            SubstituteMode::Debug(suffix) => debug_name(name, suffix),
        };
        debug!(name, substitute = %substitute, seed = self.seed, "new substitute");
        self.used.insert(substitute.clone());
        self.names.insert(name.to_string(), substitute.clone());
        Substitute {
            name: substitute,
            fresh: true,
        }
    }
}

/// A name cache shared between threads.
///
/// Each lookup holds the lock for the whole check, generate and insert
/// sequence, so two runs can never assign different substitutes to one name.
#[derive(Debug, Clone)]
pub struct SharedNameCache(Arc<Mutex<NameCache>>);

impl SharedNameCache {
    pub fn new(cache: NameCache) -> Self {
        Self(Arc::new(Mutex::new(cache)))
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).snapshot()
    }

    pub fn seed(&self) -> u64 {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).seed()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NameTable for SharedNameCache {
    fn substitute(&mut self, name: &str, mode: SubstituteMode<'_>, blocked: &dyn Fn(&str) -> bool) -> Substitute {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .substitute(name, mode, blocked)
    }
}
