use crate::alphabet::{AlphabetPolicy, SharedAlphabet};
use crate::error::{Error, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File name looked up in the working directory when no config is given.
pub const CONFIG_FILE_NAME: &str = "propmangle.json";

/// Names that reach the global object by default.
pub const DEFAULT_GLOBAL_ALIASES: [&str; 4] = ["window", "self", "global", "exports"];

/// Per-run settings for a mangling pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangleOptions {
    /// Names never renamed.
    pub reserved: FxHashSet<String>,
    /// Names treated as the global object: never renamed themselves, while
    /// the properties accessed through them are.
    pub global_aliases: FxHashSet<String>,
    /// When set, substitutes are the readable `_$name$suffix_` form with this
    /// suffix instead of generated names.
    pub debug: Option<String>,
}

impl Default for MangleOptions {
    fn default() -> Self {
        Self {
            reserved: FxHashSet::default(),
            global_aliases: DEFAULT_GLOBAL_ALIASES.iter().map(ToString::to_string).collect(),
            debug: None,
        }
    }
}

impl MangleOptions {
    /// Add names that must never be renamed.
    #[must_use]
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    /// Replace the set of global aliases.
    #[must_use]
    pub fn with_global_aliases<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_aliases = names.into_iter().map(Into::into).collect();
        self
    }

    /// Turn on debug names with the given suffix.
    #[must_use]
    pub fn with_debug(mut self, suffix: impl Into<String>) -> Self {
        self.debug = Some(suffix.into());
        self
    }

    /// Whether `name` is reserved or a global alias.
    #[must_use]
    pub fn is_protected(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.global_aliases.contains(name)
    }
}

/// Settings fixed for the lifetime of a name cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    pub alphabet: AlphabetPolicy,
    /// Prepended to every generated name.
    pub prefix: String,
    /// Shuffle the alphabet once with this seed.
    pub shuffle_seed: Option<u64>,
}

/// Alphabet selector in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphabetKind {
    #[default]
    Disjoint,
    Shared,
}

impl AlphabetKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disjoint => "disjoint",
            Self::Shared => "shared",
        }
    }
}

/// On-disk configuration (`propmangle.json`). Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MangleConfig {
    pub reserved_names: Vec<String>,
    /// Replaces the default aliases when present.
    pub global_aliases: Option<Vec<String>>,
    pub debug: bool,
    pub debug_suffix: String,
    pub identifier_prefix: String,
    pub randomise_alphabet: bool,
    /// Seed for `randomiseAlphabet`; a random one is drawn when absent.
    pub alphabet_seed: Option<u64>,
    pub alphabet: AlphabetKind,
    pub shared_alphabet: SharedAlphabet,
}

impl MangleConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `propmangle.json` from `dir` if it exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Per-run options described by this config.
    #[must_use]
    pub fn mangle_options(&self) -> MangleOptions {
        let mut options = MangleOptions::default().with_reserved(self.reserved_names.iter().cloned());
        if let Some(aliases) = &self.global_aliases {
            options = options.with_global_aliases(aliases.iter().cloned());
        }
        if self.debug {
            options = options.with_debug(self.debug_suffix.clone());
        }
        options
    }

    /// Cache options described by this config.
    ///
    /// With `randomiseAlphabet` and no `alphabetSeed`, a seed is drawn here;
    /// it is logged so the run can be reproduced.
    #[must_use]
    pub fn cache_options(&self) -> CacheOptions {
        let alphabet = match self.alphabet {
            AlphabetKind::Disjoint => AlphabetPolicy::Disjoint,
            AlphabetKind::Shared => AlphabetPolicy::Shared(self.shared_alphabet),
        };
        let shuffle_seed = if self.randomise_alphabet {
            let seed = self.alphabet_seed.unwrap_or_else(rand::random);
            debug!(seed, alphabet = self.alphabet.as_str(), "shuffling alphabet");
            Some(seed)
        } else {
            None
        };
        CacheOptions {
            alphabet,
            prefix: self.identifier_prefix.clone(),
            shuffle_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aliases() {
        let options = MangleOptions::default();
        for alias in ["window", "self", "global", "exports"] {
            assert!(options.is_protected(alias));
        }
        assert!(!options.is_protected("document"));
        assert!(options.debug.is_none());
    }

    #[test]
    fn test_builders() {
        let options = MangleOptions::default()
            .with_reserved(["foo"])
            .with_global_aliases(["root"])
            .with_debug("x");
        assert!(options.is_protected("foo"));
        assert!(options.is_protected("root"));
        assert!(!options.is_protected("window"));
        assert_eq!(options.debug.as_deref(), Some("x"));
    }

    #[test]
    fn test_parse_camel_case_config() {
        let json = r#"{
            "reservedNames": ["keep"],
            "globalAliases": ["globalThis"],
            "debug": true,
            "debugSuffix": "dbg",
            "identifierPrefix": "p_",
            "alphabet": "shared",
            "sharedAlphabet": { "digits": false }
        }"#;
        let config: MangleConfig = serde_json::from_str(json).unwrap();
        let options = config.mangle_options();
        assert!(options.reserved.contains("keep"));
        assert!(options.global_aliases.contains("globalThis"));
        assert!(!options.global_aliases.contains("window"));
        assert_eq!(options.debug.as_deref(), Some("dbg"));

        let cache = config.cache_options();
        assert_eq!(cache.prefix, "p_");
        assert_eq!(
            cache.alphabet,
            AlphabetPolicy::Shared(SharedAlphabet {
                letters: true,
                digits: false,
                punctuation: true
            })
        );
        assert_eq!(cache.shuffle_seed, None);
    }

    #[test]
    fn test_seeded_randomise() {
        let config = MangleConfig {
            randomise_alphabet: true,
            alphabet_seed: Some(42),
            ..Default::default()
        };
        assert_eq!(config.cache_options().shuffle_seed, Some(42));
    }

    #[test]
    fn test_load_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MangleConfig::discover(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"reservedNames": ["a"]}"#).unwrap();
        let config = MangleConfig::discover(dir.path()).unwrap().unwrap();
        assert_eq!(config.reserved_names, vec!["a".to_string()]);

        std::fs::write(dir.path().join("bad.json"), "{").unwrap();
        assert!(matches!(
            MangleConfig::load(&dir.path().join("bad.json")),
            Err(Error::ConfigParse { .. })
        ));
        assert!(matches!(
            MangleConfig::load(&dir.path().join("missing.json")),
            Err(Error::ConfigRead { .. })
        ));
    }
}
