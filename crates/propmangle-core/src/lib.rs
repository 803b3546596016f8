#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! propmangle-core: deterministic property and global name mangling.
//!
//! A run walks a parsed script, decides for every name-holding node whether
//! it is a property or unresolved global (renamed) or a local binding (kept),
//! and rewrites the renamed ones through a [`NameTable`] so that one name
//! always maps to one substitute for as long as the table lives.

pub mod alphabet;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod mangler;
pub mod policy;
pub mod scope;
pub mod traverse;
pub mod version;

pub use alphabet::{debug_name, AlphabetPolicy, Generator, SharedAlphabet};
pub use cache::{CacheSnapshot, NameCache, NameTable, SharedNameCache, Substitute, SubstituteMode};
pub use classify::{classify, BindingQuery, Verdict};
pub use config::{AlphabetKind, CacheOptions, MangleConfig, MangleOptions, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use mangler::{MangleStats, PropertyMangler};
pub use policy::RenamePolicy;
pub use scope::{is_builtin_global, ScopeId, ScopeKind, ScopeTree, ScopeView};
pub use traverse::{mangle_program, mangle_source, MangleOutput};
pub use version::VERSION;
