use std::fmt::Write;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version of persisted name maps.
/// Bump this when the snapshot format changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

/// Returns a formatted version string including build metadata if available.
#[must_use]
pub fn version_string() -> String {
    let mut s = format!("propmangle {VERSION}");

    if let Some(hash) = option_env!("PROPMANGLE_BUILD_GIT_HASH") {
        let _ = write!(s, " ({hash})");
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_contains_version() {
        let vs = version_string();
        assert!(vs.contains(VERSION));
        assert!(vs.starts_with("propmangle "));
    }

    #[test]
    fn test_schema_version_positive() {
        const { assert!(SCHEMA_VERSION > 0) };
    }
}
