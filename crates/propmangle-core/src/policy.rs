use crate::cache::{NameTable, Substitute, SubstituteMode};
use crate::classify::BindingQuery;
use crate::config::MangleOptions;
use std::fmt;

/// Decides whether a name is renamed and fetches its substitute.
#[derive(Clone, Copy)]
pub struct RenamePolicy<'a> {
    options: &'a MangleOptions,
    /// Names already taken by the program; never handed out as substitutes.
    taken: Option<&'a dyn BindingQuery>,
}

impl<'a> RenamePolicy<'a> {
    pub fn new(options: &'a MangleOptions) -> Self {
        Self { options, taken: None }
    }

    /// Also skip generated candidates for which `taken` holds.
    #[must_use]
    pub fn avoiding(mut self, taken: &'a dyn BindingQuery) -> Self {
        self.taken = Some(taken);
        self
    }

    /// The name to emit in place of `name`.
    pub fn rename<T: NameTable + ?Sized>(&self, name: &str, table: &mut T) -> String {
        self.resolve(name, table).name
    }

    /// Like [`rename`](Self::rename), also reporting whether the table grew.
    ///
    /// Reserved names and global aliases come back unchanged and never reach
    /// the table.
    pub fn resolve<T: NameTable + ?Sized>(&self, name: &str, table: &mut T) -> Substitute {
        if self.options.is_protected(name) {
            return Substitute {
                name: name.to_string(),
                fresh: false,
            };
        }
        let mode = match &self.options.debug {
            Some(suffix) => SubstituteMode::Debug(suffix),
            None => SubstituteMode::Generated,
        };
        let options = self.options;
        let taken = self.taken;
        table.substitute(name, mode, &|candidate| {
            options.is_protected(candidate) || taken.is_some_and(|t| t.has_local_binding(candidate))
        })
    }
}

impl fmt::Debug for RenamePolicy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenamePolicy")
            .field("options", self.options)
            .field("avoiding", &self.taken.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::NameCache;
    use crate::config::CacheOptions;

    fn cache() -> NameCache {
        NameCache::new(CacheOptions::default()).unwrap()
    }

    #[test]
    fn test_reserved_names_unchanged() {
        let options = MangleOptions::default().with_reserved(["keep"]);
        let policy = RenamePolicy::new(&options);
        let mut cache = cache();
        assert_eq!(policy.rename("keep", &mut cache), "keep");
        assert_eq!(policy.rename("window", &mut cache), "window");
        assert!(cache.is_empty());
        assert_eq!(cache.seed(), 0);
    }

    #[test]
    fn test_rename_is_stable() {
        let options = MangleOptions::default();
        let policy = RenamePolicy::new(&options);
        let mut cache = cache();
        assert_eq!(policy.rename("foo", &mut cache), "A");
        assert_eq!(policy.rename("bar", &mut cache), "B");
        assert_eq!(policy.rename("foo", &mut cache), "A");
    }

    #[test]
    fn test_generated_names_avoid_reserved() {
        let options = MangleOptions::default().with_reserved(["A"]);
        let policy = RenamePolicy::new(&options);
        let mut cache = cache();
        assert_eq!(policy.rename("foo", &mut cache), "B");
    }

    #[test]
    fn test_generated_names_avoid_taken() {
        let options = MangleOptions::default();
        let taken = |name: &str| name == "A" || name == "B";
        let policy = RenamePolicy::new(&options).avoiding(&taken);
        let mut cache = cache();
        assert_eq!(policy.rename("foo", &mut cache), "C");
        assert_eq!(cache.seed(), 3);
        // A taken name that is itself renamed still gets a substitute.
        assert_eq!(policy.rename("A", &mut cache), "D");
    }

    #[test]
    fn test_debug_mode() {
        let options = MangleOptions::default().with_debug("xyz");
        let policy = RenamePolicy::new(&options);
        let mut cache = cache();
        let sub = policy.resolve("foo", &mut cache);
        assert_eq!(sub.name, "_$foo$xyz_");
        assert!(sub.fresh);
        assert_eq!(cache.seed(), 0);
    }
}
