//! Parsed-file cache.
//!
//! A [`SourceCache`] is an ordinary value owned by the caller. It maps file
//! identifiers to their [`ParsedFile`] and parses each file at most once
//! through [`get_or_create_with`](SourceCache::get_or_create_with).

use alloc::collections::btree_map::{self, BTreeMap};
use alloc::string::String;

use crate::error::AsmError;
use crate::frontend::{FrontEnd, ParsedFile};

/// Cache of parsed files keyed by file identifier.
///
/// # Examples
///
/// ```rust
/// use mdasm_syntax::SourceCache;
///
/// let mut cache = SourceCache::new();
/// let file = cache
///     .get_or_create_with("consts.i", |_| Ok::<_, mdasm_syntax::AsmError>(b"size = 4\n"))
///     .unwrap();
/// assert_eq!(file.len(), 1);
/// assert!(cache.get("consts.i").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SourceCache {
    frontend: FrontEnd,
    files: BTreeMap<String, ParsedFile>,
}

impl SourceCache {
    /// Create an empty cache with a default [`FrontEnd`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache that parses with `frontend`.
    pub fn with_frontend(frontend: FrontEnd) -> Self {
        Self {
            frontend,
            files: BTreeMap::new(),
        }
    }

    /// The front end used for parsing.
    pub fn frontend(&self) -> &FrontEnd {
        &self.frontend
    }

    /// Parse `bytes` and store the result under `name`, replacing any
    /// previous entry.
    ///
    /// # Errors
    ///
    /// Returns the front end's error; the cache is left unchanged.
    pub fn create(&mut self, name: &str, bytes: &[u8]) -> Result<&ParsedFile, AsmError> {
        let parsed = self.frontend.parse_source(name, bytes)?;
        log::debug!("cached {} ({} statements)", name, parsed.len());
        let slot = self.files.entry(String::from(name)).or_default();
        *slot = parsed;
        Ok(slot)
    }

    /// Look up a previously parsed file.
    pub fn get(&self, name: &str) -> Option<&ParsedFile> {
        self.files.get(name)
    }

    /// Return the cached file, or load and parse it on first request.
    ///
    /// `load` receives the file identifier and is only called on a miss.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, or the front end's error converted into
    /// `E`. Nothing is stored on failure.
    pub fn get_or_create_with<B, E, F>(&mut self, name: &str, load: F) -> Result<&ParsedFile, E>
    where
        B: AsRef<[u8]>,
        E: From<AsmError>,
        F: FnOnce(&str) -> Result<B, E>,
    {
        match self.files.entry(String::from(name)) {
            btree_map::Entry::Occupied(entry) => Ok(entry.into_mut()),
            btree_map::Entry::Vacant(entry) => {
                let bytes = load(name)?;
                let parsed = self.frontend.parse_source(name, bytes.as_ref())?;
                log::debug!("cached {} ({} statements)", name, parsed.len());
                Ok(entry.insert(parsed))
            }
        }
    }

    /// Whether `name` has been parsed.
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Drop a cached file, returning it.
    pub fn remove(&mut self, name: &str) -> Option<ParsedFile> {
        self.files.remove(name)
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over cached files in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedFile> {
        self.files.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{ErrorPolicy, ResourceLimits};
    use alloc::vec::Vec;

    #[test]
    fn create_and_get() {
        let mut cache = SourceCache::new();
        assert!(cache.is_empty());
        cache.create("a.asm", b" nop\n x = 1\n").unwrap();
        assert_eq!(cache.get("a.asm").map(ParsedFile::len), Some(2));
        assert!(cache.get("b.asm").is_none());
        assert!(cache.contains("a.asm"));
    }

    #[test]
    fn create_replaces_existing_entry() {
        let mut cache = SourceCache::new();
        cache.create("a.asm", b" nop\n").unwrap();
        cache.create("a.asm", b" x\n y\n z\n").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a.asm").map(ParsedFile::len), Some(3));
    }

    #[test]
    fn failed_create_leaves_cache_unchanged() {
        let mut cache = SourceCache::new();
        cache.create("a.asm", b" nop\n").unwrap();
        assert!(cache.create("a.asm", b" a)\n").is_err());
        assert_eq!(cache.get("a.asm").map(ParsedFile::len), Some(1));
    }

    #[test]
    fn loader_runs_once() {
        let mut cache = SourceCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let file = cache
                .get_or_create_with("inc.i", |name| {
                    calls += 1;
                    assert_eq!(name, "inc.i");
                    Ok::<_, AsmError>(b" dc.w 1, 2\n".to_vec())
                })
                .unwrap();
            assert_eq!(file.name, "inc.i");
        }
        assert_eq!(calls, 1);
    }

    #[derive(Debug, PartialEq)]
    enum LoadError {
        Missing,
        Parse(AsmError),
    }

    impl From<AsmError> for LoadError {
        fn from(e: AsmError) -> Self {
            LoadError::Parse(e)
        }
    }

    #[test]
    fn loader_errors_are_not_cached() {
        let mut cache = SourceCache::new();
        let err = cache
            .get_or_create_with("gone.i", |_| Err::<Vec<u8>, _>(LoadError::Missing))
            .unwrap_err();
        assert_eq!(err, LoadError::Missing);
        assert!(!cache.contains("gone.i"));

        let err = cache
            .get_or_create_with("bad.i", |_| Ok::<_, LoadError>(" 1 2\n"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Parse(AsmError::Syntax { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn uses_configured_frontend() {
        let mut fe = FrontEnd::new();
        fe.error_policy(ErrorPolicy::FailFast).limits(ResourceLimits {
            max_source_bytes: 8,
            ..ResourceLimits::default()
        });
        let mut cache = SourceCache::with_frontend(fe);
        assert_eq!(cache.frontend().resource_limits().max_source_bytes, 8);
        assert!(matches!(
            cache.create("big.asm", b" x = 1 + 2 + 3\n"),
            Err(AsmError::ResourceLimitExceeded { .. })
        ));
    }

    #[test]
    fn remove_and_iterate() {
        let mut cache = SourceCache::new();
        cache.create("b.asm", b" b\n").unwrap();
        cache.create("a.asm", b" a\n").unwrap();
        let names: Vec<_> = cache.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.asm", "b.asm"]);
        assert!(cache.remove("a.asm").is_some());
        assert!(cache.remove("a.asm").is_none());
        assert_eq!(cache.len(), 1);
    }
}
