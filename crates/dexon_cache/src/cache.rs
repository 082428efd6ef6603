//! High-level method body cache.
//!
//! `MethodBodyCache` ties together the map index, the container index and the
//! freshness oracle. Both files are parsed on a background thread when the
//! cache is opened, so the compiler front-end can keep working while the
//! snapshot loads. All reads are fail-safe: a missing or corrupt snapshot
//! disables the cache and every lookup becomes a miss.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dexon_common::InternalError;
use dexon_dex::{Container, MethodBody, Prototype};
use dexon_map::{MapFile, MapIndex, MethodEntry, SourceCodePosition};

use crate::config::CacheConfig;
use crate::container_index::ContainerIndex;
use crate::error::{CacheError, ResolveError};
use crate::freshness::FreshnessOracle;
use crate::gate::Gate;
use crate::paths::CachePaths;
use crate::rewriter::ReferenceRewriter;
use crate::symbols::{SourceMethod, TargetSymbols};

/// Name of the background initialization thread.
const INIT_THREAD_NAME: &str = "method-cache-init";

/// A reusable method body, rewritten for the current compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The rewritten body. Owned by the caller.
    pub body: MethodBody,
    /// The map entry of the matched method. `None` for imported members
    /// found directly in the container.
    pub method_entry: Option<MethodEntry>,
    /// Source positions recorded for the body, if the map has any.
    pub source_positions: Option<Vec<SourceCodePosition>>,
    /// Source file name of the class the body was emitted into.
    pub source_file: Option<String>,
}

/// Why a lookup produced no body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// The method has no stable identity.
    NoScope,
    /// The cache is disabled for this session.
    Disabled,
    /// The owning module changed, or the method is compiler-synthesized.
    ModuleModified,
    /// The snapshot has no matching member.
    NotCached,
    /// The matching member was emitted without a body.
    NoBody,
}

/// Result of a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A reusable body.
    Hit(CacheEntry),
    /// Nothing to reuse.
    Miss(MissReason),
    /// A matched body references something the current compilation lacks.
    Unresolved(ResolveError),
    /// The matched member's prototype differs from the requested one.
    Inconsistent(InternalError),
}

/// Lifecycle state of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The snapshot is still loading.
    Initializing,
    /// The snapshot loaded and lookups may hit.
    Ready,
    /// No snapshot is available for this session.
    Disabled,
}

/// Hit and miss counts of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Lookups that returned a body.
    pub hits: u64,
    /// Lookups that returned nothing.
    pub misses: u64,
}

impl CacheStatistics {
    /// Returns the number of lookups.
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

/// The loaded previous-run snapshot. Immutable once built.
struct Snapshot {
    map: MapIndex,
    container: ContainerIndex,
    freshness: FreshnessOracle,
}

impl Snapshot {
    fn load(paths: &CachePaths) -> Result<Self, CacheError> {
        let (container, map) = rayon::join(
            || Container::read(&paths.container),
            || MapFile::load(&paths.map),
        );
        let container = ContainerIndex::new(container?);
        let map = MapIndex::new(map?);
        let freshness = FreshnessOracle::from_map(&map);
        Ok(Self {
            map,
            container,
            freshness,
        })
    }
}

/// Persistent cache of method bodies emitted by the previous compiler run.
///
/// Shared by all compilation workers; lookups take `&self`.
pub struct MethodBodyCache {
    /// Published once by the initialization thread; `None` means disabled.
    gate: Arc<Gate<Option<Snapshot>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MethodBodyCache {
    /// Opens the snapshot stored in `cache_dir` under the default file names.
    ///
    /// Never fails. Without a complete file pair the cache is disabled;
    /// otherwise loading starts in the background and lookups wait for it.
    pub fn open(cache_dir: &Path) -> Self {
        Self::open_paths(CachePaths::new(cache_dir))
    }

    /// Opens the cache as configured.
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self::open_paths(config.paths())
    }

    /// Opens the snapshot at the given file pair.
    pub fn open_paths(paths: CachePaths) -> Self {
        if !paths.exist() {
            tracing::debug!(
                container = %paths.container.display(),
                "compiler cache: no snapshot found, cache disabled"
            );
            return Self::disabled();
        }

        let gate = Arc::new(Gate::new());
        let worker = Arc::clone(&gate);
        let spawned = std::thread::Builder::new()
            .name(INIT_THREAD_NAME.to_string())
            .spawn(move || worker.complete(initialize(&paths)));

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "compiler cache: unable to start initialization");
            gate.complete(None);
        }
        Self::with_gate(gate)
    }

    /// Returns a cache that never hits.
    pub fn disabled() -> Self {
        Self::with_gate(Arc::new(Gate::completed(None)))
    }

    fn with_gate(gate: Arc<Gate<Option<Snapshot>>>) -> Self {
        Self {
            gate,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the current state without blocking.
    pub fn state(&self) -> CacheState {
        match self.gate.get() {
            None => CacheState::Initializing,
            Some(Some(_)) => CacheState::Ready,
            Some(None) => CacheState::Disabled,
        }
    }

    /// Blocks until initialization finishes. Returns `true` if the cache is
    /// ready.
    pub fn wait_ready(&self) -> bool {
        self.gate.wait().is_some()
    }

    /// Looks up a reusable body for a method about to be compiled.
    ///
    /// `target_name` and `target_prototype` are the name and prototype the
    /// method will be emitted with in the current run. Returns `None` when
    /// the method must be compiled normally. Updates the hit and miss
    /// counters.
    pub fn lookup(
        &self,
        target_name: &str,
        target_prototype: &Prototype,
        source: &dyn SourceMethod,
        symbols: &dyn TargetSymbols,
    ) -> Option<CacheEntry> {
        let entry = match self.lookup_outcome(target_name, target_prototype, source, symbols) {
            Lookup::Hit(entry) => Some(entry),
            Lookup::Miss(_) => None,
            Lookup::Unresolved(e) => {
                tracing::debug!(method = %source, error = %e, "compiler cache: cached body not reusable");
                None
            }
            Lookup::Inconsistent(e) => {
                tracing::error!(method = %source, error = %e, "compiler cache: inconsistent snapshot");
                None
            }
        };
        let counter = if entry.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        entry
    }

    /// Looks up a reusable body and reports exactly why there is none.
    ///
    /// Does not log failures or touch the counters.
    pub fn lookup_outcome(
        &self,
        target_name: &str,
        target_prototype: &Prototype,
        source: &dyn SourceMethod,
        symbols: &dyn TargetSymbols,
    ) -> Lookup {
        let scope = source.scope_id();
        if scope.is_sentinel() {
            return Lookup::Miss(MissReason::NoScope);
        }
        let Some(snapshot) = self.gate.wait() else {
            return Lookup::Miss(MissReason::Disabled);
        };

        let Some(module) = source
            .source_module()
            .filter(|m| !snapshot.freshness.is_modified(m))
        else {
            return Lookup::Miss(MissReason::ModuleModified);
        };

        let record = snapshot.map.method_by_scope(&scope.type_scope, &scope.member);
        // the body was compiled from the module recorded in the map; a type
        // that moved since is stale even if its current module is unchanged
        if let Some(recorded) = record.and_then(|r| r.declaring.module.as_deref()) {
            if recorded != module.name {
                return Lookup::Miss(MissReason::ModuleModified);
            }
        }
        let found = match record {
            Some(record) => snapshot.container.method(
                record.emitted_owner,
                &record.method.dex_name,
                &record.method.dex_signature,
            ),
            // imported members are copied into the container, not compiled
            None => snapshot.container.method(
                &scope.type_scope.to_descriptor(),
                target_name,
                target_prototype.signature(),
            ),
        };
        let Some(found) = found else {
            return Lookup::Miss(MissReason::NotCached);
        };
        let Some(cached) = &found.method.body else {
            tracing::debug!(method = %source, "compiler cache: cached method has no body");
            return Lookup::Miss(MissReason::NoBody);
        };

        if found.method.prototype != *target_prototype {
            return Lookup::Inconsistent(
                format!(
                    "cached method for {source} has prototype {}, expected {target_prototype}",
                    found.method.prototype
                )
                .into(),
            );
        }

        let mut body = cached.clone();
        if let Err(e) = ReferenceRewriter::new(&snapshot.map, symbols).rewrite_body(&mut body) {
            return Lookup::Unresolved(e);
        }

        Lookup::Hit(CacheEntry {
            body,
            method_entry: record.map(|r| r.method.clone()),
            source_positions: record
                .map(|r| r.source_positions())
                .filter(|p| !p.is_empty())
                .map(<[_]>::to_vec),
            source_file: found.class.source_file.clone(),
        })
    }

    /// Returns the hit and miss counts so far.
    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Logs the aggregate statistics. Silent unless the snapshot loaded.
    pub fn report_statistics(&self) {
        if self.state() != CacheState::Ready {
            return;
        }
        let stats = self.statistics();
        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            "compiler cache: {} of {} method bodies reused",
            stats.hits,
            stats.total()
        );
    }

    /// Writes the snapshot of a finished compile to `paths` so the next
    /// session can open it. Use the same paths the session was opened with,
    /// e.g. [`CacheConfig::paths`].
    pub fn store_snapshot(
        paths: &CachePaths,
        container: &Container,
        map: &MapFile,
    ) -> Result<(), CacheError> {
        container.write(&paths.container, &map.producer_version)?;
        map.save(&paths.map)?;
        Ok(())
    }
}

/// Loads the snapshot, turning any error or panic into a disabled cache.
fn initialize(paths: &CachePaths) -> Option<Snapshot> {
    let loaded = panic::catch_unwind(AssertUnwindSafe(|| Snapshot::load(paths)))
        .unwrap_or_else(|payload| {
            Err(CacheError::Aborted {
                reason: panic_message(payload.as_ref()),
            })
        });
    match loaded {
        Ok(snapshot) => {
            tracing::debug!(
                methods = snapshot.container.method_count(),
                "compiler cache: snapshot loaded"
            );
            Some(snapshot)
        }
        Err(e) => {
            tracing::warn!(error = %e, "compiler cache: initialization failed, cache disabled");
            None
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "initialization panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexon_common::{DelegateClosureKey, ScopeId, TypeScopeId};
    use dexon_dex::{ClassRef, MethodRef, PrimitiveType};
    use std::fmt;

    struct Method {
        scope: ScopeId,
    }

    impl fmt::Display for Method {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.scope)
        }
    }

    impl SourceMethod for Method {
        fn scope_id(&self) -> &ScopeId {
            &self.scope
        }

        fn source_module(&self) -> Option<&crate::symbols::SourceModule> {
            None
        }
    }

    struct NoSymbols;

    impl TargetSymbols for NoSymbols {
        fn class_by_scope(&self, _: &TypeScopeId) -> Option<ClassRef> {
            None
        }

        fn method_by_scope(&self, _: &TypeScopeId, _: &str) -> Option<MethodRef> {
            None
        }

        fn delegate_instance(&self, _: &DelegateClosureKey) -> Option<ClassRef> {
            None
        }
    }

    fn void() -> Prototype {
        Prototype::new(PrimitiveType::Void, vec![])
    }

    fn method(member: &str) -> Method {
        Method {
            scope: ScopeId::new(TypeScopeId::new("Foo:3"), member),
        }
    }

    #[test]
    fn missing_snapshot_disables() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MethodBodyCache::open(dir.path());
        assert_eq!(cache.state(), CacheState::Disabled);
        assert!(!cache.wait_ready());
        assert_eq!(
            cache.lookup_outcome("bar", &void(), &method("bar()V"), &NoSymbols),
            Lookup::Miss(MissReason::Disabled)
        );
    }

    #[test]
    fn disabled_config_never_opens() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::new(dir.path());
        MethodBodyCache::store_snapshot(&paths, &Container::new(), &MapFile::new("0.1.0")).unwrap();
        let config = CacheConfig {
            enabled: false,
            directory: dir.path().to_path_buf(),
            ..CacheConfig::default()
        };
        assert_eq!(MethodBodyCache::from_config(&config).state(), CacheState::Disabled);
    }

    #[test]
    fn corrupt_container_disables() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::new(dir.path());
        MethodBodyCache::store_snapshot(&paths, &Container::new(), &MapFile::new("0.1.0")).unwrap();
        std::fs::write(&paths.container, b"garbage").unwrap();

        let cache = MethodBodyCache::open(dir.path());
        assert!(!cache.wait_ready());
        assert_eq!(cache.state(), CacheState::Disabled);
    }

    #[test]
    fn empty_snapshot_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CachePaths::new(dir.path());
        MethodBodyCache::store_snapshot(&paths, &Container::new(), &MapFile::new("0.1.0")).unwrap();
        let cache = MethodBodyCache::open(dir.path());
        assert!(cache.wait_ready());
        assert_eq!(cache.state(), CacheState::Ready);
    }

    #[test]
    fn sentinel_does_not_wait_for_initialization() {
        // gate never completed: a blocking lookup would hang the test
        let cache = MethodBodyCache::with_gate(Arc::new(Gate::new()));
        assert_eq!(cache.state(), CacheState::Initializing);

        let generated = Method {
            scope: ScopeId::sentinel(TypeScopeId::new("Foo:3")),
        };
        assert_eq!(
            cache.lookup_outcome("bar", &void(), &generated, &NoSymbols),
            Lookup::Miss(MissReason::NoScope)
        );
        assert!(cache.lookup("bar", &void(), &generated, &NoSymbols).is_none());
        assert_eq!(cache.statistics(), CacheStatistics { hits: 0, misses: 1 });
    }

    #[test]
    fn misses_are_counted_when_disabled() {
        let cache = MethodBodyCache::disabled();
        for _ in 0..3 {
            assert!(cache.lookup("bar", &void(), &method("bar()V"), &NoSymbols).is_none());
        }
        let stats = cache.statistics();
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.total(), 3);
        cache.report_statistics();
    }

    #[test]
    fn panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(payload.as_ref()), "initialization panicked");
    }
}
