//! Source module change detection.
//!
//! Many methods share one owning module, so each module is hashed at most
//! once per session and the verdict is memoized.

use std::collections::HashMap;

use dexon_common::ContentHash;
use dexon_map::MapIndex;
use parking_lot::RwLock;

use crate::symbols::SourceModule;

/// Decides whether a source module changed since the snapshot was taken.
pub struct FreshnessOracle {
    recorded: HashMap<String, ContentHash>,
    verdicts: RwLock<HashMap<String, bool>>,
}

impl FreshnessOracle {
    /// Creates an oracle over recorded `(module name, fingerprint)` pairs.
    pub fn new(recorded: impl IntoIterator<Item = (String, ContentHash)>) -> Self {
        Self {
            recorded: recorded.into_iter().collect(),
            verdicts: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an oracle over the module fingerprints of a loaded map.
    pub fn from_map(index: &MapIndex) -> Self {
        Self::new(
            index
                .map()
                .modules
                .iter()
                .map(|m| (m.name.clone(), m.content_hash)),
        )
    }

    /// Returns `true` if the module changed since the snapshot.
    ///
    /// A module without a recorded fingerprint, or whose file cannot be read,
    /// counts as modified.
    pub fn is_modified(&self, module: &SourceModule) -> bool {
        if let Some(&modified) = self.verdicts.read().get(&module.name) {
            return modified;
        }
        let modified = self.check(module);
        *self
            .verdicts
            .write()
            .entry(module.name.clone())
            .or_insert(modified)
    }

    fn check(&self, module: &SourceModule) -> bool {
        let Some(recorded) = self.recorded.get(&module.name) else {
            return true;
        };
        match ContentHash::from_file(&module.path) {
            Ok(current) => current != *recorded,
            Err(e) => {
                tracing::debug!(
                    module = %module.name,
                    error = %e,
                    "compiler cache: unable to fingerprint module"
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> SourceModule {
        let path = dir.path().join(format!("{name}.dll"));
        std::fs::write(&path, content).unwrap();
        SourceModule::new(name, path)
    }

    #[test]
    fn unchanged_module_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let app = module_file(&dir, "App", b"v1");
        let oracle = FreshnessOracle::new([("App".to_string(), ContentHash::from_bytes(b"v1"))]);
        assert!(!oracle.is_modified(&app));
    }

    #[test]
    fn changed_module_is_modified() {
        let dir = tempfile::tempdir().unwrap();
        let app = module_file(&dir, "App", b"v2");
        let oracle = FreshnessOracle::new([("App".to_string(), ContentHash::from_bytes(b"v1"))]);
        assert!(oracle.is_modified(&app));
    }

    #[test]
    fn unknown_module_is_modified() {
        let dir = tempfile::tempdir().unwrap();
        let lib = module_file(&dir, "Lib", b"v1");
        let oracle = FreshnessOracle::new([("App".to_string(), ContentHash::from_bytes(b"v1"))]);
        assert!(oracle.is_modified(&lib));
    }

    #[test]
    fn missing_file_is_modified() {
        let oracle = FreshnessOracle::new([("App".to_string(), ContentHash::from_bytes(b"v1"))]);
        assert!(oracle.is_modified(&SourceModule::new("App", "/nonexistent/App.dll")));
    }

    #[test]
    fn verdict_is_memoized_per_module() {
        let dir = tempfile::tempdir().unwrap();
        let app = module_file(&dir, "App", b"v1");
        let oracle = FreshnessOracle::new([("App".to_string(), ContentHash::from_bytes(b"v1"))]);
        assert!(!oracle.is_modified(&app));

        // A change after the first check is not observed within the session.
        std::fs::write(&app.path, b"v2").unwrap();
        assert!(!oracle.is_modified(&app));
    }
}
