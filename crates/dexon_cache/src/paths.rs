//! Naming convention for the paired snapshot files in a cache directory.

use std::path::{Path, PathBuf};

/// Default container file name.
pub const DEFAULT_CONTAINER_FILE: &str = "classes.dex";

/// Extension of the map file paired with a container.
const MAP_EXTENSION: &str = "dexmap";

/// Locations of the container file and its companion map file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    /// The cached container.
    pub container: PathBuf,
    /// The map file: the container path with extension `dexmap`.
    pub map: PathBuf,
}

impl CachePaths {
    /// Paths for the default container name inside `cache_dir`.
    pub fn new(cache_dir: &Path) -> Self {
        Self::with_container_file(cache_dir, DEFAULT_CONTAINER_FILE)
    }

    /// Paths for a custom container file name inside `cache_dir`.
    pub fn with_container_file(cache_dir: &Path, container_file: &str) -> Self {
        let container = cache_dir.join(container_file);
        let map = container.with_extension(MAP_EXTENSION);
        Self { container, map }
    }

    /// Returns `true` if both files of the pair exist.
    pub fn exist(&self) -> bool {
        self.container.is_file() && self.map.is_file()
    }
}
