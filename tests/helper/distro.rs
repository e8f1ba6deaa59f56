//! Distribution tree fixtures

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use distro_tracker::store::Store;

/// A throwaway xbstrap tree
pub struct DistroTree {
    dir: TempDir,
}

impl DistroTree {
    pub fn new(bootstrap: &str) -> Self {
        let tree = Self {
            dir: TempDir::new().unwrap(),
        };
        tree.write("bootstrap.yml", bootstrap);
        tree
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the tree root, creating parent directories
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.dir.path().join(relative)).unwrap();
    }
}

/// Create an empty state database in its own temp directory
pub fn create_test_store() -> (TempDir, Arc<Store>) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(&temp_dir.path().join("state.db")).unwrap();
    (temp_dir, Arc::new(store))
}
