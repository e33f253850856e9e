use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::store::{self, StoreError};
use crate::table::Workbook;

struct Entry {
    generation: u64,
    workbook: Arc<Workbook>,
}

/// Read cache for workbooks, keyed by path.
///
/// Each path carries a generation counter. Saving through the cache (or
/// calling [`WorkbookCache::invalidate`]) bumps the counter, and the next
/// [`WorkbookCache::load`] re-reads the file instead of returning the entry
/// loaded under the previous generation. Failed loads are not cached.
#[derive(Default)]
pub struct WorkbookCache {
    entries: HashMap<PathBuf, Entry>,
    generations: HashMap<PathBuf, u64>,
}

impl WorkbookCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self, path: &Path) -> u64 {
        self.generations.get(path).copied().unwrap_or(0)
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<Workbook>, StoreError> {
        let generation = self.generation(path);
        if let Some(entry) = self.entries.get(path) {
            if entry.generation == generation {
                log::debug!("cache hit for {} (generation {})", path.display(), generation);
                return Ok(Arc::clone(&entry.workbook));
            }
        }

        log::debug!("cache miss for {} (generation {})", path.display(), generation);
        let workbook = Arc::new(store::load(path)?);
        self.entries.insert(
            path.to_path_buf(),
            Entry {
                generation,
                workbook: Arc::clone(&workbook),
            },
        );
        Ok(workbook)
    }

    /// Marks whatever is cached for `path` as stale.
    pub fn invalidate(&mut self, path: &Path) {
        *self.generations.entry(path.to_path_buf()).or_insert(0) += 1;
    }

    /// Saves through [`store::save`] and invalidates `path` once the new file
    /// is in place. A failed save leaves the cache untouched.
    pub fn save(&mut self, patch: Workbook, path: &Path) -> Result<(), StoreError> {
        store::save(patch, path)?;
        self.invalidate(path);
        Ok(())
    }

    /// Drops every cached workbook.
    pub fn clear(&mut self) {
        let paths: Vec<PathBuf> = self.entries.drain().map(|(path, _)| path).collect();
        for path in paths {
            self.invalidate(&path);
        }
    }
}
