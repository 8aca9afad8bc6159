//! Single-entry cache for the user's recipe list.

use crate::types::Recipe;

/// Key the list is cached under.
pub const RECIPES_QUERY_KEY: &str = "getUserRecipes";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    recipes: Vec<Recipe>,
    stale: bool,
}

#[derive(Debug, Default)]
pub struct ListCache {
    entry: Option<CacheEntry>,
    stats: CacheStats,
}

impl ListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> &'static str {
        RECIPES_QUERY_KEY
    }

    /// Cached list, unless missing or invalidated. Counts a hit or a miss.
    pub fn get_fresh(&mut self) -> Option<Vec<Recipe>> {
        match &self.entry {
            Some(entry) if !entry.stale => {
                self.stats.hits += 1;
                Some(entry.recipes.clone())
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn store(&mut self, recipes: Vec<Recipe>) {
        self.entry = Some(CacheEntry {
            recipes,
            stale: false,
        });
    }

    /// Mark the list stale so the next read fetches again.
    pub fn invalidate(&mut self) {
        self.stats.invalidations += 1;
        if let Some(entry) = &mut self.entry {
            entry.stale = true;
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_misses() {
        let mut cache = ListCache::new();
        assert!(cache.get_fresh().is_none());
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.key(), "getUserRecipes");
    }

    #[test]
    fn test_store_then_invalidate() {
        let mut cache = ListCache::new();
        cache.store(Vec::new());
        assert_eq!(cache.get_fresh(), Some(Vec::new()));

        cache.invalidate();
        assert!(cache.get_fresh().is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.invalidations), (1, 1, 1));
    }
}
