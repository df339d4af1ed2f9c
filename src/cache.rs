//! In-memory per-language item cache with whole-snapshot replacement.
//!
//! Readers clone the current `Arc` snapshot and never observe a partially
//! rebuilt list; refreshes swap the whole list at once.

use crate::catalog::Item;
use crate::storage::Storage;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Languages served by the catalog, matching the upstream API
pub const LANGUAGES: [&str; 4] = ["de", "en", "es", "fr"];

/// Language used when a request does not specify a supported one
pub const DEFAULT_LANGUAGE: &str = "en";

/// Per-language snapshots of the items collection
#[derive(Default)]
pub struct ItemCache {
    languages: RwLock<HashMap<String, Arc<Vec<Item>>>>,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one language's items. Languages that have not been loaded
    /// yield an empty list.
    pub fn items(&self, lang: &str) -> Arc<Vec<Item>> {
        self.languages
            .read()
            .unwrap()
            .get(lang)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace a language's snapshot wholesale.
    pub fn replace(&self, lang: &str, items: Vec<Item>) {
        self.languages
            .write()
            .unwrap()
            .insert(lang.to_string(), Arc::new(items));
    }
}

/// Resolve a requested language to a supported one.
pub fn resolve_language(lang: Option<&str>) -> &str {
    match lang {
        Some(lang) if LANGUAGES.contains(&lang) => lang,
        _ => DEFAULT_LANGUAGE,
    }
}

/// Reload every language's snapshot from storage.
///
/// A language that fails to load keeps its previous snapshot.
pub async fn refresh(storage: &Storage, cache: &ItemCache) {
    for lang in LANGUAGES {
        match storage.items_for_language(lang).await {
            Ok(items) => {
                log::info!("Cached {} items for language {}", items.len(), lang);
                cache.replace(lang, items);
            }
            Err(e) => {
                log::error!("Failed to refresh the {} item cache: {}", lang, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn item(id: u64, name: &str) -> Item {
        Item {
            id,
            name: name.to_string(),
            tradable: None,
            craftable: None,
            skin: None,
            buy: None,
            sell: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn unloaded_language_yields_an_empty_snapshot() {
        let cache = ItemCache::new();

        assert!(cache.items("en").is_empty());
    }

    #[test]
    fn replace_swaps_the_whole_snapshot() {
        let cache = ItemCache::new();
        cache.replace("en", vec![item(1, "Foo"), item(2, "Bar")]);

        let before = cache.items("en");
        cache.replace("en", vec![item(3, "FooBar")]);
        let after = cache.items("en");

        // The earlier snapshot stays intact for readers still holding it
        assert_eq!(before.len(), 2);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, 3);
    }

    #[test]
    fn languages_are_isolated() {
        let cache = ItemCache::new();
        cache.replace("en", vec![item(1, "Foo")]);
        cache.replace("de", vec![item(2, "Bar")]);

        assert_eq!(cache.items("en")[0].id, 1);
        assert_eq!(cache.items("de")[0].id, 2);
    }

    #[test]
    fn unknown_languages_fall_back_to_the_default() {
        assert_eq!(resolve_language(Some("de")), "de");
        assert_eq!(resolve_language(Some("xx")), DEFAULT_LANGUAGE);
        assert_eq!(resolve_language(None), DEFAULT_LANGUAGE);
    }
}
