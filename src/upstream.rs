//! Client for the upstream game API serving the full item catalog.

use crate::error::{CatalogError, Result};
use serde_json::{Map, Value};

/// Base URL of the public game API
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.guildwars2.com/v2";

/// One language's full item list as returned by the upstream API
#[derive(Debug)]
pub struct ItemList {
    items: Vec<Map<String, Value>>,
}

impl ItemList {
    /// Fetch the full item list for a language from the given API base URL.
    pub async fn fetch_from(base_url: &str, lang: &str) -> Result<Self> {
        let url = format!("{}/items?lang={}", base_url, lang);

        log::debug!("Fetching items from {}", url);

        let client = reqwest::Client::new();
        let response = client
            .get(&url)
            .header("User-Agent", "catalog_api/1.0")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        let items: Vec<Map<String, Value>> = serde_json::from_str(&body)?;

        Ok(Self { items })
    }

    /// Get the number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the list, yielding the raw item objects
    pub fn into_inner(self) -> Vec<Map<String, Value>> {
        self.items
    }
}
