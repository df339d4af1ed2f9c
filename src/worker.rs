//! Scheduled ingestion of upstream catalog data into MongoDB.
//!
//! Each run fetches the full item list for every supported language and
//! merge-upserts it. A language that fails is logged and skipped; the
//! remaining languages still run.

use crate::cache::LANGUAGES;
use crate::error::Result;
use crate::storage::Storage;
use crate::upstream::ItemList;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Mutex;

/// Outcome of one language's ingestion attempt
#[derive(Debug, Clone, Serialize)]
pub struct LanguageRun {
    pub language: String,
    pub fetched: usize,
    pub upserted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// Record of the most recent ingestion run, read by the job dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobRegistry {
    pub last_run: Option<DateTime<Utc>>,
    pub languages: Vec<LanguageRun>,
}

impl JobRegistry {
    /// Record the outcome of a completed run.
    pub fn record(&mut self, runs: Vec<LanguageRun>) {
        self.last_run = Some(Utc::now());
        self.languages = runs;
    }
}

/// Run a full ingestion pass over every supported language.
pub async fn run_sync(storage: &Storage, upstream_url: &str, registry: &Mutex<JobRegistry>) {
    let mut runs = Vec::new();

    for lang in LANGUAGES {
        let run = sync_language(storage, upstream_url, lang).await;

        match &run.error {
            Some(error) => log::error!("Sync for language {} failed: {}", lang, error),
            None => log::info!(
                "Synced {} of {} fetched items for language {}",
                run.upserted,
                run.fetched,
                lang
            ),
        }

        runs.push(run);
    }

    registry.lock().unwrap().record(runs);
    log::info!("Sync completed.");
}

async fn sync_language(storage: &Storage, upstream_url: &str, lang: &str) -> LanguageRun {
    match try_sync_language(storage, upstream_url, lang).await {
        Ok((fetched, upserted)) => LanguageRun {
            language: lang.to_string(),
            fetched,
            upserted,
            error: None,
            finished_at: Utc::now(),
        },
        Err(e) => LanguageRun {
            language: lang.to_string(),
            fetched: 0,
            upserted: 0,
            error: Some(e.to_string()),
            finished_at: Utc::now(),
        },
    }
}

async fn try_sync_language(
    storage: &Storage,
    upstream_url: &str,
    lang: &str,
) -> Result<(usize, usize)> {
    let list = ItemList::fetch_from(upstream_url, lang).await?;
    let fetched = list.len();

    let items: Vec<Map<String, Value>> = list
        .into_inner()
        .into_iter()
        .filter_map(transform_item)
        .collect();

    let upserted = storage.upsert_items(lang, &items).await?;
    Ok((fetched, upserted))
}

/// Normalize one upstream item for storage. Entries without a numeric id
/// cannot be keyed by `(id, lang)` and are dropped.
fn transform_item(item: Map<String, Value>) -> Option<Map<String, Value>> {
    if item.get("id").and_then(Value::as_u64).is_none() {
        log::warn!("Skipping upstream item without a numeric id");
        return None;
    }

    Some(item)
}
