//! MongoDB access for the item catalog and the generic cache collection.
//!
//! Items are keyed by `(id, lang)`. Ingestion upserts merge upstream fields
//! into existing records instead of replacing them, so locally added fields
//! survive a re-sync.

use crate::catalog::Item;
use crate::error::Result;
use futures::TryStreamExt;
use mongodb::bson::{doc, from_document, to_document, Bson, Document};
use mongodb::{Client, Collection};
use serde::Deserialize;
use serde_json::{Map, Value};

const ITEMS_COLLECTION: &str = "items";
const CACHE_COLLECTION: &str = "cache";
const SKIN_PRICES_ID: &str = "skinPrices";

/// Handle to the catalog database
#[derive(Clone)]
pub struct Storage {
    database: mongodb::Database,
}

#[derive(Deserialize)]
struct ItemId {
    id: u64,
}

impl Storage {
    /// Connect to MongoDB and select the catalog database.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;

        Ok(Self {
            database: client.database(database),
        })
    }

    fn items(&self) -> Collection<Document> {
        self.database.collection(ITEMS_COLLECTION)
    }

    fn cache(&self) -> Collection<Document> {
        self.database.collection(CACHE_COLLECTION)
    }

    /// Load one language's items in collection order, without storage-only
    /// fields.
    pub async fn items_for_language(&self, lang: &str) -> Result<Vec<Item>> {
        let mut cursor = self
            .items()
            .find(doc! { "lang": lang })
            .projection(doc! { "_id": 0, "lang": 0 })
            .await?;

        let mut items = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            items.push(from_document(document)?);
        }

        Ok(items)
    }

    /// Ids of the items using the given skin, in collection order.
    pub async fn item_ids_by_skin(&self, skin_id: u64, lang: &str) -> Result<Vec<u64>> {
        let mut cursor = self
            .items()
            .find(doc! { "skin": skin_id as i64, "lang": lang })
            .projection(doc! { "_id": 0, "id": 1 })
            .await?;

        let mut ids = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            let entry: ItemId = from_document(document)?;
            ids.push(entry.id);
        }

        Ok(ids)
    }

    /// The cached skin price table, verbatim `content` field. `None` when
    /// the cache document has not been written yet.
    pub async fn skin_prices(&self) -> Result<Option<Value>> {
        let document = self
            .cache()
            .find_one(doc! { "id": SKIN_PRICES_ID })
            .await?;

        Ok(document
            .and_then(|mut document| document.remove("content"))
            .map(Bson::into_relaxed_extjson))
    }

    /// Upsert one language's upstream items by `(id, lang)`.
    ///
    /// Existing records are merged per [`merge_item`]; the `$set` update
    /// expresses the same policy on the server side. Returns the number of
    /// upserted items.
    pub async fn upsert_items(&self, lang: &str, items: &[Map<String, Value>]) -> Result<usize> {
        let collection = self.items();

        let mut count = 0;
        for item in items {
            let mut update = to_document(item)?;
            update.insert("lang", lang);

            let id = match update.get("id") {
                Some(id) => id.clone(),
                None => continue,
            };

            collection
                .update_one(doc! { "id": id, "lang": lang }, doc! { "$set": update })
                .upsert(true)
                .await?;
            count += 1;
        }

        Ok(count)
    }
}

/// Merge policy applied on ingestion: upstream fields overwrite existing
/// ones on collision, fields only present in the stored record are retained.
pub fn merge_item(existing: &Document, upstream: &Document) -> Document {
    let mut merged = existing.clone();
    for (key, value) in upstream {
        merged.insert(key.clone(), value.clone());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_retains_locally_added_fields() {
        let existing = doc! { "id": 1, "name": "Fiz", "someKey": "someValue" };
        let upstream = doc! { "id": 1, "name": "Fiz Buz" };

        let merged = merge_item(&existing, &upstream);

        assert_eq!(merged, doc! { "id": 1, "name": "Fiz Buz", "someKey": "someValue" });
    }

    #[test]
    fn merge_unions_new_upstream_fields_in() {
        let existing = doc! { "id": 2, "name": "Herp" };
        let upstream = doc! { "id": 2, "name": "Herp", "someOtherKey": "someOtherValue" };

        let merged = merge_item(&existing, &upstream);

        assert_eq!(
            merged,
            doc! { "id": 2, "name": "Herp", "someOtherKey": "someOtherValue" }
        );
    }

    #[test]
    fn merge_lets_upstream_win_on_collision() {
        let existing = doc! { "id": 3, "name": "Old", "skin": 42 };
        let upstream = doc! { "id": 3, "name": "New", "skin": 7 };

        let merged = merge_item(&existing, &upstream);

        assert_eq!(merged.get_str("name").unwrap(), "New");
        assert_eq!(merged.get_i32("skin").unwrap(), 7);
    }
}
