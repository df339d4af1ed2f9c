//! Item models and the query operations served from the in-memory cache.
//!
//! Every function here is pure and operates on one language's item list in
//! cache order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Queries shorter than this yield no autocomplete results
const MIN_QUERY_LENGTH: usize = 3;

/// Upper bound on autocomplete results
const MAX_AUTOCOMPLETE_RESULTS: usize = 20;

/// A buy or sell listing on an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub price: i64,
    /// Additional listing fields carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single catalog item as cached per language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tradable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub craftable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell: Option<Price>,
    /// Additional upstream fields carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An item reduced to its id and best known price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPrice {
    pub id: u64,
    pub price: i64,
}

/// A top-level item category and its subcategory ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: u32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub subcategories: BTreeMap<&'static str, u32>,
}

/// Look up a single item by id
pub fn by_id(items: &[Item], id: u64) -> Option<&Item> {
    items.iter().find(|item| item.id == id)
}

/// Filter to the given ids, preserving cache order (not input order)
pub fn by_ids<'a>(items: &'a [Item], ids: &[u64]) -> Vec<&'a Item> {
    items.iter().filter(|item| ids.contains(&item.id)).collect()
}

/// All items flagged as tradable
pub fn all_tradable(items: &[Item]) -> Vec<&Item> {
    items
        .iter()
        .filter(|item| item.tradable == Some(true))
        .collect()
}

/// Reduce items with a nonzero buy or sell price to `{id, price}` entries.
///
/// The price is the larger of the two when both are set, otherwise the
/// nonzero one. Items without any price are dropped.
pub fn all_prices(items: &[Item]) -> Vec<ItemPrice> {
    items
        .iter()
        .filter_map(|item| {
            let buy = item.buy.as_ref().map(|listing| listing.price).unwrap_or(0);
            let sell = item.sell.as_ref().map(|listing| listing.price).unwrap_or(0);
            let price = buy.max(sell);
            if price > 0 {
                Some(ItemPrice { id: item.id, price })
            } else {
                None
            }
        })
        .collect()
}

/// Case-insensitive exact match against one or more comma-separated names,
/// preserving cache order
pub fn by_name<'a>(items: &'a [Item], names: &str) -> Vec<&'a Item> {
    let names: Vec<String> = names.split(',').map(|name| name.to_lowercase()).collect();

    items
        .iter()
        .filter(|item| names.contains(&item.name.to_lowercase()))
        .collect()
}

/// Ids of the items using the given skin, in cache order
pub fn by_skin(items: &[Item], skin_id: u64) -> Vec<u64> {
    items
        .iter()
        .filter(|item| item.skin == Some(skin_id))
        .map(|item| item.id)
        .collect()
}

/// Rank items matching an autocomplete query.
///
/// Matching is case-insensitive containment. Results are ordered by
/// ascending match quality; ties keep cache order. The optional `craftable`
/// filter is applied before ranking.
pub fn autocomplete<'a>(items: &'a [Item], query: &str, craftable: Option<bool>) -> Vec<&'a Item> {
    if query.chars().count() < MIN_QUERY_LENGTH {
        return Vec::new();
    }

    let query = query.to_lowercase();

    let mut matches: Vec<(usize, &Item)> = items
        .iter()
        .filter(|item| craftable.map_or(true, |wanted| item.craftable == Some(wanted)))
        .filter_map(|item| {
            let name = item.name.to_lowercase();
            if name.contains(&query) {
                Some((match_quality(&name, &query), item))
            } else {
                None
            }
        })
        .collect();

    matches.sort_by_key(|(quality, _)| *quality);

    matches
        .into_iter()
        .take(MAX_AUTOCOMPLETE_RESULTS)
        .map(|(_, item)| item)
        .collect()
}

/// Ranking score for an autocomplete match.
///
/// An exact match scores 0; otherwise the score is the position of the query
/// inside the name plus one, so earlier matches rank better. Names not
/// containing the query rank last.
pub fn match_quality(name: &str, query: &str) -> usize {
    if name == query {
        return 0;
    }

    match name.find(query) {
        Some(index) => index + 1,
        None => usize::MAX,
    }
}

/// Static mapping of category name to category metadata
pub fn categories() -> BTreeMap<&'static str, Category> {
    BTreeMap::from([
        (
            "Armor",
            Category {
                id: 0,
                subcategories: BTreeMap::from([
                    ("Boots", 1),
                    ("Coat", 2),
                    ("Gloves", 3),
                    ("Helm", 4),
                    ("Leggings", 5),
                    ("Shoulders", 6),
                ]),
            },
        ),
        (
            "Back",
            Category {
                id: 1,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Bag",
            Category {
                id: 2,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Consumable",
            Category {
                id: 3,
                subcategories: BTreeMap::from([("Food", 1), ("Drink", 2), ("Utility", 3)]),
            },
        ),
        (
            "Container",
            Category {
                id: 4,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Crafting Material",
            Category {
                id: 5,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Gathering",
            Category {
                id: 6,
                subcategories: BTreeMap::from([
                    ("Harvesting", 1),
                    ("Logging", 2),
                    ("Mining", 3),
                ]),
            },
        ),
        (
            "Gizmo",
            Category {
                id: 7,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Key",
            Category {
                id: 8,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Miniature",
            Category {
                id: 9,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Salvage Kit",
            Category {
                id: 10,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Tool",
            Category {
                id: 11,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Trinket",
            Category {
                id: 12,
                subcategories: BTreeMap::from([("Amulet", 1), ("Earring", 2), ("Ring", 3)]),
            },
        ),
        (
            "Trophy",
            Category {
                id: 13,
                subcategories: BTreeMap::new(),
            },
        ),
        (
            "Upgrade Component",
            Category {
                id: 14,
                subcategories: BTreeMap::from([("Gem", 1), ("Rune", 2), ("Sigil", 3)]),
            },
        ),
        (
            "Weapon",
            Category {
                id: 15,
                subcategories: BTreeMap::from([
                    ("Axe", 1),
                    ("Bow", 2),
                    ("Dagger", 3),
                    ("Mace", 4),
                    ("Staff", 5),
                    ("Sword", 6),
                ]),
            },
        ),
    ])
}
