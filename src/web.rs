//! Public REST API for the item catalog.
//!
//! Handlers validate their parameters, read the cache snapshot or the
//! database, and write the result verbatim. They never mutate the cache.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::{resolve_language, ItemCache};
use crate::catalog;
use crate::storage::Storage;

/// Shared application state (item cache + database handle)
#[derive(Clone)]
struct AppState {
    cache: Arc<ItemCache>,
    storage: Storage,
}

#[derive(Debug, Deserialize)]
struct LangParams {
    lang: Option<String>,
}

/// Query parameters feeding the `/items/{ids}` operations
#[derive(Debug, Default, Deserialize)]
struct ItemsParams {
    lang: Option<String>,
    q: Option<String>,
    craftable: Option<String>,
    names: Option<String>,
    skin_id: Option<String>,
}

/// Operation selected by the `/items/{ids}` path segment
#[derive(Debug, PartialEq)]
enum ItemsRequest {
    Ids(Vec<u64>),
    All,
    AllPrices,
    Categories,
    Autocomplete {
        query: String,
        craftable: Option<bool>,
    },
    ByName {
        names: String,
    },
    BySkin {
        skin_id: u64,
    },
}

impl ItemsRequest {
    /// Parse the path segment and query parameters into an operation.
    /// `None` when a required parameter for the selected operation is
    /// missing or malformed.
    fn parse(ids: &str, params: &ItemsParams) -> Option<Self> {
        match ids {
            "all" => Some(ItemsRequest::All),
            "all-prices" => Some(ItemsRequest::AllPrices),
            "categories" => Some(ItemsRequest::Categories),
            "autocomplete" => params
                .q
                .clone()
                .filter(|query| !query.is_empty())
                .map(|query| ItemsRequest::Autocomplete {
                    query,
                    craftable: params.craftable.as_deref().and_then(parse_craftable),
                }),
            "by-name" => params
                .names
                .clone()
                .filter(|names| !names.is_empty())
                .map(|names| ItemsRequest::ByName { names }),
            "by-skin" => parse_positive_id(params.skin_id.as_deref()?)
                .map(|skin_id| ItemsRequest::BySkin { skin_id }),
            _ => Some(ItemsRequest::Ids(
                ids.split(',').filter_map(|token| token.parse().ok()).collect(),
            )),
        }
    }
}

fn parse_craftable(value: &str) -> Option<bool> {
    match value {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_positive_id(value: &str) -> Option<u64> {
    value.parse().ok().filter(|id| *id > 0)
}

/// Fixed response for missing or malformed request parameters
fn invalid_parameters() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "text": "invalid request parameters" })),
    )
        .into_response()
}

/// GET /item/{id}
async fn item_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<LangParams>,
) -> Response {
    let id = match parse_positive_id(&id) {
        Some(id) => id,
        None => return invalid_parameters(),
    };

    let items = state.cache.items(resolve_language(params.lang.as_deref()));
    match catalog::by_id(&items, id) {
        Some(item) => Json(item).into_response(),
        None => Json(Value::Null).into_response(),
    }
}

/// GET /items/{ids}
///
/// `ids` is either a comma-separated id list or one of the operation tags
/// `all`, `all-prices`, `categories`, `autocomplete`, `by-name`, `by-skin`.
async fn items_handler(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<ItemsParams>,
) -> Response {
    let request = match ItemsRequest::parse(&ids, &params) {
        Some(request) => request,
        None => return invalid_parameters(),
    };

    let items = state.cache.items(resolve_language(params.lang.as_deref()));
    match request {
        ItemsRequest::Ids(ids) => Json(catalog::by_ids(&items, &ids)).into_response(),
        ItemsRequest::All => Json(catalog::all_tradable(&items)).into_response(),
        ItemsRequest::AllPrices => Json(catalog::all_prices(&items)).into_response(),
        ItemsRequest::Categories => Json(catalog::categories()).into_response(),
        ItemsRequest::Autocomplete { query, craftable } => {
            Json(catalog::autocomplete(&items, &query, craftable)).into_response()
        }
        ItemsRequest::ByName { names } => Json(catalog::by_name(&items, &names)).into_response(),
        ItemsRequest::BySkin { skin_id } => Json(catalog::by_skin(&items, skin_id)).into_response(),
    }
}

/// GET /items/by-skin/{skin_id}
///
/// Direct database read, returning the ordered id list.
async fn by_skin_handler(
    State(state): State<AppState>,
    Path(skin_id): Path<String>,
    Query(params): Query<LangParams>,
) -> Response {
    let skin_id = match parse_positive_id(&skin_id) {
        Some(skin_id) => skin_id,
        None => return invalid_parameters(),
    };

    let lang = resolve_language(params.lang.as_deref());
    match state.storage.item_ids_by_skin(skin_id, lang).await {
        Ok(ids) => Json(ids).into_response(),
        Err(e) => {
            log::error!("Database error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /skins/prices
///
/// Returns the cached price table verbatim; 404 until the cache document
/// has been written.
async fn skin_prices_handler(State(state): State<AppState>) -> Response {
    match state.storage.skin_prices().await {
        Ok(Some(content)) => Json(content).into_response(),
        Ok(None) => {
            log::error!("Skin price cache document is missing");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            log::error!("Database error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Build the public API router
pub fn create_router(cache: Arc<ItemCache>, storage: Storage) -> Router {
    let state = AppState { cache, storage };

    Router::new()
        .route("/item/{id}", get(item_handler))
        .route("/items/by-skin/{skin_id}", get(by_skin_handler))
        .route("/items/{ids}", get(items_handler))
        .route("/skins/prices", get(skin_prices_handler))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Start the public API server (async)
pub async fn serve(
    cache: Arc<ItemCache>,
    storage: Storage,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(cache, storage);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Item, Price};
    use serde_json::{json, Map};

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

    fn tradable(id: u64, name: &str, flag: bool) -> Item {
        let mut item = item(id, name);
        item.tradable = Some(flag);
        item
    }

    async fn test_state(items: Vec<Item>) -> AppState {
        let cache = Arc::new(ItemCache::new());
        cache.replace("en", items);

        // Connections are lazy, so a handle without a live server is fine
        // for handlers that only read the cache.
        let storage = Storage::connect("mongodb://127.0.0.1:27017", "catalog-test")
            .await
            .unwrap();

        AppState { cache, storage }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn lang(value: Option<&str>) -> Query<LangParams> {
        Query(LangParams {
            lang: value.map(String::from),
        })
    }

    fn no_params() -> Query<ItemsParams> {
        Query(ItemsParams::default())
    }

    #[tokio::test]
    async fn item_rejects_a_malformed_id() {
        let state = test_state(vec![]).await;

        for bad in ["abc", "0", "-3"] {
            let response =
                item_handler(State(state.clone()), Path(bad.to_string()), lang(None)).await;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(response).await,
                json!({"text": "invalid request parameters"})
            );
        }
    }

    #[tokio::test]
    async fn item_returns_the_matching_item() {
        let state = test_state(vec![
            tradable(1, "Foo", false),
            tradable(2, "Bar", true),
            tradable(3, "FooBar", true),
        ])
        .await;

        let response = item_handler(State(state), Path("2".to_string()), lang(None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"id": 2, "name": "Bar", "tradable": true})
        );
    }

    #[tokio::test]
    async fn item_misses_yield_null() {
        let state = test_state(vec![item(1, "Foo")]).await;

        let response = item_handler(State(state), Path("9".to_string()), lang(None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, Value::Null);
    }

    #[tokio::test]
    async fn items_filters_to_the_requested_ids() {
        let state = test_state(vec![
            tradable(1, "Foo", false),
            tradable(2, "Bar", true),
            tradable(3, "FooBar", true),
        ])
        .await;

        let response = items_handler(State(state), Path("2,3".to_string()), no_params()).await;

        assert_eq!(
            body_json(response).await,
            json!([
                {"id": 2, "name": "Bar", "tradable": true},
                {"id": 3, "name": "FooBar", "tradable": true}
            ])
        );
    }

    #[tokio::test]
    async fn items_all_returns_tradable_items() {
        let state = test_state(vec![
            tradable(1, "Foo", false),
            tradable(2, "Bar", true),
            tradable(3, "FooBar", true),
            tradable(4, "Herp", false),
        ])
        .await;

        let response = items_handler(State(state), Path("all".to_string()), no_params()).await;

        assert_eq!(
            body_json(response).await,
            json!([
                {"id": 2, "name": "Bar", "tradable": true},
                {"id": 3, "name": "FooBar", "tradable": true}
            ])
        );
    }

    #[tokio::test]
    async fn items_all_prices_reduces_to_id_and_price() {
        let price = |value: i64| {
            Some(Price {
                price: value,
                extra: Map::new(),
            })
        };

        let mut foo = item(1, "Foo");
        foo.buy = price(0);
        foo.sell = price(123);
        let mut bar = item(2, "Bar");
        bar.buy = price(456);
        bar.sell = price(0);
        let foobar = item(3, "FooBar");
        let mut herp = item(4, "Herp");
        herp.buy = price(678);
        herp.sell = price(910);

        let state = test_state(vec![foo, bar, foobar, herp]).await;

        let response =
            items_handler(State(state), Path("all-prices".to_string()), no_params()).await;

        assert_eq!(
            body_json(response).await,
            json!([
                {"id": 1, "price": 123},
                {"id": 2, "price": 456},
                {"id": 4, "price": 910}
            ])
        );
    }

    #[tokio::test]
    async fn items_categories_returns_the_static_table() {
        let state = test_state(vec![]).await;

        let response =
            items_handler(State(state), Path("categories".to_string()), no_params()).await;

        let categories = body_json(response).await;
        let categories = categories.as_object().unwrap();
        assert!(categories.len() > 10);
    }

    #[tokio::test]
    async fn items_autocomplete_ranks_matches() {
        let state = test_state(vec![
            tradable(1, "Foo", false),
            tradable(2, "Bar", true),
            tradable(3, "FooBar", true),
        ])
        .await;

        let params = Query(ItemsParams {
            q: Some("Foo".to_string()),
            ..Default::default()
        });
        let response = items_handler(State(state), Path("autocomplete".to_string()), params).await;

        assert_eq!(
            body_json(response).await,
            json!([
                {"id": 1, "name": "Foo", "tradable": false},
                {"id": 3, "name": "FooBar", "tradable": true}
            ])
        );
    }

    #[tokio::test]
    async fn items_autocomplete_requires_a_query() {
        let state = test_state(vec![]).await;

        let response =
            items_handler(State(state), Path("autocomplete".to_string()), no_params()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"text": "invalid request parameters"})
        );
    }

    #[tokio::test]
    async fn items_by_name_matches_case_insensitively() {
        let state = test_state(vec![
            tradable(1, "Foo", false),
            tradable(2, "Bar", true),
            tradable(3, "FooBar", true),
        ])
        .await;

        let params = Query(ItemsParams {
            names: Some("Foo,bAr".to_string()),
            ..Default::default()
        });
        let response = items_handler(State(state), Path("by-name".to_string()), params).await;

        assert_eq!(
            body_json(response).await,
            json!([
                {"id": 1, "name": "Foo", "tradable": false},
                {"id": 2, "name": "Bar", "tradable": true}
            ])
        );
    }

    #[tokio::test]
    async fn items_by_name_requires_names() {
        let state = test_state(vec![]).await;

        let response = items_handler(State(state), Path("by-name".to_string()), no_params()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"text": "invalid request parameters"})
        );
    }

    #[tokio::test]
    async fn items_by_skin_returns_matching_ids() {
        let mut foo = item(1, "Foo");
        foo.skin = Some(42);
        let bar = item(2, "Bar");
        let mut foobar = item(3, "FooBar");
        foobar.skin = Some(123);
        let mut herp = item(4, "Herp");
        herp.skin = Some(42);

        let state = test_state(vec![foo, bar, foobar, herp]).await;

        let params = Query(ItemsParams {
            skin_id: Some("42".to_string()),
            ..Default::default()
        });
        let response = items_handler(State(state), Path("by-skin".to_string()), params).await;

        assert_eq!(body_json(response).await, json!([1, 4]));
    }

    #[tokio::test]
    async fn items_by_skin_requires_a_skin_id() {
        let state = test_state(vec![]).await;

        let response = items_handler(State(state), Path("by-skin".to_string()), no_params()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"text": "invalid request parameters"})
        );
    }

    #[tokio::test]
    async fn by_skin_route_rejects_a_malformed_skin_id() {
        let state = test_state(vec![]).await;

        for bad in ["abc", "0"] {
            let response =
                by_skin_handler(State(state.clone()), Path(bad.to_string()), lang(None)).await;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(response).await,
                json!({"text": "invalid request parameters"})
            );
        }
    }

    #[tokio::test]
    async fn unknown_languages_fall_back_to_the_default() {
        let state = test_state(vec![tradable(2, "Bar", true)]).await;

        let response = item_handler(State(state), Path("2".to_string()), lang(Some("xx"))).await;

        assert_eq!(
            body_json(response).await,
            json!({"id": 2, "name": "Bar", "tradable": true})
        );
    }

    #[test]
    fn items_request_parses_the_operation_tags() {
        let params = ItemsParams::default();

        assert_eq!(
            ItemsRequest::parse("all", &params),
            Some(ItemsRequest::All)
        );
        assert_eq!(
            ItemsRequest::parse("all-prices", &params),
            Some(ItemsRequest::AllPrices)
        );
        assert_eq!(
            ItemsRequest::parse("categories", &params),
            Some(ItemsRequest::Categories)
        );
        assert_eq!(
            ItemsRequest::parse("2,3,junk", &params),
            Some(ItemsRequest::Ids(vec![2, 3]))
        );
        assert_eq!(ItemsRequest::parse("autocomplete", &params), None);
        assert_eq!(ItemsRequest::parse("by-name", &params), None);
        assert_eq!(ItemsRequest::parse("by-skin", &params), None);
    }

    #[test]
    fn items_request_parses_the_craftable_filter() {
        let params = ItemsParams {
            q: Some("Foo".to_string()),
            craftable: Some("1".to_string()),
            ..Default::default()
        };

        assert_eq!(
            ItemsRequest::parse("autocomplete", &params),
            Some(ItemsRequest::Autocomplete {
                query: "Foo".to_string(),
                craftable: Some(true),
            })
        );
    }
}
