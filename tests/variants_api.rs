use std::sync::Arc;

use catalog_variants::{build_app, MemoryStore, TtlRateCache, VariantSettings};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

// Test client wrapper for making API calls
struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn put(&self, path: &str, json: Value) -> reqwest::Result<reqwest::Response> {
        self.client
            .put(&format!("{}{}", self.base_url, path))
            .json(&json)
            .send()
            .await
    }

    async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(&format!("{}{}", self.base_url, path))
            .send()
            .await
    }
}

/// Serve the API over a fresh in-memory store on an ephemeral port
async fn spawn_server(settings: VariantSettings) -> (TestClient, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = build_app(store.clone(), Arc::new(TtlRateCache::new()), settings);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (TestClient::new(format!("http://{}", address)), store)
}

fn inline_rate(title: &str) -> Value {
    json!({"state": "new", "value": {"kind": "inline", "title": title}})
}

/// Desired state keeping every property and rate of a GET response
fn keep_all(view: &Value) -> Vec<Value> {
    view["properties"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            let rates: Vec<Value> = p["rates"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| {
                    json!({
                        "state": "existing",
                        "id": r["id"],
                        "value": {"kind": "inline", "title": r["value"]["title"]}
                    })
                })
                .collect();
            json!({
                "state": "existing",
                "id": p["id"],
                "type": p["type"],
                "name": p["name"],
                "title": p["title"],
                "rates": rates
            })
        })
        .collect()
}

#[tokio::test]
async fn test_variant_workflow() {
    let (client, store) = spawn_server(VariantSettings::default()).await;
    let product = store.insert_product("hoodie", "Hoodie");
    let path = format!("/products/{}/variants", product.id);

    // 1. Two properties of two rates each produce four prices
    let response = client
        .put(
            &path,
            json!({
                "properties": [
                    {"state": "new", "type": "select", "name": "color", "title": "Color",
                     "rates": [inline_rate("Red"), inline_rate("Blue")]},
                    {"state": "new", "type": "select", "name": "size", "title": "Size",
                     "rates": [inline_rate("S"), inline_rate("M")]}
                ]
            }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["matrix"]["created"], 4);

    let view: Value = client.get(&path).await.unwrap().json().await.unwrap();
    let rate_id = |p: usize, r: usize| view["properties"][p]["rates"][r]["id"].as_i64().unwrap();
    let skus: Vec<String> = view["prices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["sku"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        skus,
        vec![
            format!("{}.0.{}.{}", product.id, rate_id(0, 0), rate_id(1, 0)),
            format!("{}.0.{}.{}", product.id, rate_id(0, 0), rate_id(1, 1)),
            format!("{}.0.{}.{}", product.id, rate_id(0, 1), rate_id(1, 0)),
            format!("{}.0.{}.{}", product.id, rate_id(0, 1), rate_id(1, 1)),
        ]
    );

    // 2. Same shape: the price edit is applied and nothing is regenerated
    let edited_id = view["prices"][0]["id"].clone();
    let response = client
        .put(
            &path,
            json!({
                "properties": keep_all(&view),
                "prices": [{
                    "id": edited_id,
                    "price": 49.9,
                    "availability": "pre-order",
                    "sku": "HOODIE-RED-S",
                    "stock": 12
                }]
            }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["resized"], false);
    assert_eq!(outcome["prices_edited"], 1);
    assert!(outcome.get("matrix").is_none());
    let edited = outcome["prices"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == edited_id)
        .unwrap();
    assert_eq!(edited["price"], 49.9);
    assert_eq!(edited["availability"], "pre-order");
    assert_eq!(edited["sku"], "HOODIE-RED-S");

    // 3. Dropping the size property collapses the matrix to one axis; the
    //    twin prices stay behind since purging is off by default
    let mut desired = keep_all(&view);
    desired.truncate(1);
    let response = client
        .put(&path, json!({"properties": desired}))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["resized"], true);
    assert_eq!(outcome["changes"]["properties_deleted"], 1);
    assert_eq!(outcome["matrix"]["reused"], 2);
    assert_eq!(outcome["matrix"]["purged"], 0);
    assert_eq!(outcome["prices"].as_array().unwrap().len(), 4);
    assert_eq!(store.rate_count(), 2);
}

#[tokio::test]
async fn test_guard_rejects_before_writing() {
    let settings = VariantSettings {
        max_price_combinations: 5,
        ..VariantSettings::default()
    };
    let (client, store) = spawn_server(settings).await;
    let product = store.insert_product("hoodie", "Hoodie");
    let path = format!("/products/{}/variants", product.id);

    let response = client
        .put(
            &path,
            json!({
                "properties": [
                    {"state": "new", "name": "color",
                     "rates": [inline_rate("Red"), inline_rate("Blue")]},
                    {"state": "new", "name": "size",
                     "rates": [inline_rate("S"), inline_rate("M"), inline_rate("L")]}
                ]
            }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "6 price combinations exceed the limit of 5");
    assert_eq!(store.rate_count(), 0);
    assert_eq!(store.price_count(), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (client, _) = spawn_server(VariantSettings::default()).await;
    let response = client.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}
