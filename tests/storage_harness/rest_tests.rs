//! REST integration test macro for product stores.
//!
//! The `rest_integration_tests!` macro generates HTTP-level tests that drive
//! the grid endpoints through full round-trips:
//! JSON → HTTP request → handler → session → HTTP response → JSON.

/// Generate a REST integration test suite for a product store.
///
/// `$factory` must produce a fresh, empty `impl DataStore<Product> + 'static`.
///
/// # Generated Tests
///
/// ## Read
/// - `test_read_first_page`, `test_read_last_page`
/// - `test_read_filter_and_sort`: grid property names and camelCase aliases
/// - `test_read_invalid_operator` → 400 `INVALID_OPERATOR`
/// - `test_read_unknown_field` → 400 `UNKNOWN_FIELD`
/// - `test_read_sort_direction_required` → 400 `INVALID_SORT_DIRECTION`
/// - `test_read_malformed_body` → 400 `VALIDATION_ERROR`
///
/// ## Writes
/// - `test_create_returns_ids`, `test_create_validation_errors`
/// - `test_update_replaces`, `test_update_unknown_id`
/// - `test_destroy_removes`, `test_destroy_requires_id`
///
/// ## Misc
/// - `test_names`, `test_health`
#[macro_export]
macro_rules! rest_integration_tests {
    ($factory:expr) => {
        mod rest_integration_tests {
            use super::*;
            use axum::http::StatusCode;
            use axum_test::TestServer;
            use datasource::prelude::*;
            use serde_json::{Value, json};

            async fn make_server() -> TestServer {
                let store = storage_harness::shared($factory);
                let router = ServerBuilder::new().with_shared_store(store).build().unwrap();
                TestServer::new(router).unwrap()
            }

            async fn seeded_server(n: usize) -> TestServer {
                let server = make_server().await;
                let records: Vec<Value> = numbered_products(n)
                    .into_iter()
                    .map(|p| serde_json::to_value(ProductRecord::from(p)).unwrap())
                    .collect();
                server
                    .post("/products/create")
                    .json(&records)
                    .await
                    .assert_status_ok();
                server
            }

            fn record_ids(body: &Value) -> Vec<i64> {
                body.as_array()
                    .unwrap()
                    .iter()
                    .map(|r| r["id"].as_i64().unwrap())
                    .collect()
            }

            // ==============================================================
            // Read
            // ==============================================================

            #[tokio::test]
            async fn test_read_first_page() {
                let server = seeded_server(25).await;

                let response = server
                    .post("/products/read")
                    .json(&json!({"take": 10, "skip": 0}))
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["total"], 25);
                assert_eq!(record_ids(&body["data"]), (1..=10).collect::<Vec<i64>>());
                assert_eq!(body["data"][0]["name"], "Product 01");
                assert_eq!(body["data"][0]["unitPrice"], 1.0);
                assert_eq!(body["data"][0]["unitsInStock"], 1);
                assert_eq!(body["data"][0]["discontinued"], false);
            }

            #[tokio::test]
            async fn test_read_last_page() {
                let server = seeded_server(25).await;

                let response = server
                    .post("/products/read")
                    .json(&json!({"take": 10, "skip": 20}))
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["total"], 25);
                assert_eq!(record_ids(&body["data"]), vec![21, 22, 23, 24, 25]);
            }

            #[tokio::test]
            async fn test_read_empty_body_object() {
                let server = seeded_server(3).await;

                let response = server.post("/products/read").json(&json!({})).await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(body["total"], 3);
                assert_eq!(record_ids(&body["data"]), vec![1, 2, 3]);
            }

            #[tokio::test]
            async fn test_read_filter_and_sort() {
                let server = seeded_server(25).await;

                let response = server
                    .post("/products/read")
                    .json(&json!({
                        "take": 3,
                        "skip": 0,
                        "sort": [{"field": "unitPrice", "dir": "desc"}],
                        "filter": {
                            "logic": "and",
                            "filters": [
                                {"field": "Discontinued", "operator": "eq", "value": false},
                                {"field": "name", "operator": "startswith", "value": "product 2"}
                            ]
                        }
                    }))
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                // Product 20 and Product 25 are discontinued
                assert_eq!(body["total"], 4);
                assert_eq!(record_ids(&body["data"]), vec![24, 23, 22]);
            }

            #[tokio::test]
            async fn test_read_invalid_operator() {
                let server = seeded_server(3).await;

                let response = server
                    .post("/products/read")
                    .json(&json!({
                        "filter": {"field": "ProductName", "operator": "like", "value": "Chai"}
                    }))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "INVALID_OPERATOR");
                assert_eq!(body["details"]["operator"], "like");
            }

            #[tokio::test]
            async fn test_read_unknown_field() {
                let server = seeded_server(3).await;

                let response = server
                    .post("/products/read")
                    .json(&json!({"sort": [{"field": "CategoryID", "dir": "asc"}]}))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "UNKNOWN_FIELD");
            }

            #[tokio::test]
            async fn test_read_sort_direction_required() {
                let server = seeded_server(3).await;

                let response = server
                    .post("/products/read")
                    .json(&json!({"sort": [{"field": "ProductName", "dir": ""}]}))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "INVALID_SORT_DIRECTION");
            }

            #[tokio::test]
            async fn test_read_malformed_body() {
                let server = make_server().await;

                let response = server.post("/products/read").text("{not json").await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "VALIDATION_ERROR");
            }

            // ==============================================================
            // Create
            // ==============================================================

            #[tokio::test]
            async fn test_create_returns_ids() {
                let server = make_server().await;

                let response = server
                    .post("/products/create")
                    .json(&json!([
                        {"ProductName": "  Chai  ", "UnitPrice": 18, "UnitsInStock": 39},
                        {"name": "Chang", "unitPrice": 19.5, "discontinued": true},
                        {"id": 77, "name": "Aniseed Syrup"}
                    ]))
                    .await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(record_ids(&body), vec![1, 2, 3]);
                assert_eq!(body[0]["name"], "Chai");
                assert_eq!(body[0]["unitsInStock"], 39);
                assert_eq!(body[1]["unitPrice"], 19.5);
                assert_eq!(body[1]["discontinued"], true);
                assert_eq!(body[2]["unitPrice"], Value::Null);
            }

            #[tokio::test]
            async fn test_create_validation_errors() {
                let server = make_server().await;

                let response = server
                    .post("/products/create")
                    .json(&json!([
                        {"name": "Fine"},
                        {"name": "   ", "unitPrice": -1},
                        {"name": "x".repeat(41)}
                    ]))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["code"], "VALIDATION_ERROR");
                let fields: Vec<&str> = body["details"]["fields"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|e| e["field"].as_str().unwrap())
                    .collect();
                assert!(fields.contains(&"[1].name"));
                assert!(fields.contains(&"[1].unitPrice"));
                assert!(fields.contains(&"[2].name"));
                assert!(!fields.iter().any(|f| f.starts_with("[0]")));

                // Nothing from the batch was stored
                let read: Value = server.post("/products/read").json(&json!({})).await.json();
                assert_eq!(read["total"], 0);
            }

            #[tokio::test]
            async fn test_create_rejects_non_array() {
                let server = make_server().await;

                let response = server
                    .post("/products/create")
                    .json(&json!({"name": "Chai"}))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
            }

            // ==============================================================
            // Update
            // ==============================================================

            #[tokio::test]
            async fn test_update_replaces() {
                let server = seeded_server(3).await;

                let response = server
                    .post("/products/update")
                    .json(&json!([
                        {"id": 2, "name": "Renamed", "unitPrice": 7.25, "unitsInStock": 0, "discontinued": true}
                    ]))
                    .await;

                response.assert_status_ok();
                assert!(response.text().is_empty());

                let read: Value = server
                    .post("/products/read")
                    .json(&json!({"filter": {"field": "ProductID", "operator": "eq", "value": 2}}))
                    .await
                    .json();
                assert_eq!(read["total"], 1);
                assert_eq!(read["data"][0]["name"], "Renamed");
                assert_eq!(read["data"][0]["unitPrice"], 7.25);
                assert_eq!(read["data"][0]["discontinued"], true);
            }

            #[tokio::test]
            async fn test_update_unknown_id() {
                let server = seeded_server(3).await;

                let response = server
                    .post("/products/update")
                    .json(&json!([
                        {"id": 1, "name": "Should not stick"},
                        {"id": 404, "name": "Ghost"}
                    ]))
                    .await;

                response.assert_status(StatusCode::NOT_FOUND);
                let body: Value = response.json();
                assert_eq!(body["code"], "ENTITY_NOT_FOUND");
                assert_eq!(body["details"]["id"], 404);

                let read: Value = server.post("/products/read").json(&json!({})).await.json();
                assert_eq!(read["data"][0]["name"], "Product 01");
            }

            #[tokio::test]
            async fn test_update_requires_id() {
                let server = seeded_server(1).await;

                let response = server
                    .post("/products/update")
                    .json(&json!([{"name": "No id"}]))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
                let body: Value = response.json();
                assert_eq!(body["details"]["fields"][0]["field"], "[0].id");
            }

            // ==============================================================
            // Destroy
            // ==============================================================

            #[tokio::test]
            async fn test_destroy_removes() {
                let server = seeded_server(5).await;

                let response = server
                    .post("/products/destroy")
                    .json(&json!([{"id": 2}, {"ProductID": 4, "ProductName": "ignored"}]))
                    .await;

                response.assert_status_ok();
                assert!(response.text().is_empty());

                let read: Value = server.post("/products/read").json(&json!({})).await.json();
                assert_eq!(read["total"], 3);
                assert_eq!(record_ids(&read["data"]), vec![1, 3, 5]);
            }

            #[tokio::test]
            async fn test_destroy_unknown_id() {
                let server = seeded_server(2).await;

                let response = server
                    .post("/products/destroy")
                    .json(&json!([{"id": 1}, {"id": 99}]))
                    .await;

                response.assert_status(StatusCode::NOT_FOUND);
                let read: Value = server.post("/products/read").json(&json!({})).await.json();
                assert_eq!(read["total"], 2);
            }

            #[tokio::test]
            async fn test_destroy_requires_id() {
                let server = seeded_server(2).await;

                let response = server
                    .post("/products/destroy")
                    .json(&json!([{"name": "Product 01"}]))
                    .await;

                response.assert_status(StatusCode::BAD_REQUEST);
            }

            // ==============================================================
            // Misc
            // ==============================================================

            #[tokio::test]
            async fn test_names() {
                let server = seeded_server(3).await;

                let response = server.get("/products/names").await;

                response.assert_status_ok();
                let body: Value = response.json();
                assert_eq!(
                    body,
                    json!([
                        {"ProductName": "Product 01"},
                        {"ProductName": "Product 02"},
                        {"ProductName": "Product 03"}
                    ])
                );
            }

            #[tokio::test]
            async fn test_health() {
                let server = make_server().await;

                for path in ["/health", "/healthz"] {
                    let response = server.get(path).await;
                    response.assert_status_ok();
                    let body: Value = response.json();
                    assert_eq!(body["status"], "ok");
                }
            }
        }
    };
}
