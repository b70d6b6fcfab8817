//! Macro-generated test suite for `DataStore<Product>` contract validation.
//!
//! The `store_contract_tests!` macro generates a test module that runs the
//! grid query adapter and the session write path against any product store.
//!
//! # Generated Tests
//!
//! ## Paging
//! - `test_first_page`: take 10 of 25, total 25
//! - `test_last_partial_page`: skip 20 of 25 returns the last 5
//! - `test_skip_past_end`: empty page, total unchanged
//! - `test_take_unlimited`: no take returns everything
//!
//! ## Filter / Sort
//! - `test_filter_then_page`: total counts matches, not the page
//! - `test_nested_composite_filter`
//! - `test_text_search_ignores_case`
//! - `test_empty_composite_matches_all`
//! - `test_null_comparisons`
//! - `test_sort_with_key_tie_breaker`
//! - `test_sort_nulls_first_ascending`
//!
//! ## Query errors
//! - `test_invalid_operator`, `test_unknown_filter_field`, `test_unknown_sort_field`,
//!   `test_invalid_sort_direction`, `test_text_operator_on_number`
//! - `test_sort_field_with_extra_terms_rejected`, `test_empty_sort_direction_rejected`,
//!   `test_sort_direction_with_extra_terms_rejected`: one field and one direction per entry
//!
//! ## Writes
//! - `test_add_assigns_ids_in_order`
//! - `test_attach_modified_replaces_record`
//! - `test_remove_deletes_record`
//! - `test_batch_with_unknown_id_applies_nothing`
//! - `test_ids_are_not_reused`
//! - `test_concurrent_sessions`

/// Generate a `DataStore<Product>` conformance test suite.
///
/// `$factory` must be an expression producing a fresh, empty store
/// implementing `DataStore<Product> + 'static`. It may contain `.await` and is
/// re-evaluated for each test.
#[macro_export]
macro_rules! store_contract_tests {
    ($factory:expr) => {
        mod store_contract_tests {
            use super::*;
            use datasource::core::error::{EntityError, QueryError};
            use datasource::prelude::*;
            use serde_json::json;

            async fn make_store() -> std::sync::Arc<dyn DataStore<Product>> {
                storage_harness::shared($factory)
            }

            async fn seeded(n: usize) -> (std::sync::Arc<dyn DataStore<Product>>, Vec<Product>) {
                let store = make_store().await;
                let products =
                    storage_harness::insert_all(store.as_ref(), numbered_products(n)).await;
                (store, products)
            }

            fn query_error(err: GridError) -> QueryError {
                match err {
                    GridError::Query(e) => e,
                    other => panic!("expected a query error, got {:?}", other),
                }
            }

            // ==============================================================
            // Paging
            // ==============================================================

            #[tokio::test]
            async fn test_first_page() {
                let (store, _) = seeded(25).await;

                let page = query(store.as_ref(), Some(10), 0, &[], None).await.unwrap();

                assert_eq!(page.total, 25);
                assert_ids(&page.data, &(1..=10).collect::<Vec<_>>());
            }

            #[tokio::test]
            async fn test_last_partial_page() {
                let (store, _) = seeded(25).await;

                let page = query(store.as_ref(), Some(10), 20, &[], None).await.unwrap();

                assert_eq!(page.total, 25);
                assert_ids(&page.data, &[21, 22, 23, 24, 25]);
            }

            #[tokio::test]
            async fn test_skip_past_end() {
                let (store, _) = seeded(5).await;

                let page = query(store.as_ref(), Some(10), 50, &[], None).await.unwrap();

                assert_eq!(page.total, 5);
                assert!(page.data.is_empty());
            }

            #[tokio::test]
            async fn test_take_unlimited() {
                let (store, _) = seeded(12).await;

                let page = query(store.as_ref(), None, 0, &[], None).await.unwrap();

                assert_eq!(page.total, 12);
                assert_eq!(page.data.len(), 12);
            }

            #[tokio::test]
            async fn test_empty_store() {
                let store = make_store().await;

                let page = query(store.as_ref(), Some(10), 0, &[], None).await.unwrap();

                assert_eq!(page.total, 0);
                assert!(page.data.is_empty());
            }

            // ==============================================================
            // Filter / Sort
            // ==============================================================

            #[tokio::test]
            async fn test_filter_then_page() {
                let (store, products) = seeded(25).await;
                let active: Vec<i32> = products
                    .iter()
                    .filter(|p| !p.discontinued)
                    .map(|p| p.product_id)
                    .collect();

                let filter = FilterNode::composite(
                    FilterLogic::And,
                    vec![FilterNode::leaf("Discontinued", "eq", json!(false))],
                );
                let page = query(store.as_ref(), Some(10), 10, &[], Some(&filter))
                    .await
                    .unwrap();

                assert_eq!(page.total, active.len() as u64);
                assert_ids(&page.data, &active[10..20]);
            }

            #[tokio::test]
            async fn test_nested_composite_filter() {
                let (store, products) = seeded(25).await;
                let expected: Vec<i32> = products
                    .iter()
                    .filter(|p| {
                        let price = p.unit_price.unwrap();
                        (price >= Decimal::new(20, 0) || p.product_name.ends_with('3'))
                            && !p.discontinued
                    })
                    .map(|p| p.product_id)
                    .collect();

                let filter: FilterNode = serde_json::from_value(json!({
                    "logic": "and",
                    "filters": [
                        {
                            "logic": "or",
                            "filters": [
                                {"field": "UnitPrice", "operator": "gte", "value": 20},
                                {"field": "ProductName", "operator": "endswith", "value": "3"}
                            ]
                        },
                        {"field": "Discontinued", "operator": "neq", "value": true}
                    ]
                }))
                .unwrap();
                let page = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap();

                assert_eq!(page.total, expected.len() as u64);
                assert_ids(&page.data, &expected);
            }

            #[tokio::test]
            async fn test_text_search_ignores_case() {
                let (store, products) = seeded(25).await;
                let expected: Vec<i32> = products
                    .iter()
                    .filter(|p| p.product_name.contains("Product 1"))
                    .map(|p| p.product_id)
                    .collect();

                let filter = FilterNode::leaf("ProductName", "contains", json!("PRODUCT 1"));
                let page = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap();

                assert_eq!(page.total, 10);
                assert_ids(&page.data, &expected);
            }

            #[tokio::test]
            async fn test_like_metacharacters_match_literally() {
                let store = make_store().await;
                storage_harness::insert_all(
                    store.as_ref(),
                    vec![bare_product("100% Juice"), bare_product("1000 Juices")],
                )
                .await;

                let filter = FilterNode::leaf("ProductName", "startswith", json!("100%"));
                let page = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap();

                assert_eq!(names(&page.data), vec!["100% Juice"]);
            }

            #[tokio::test]
            async fn test_empty_composite_matches_all() {
                let (store, _) = seeded(7).await;

                let filter = FilterNode::composite(FilterLogic::Or, vec![]);
                let page = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap();

                assert_eq!(page.total, 7);
            }

            #[tokio::test]
            async fn test_null_comparisons() {
                let store = make_store().await;
                let mut products = numbered_products(3);
                products.push(bare_product("Mystery"));
                storage_harness::insert_all(store.as_ref(), products).await;

                let is_null = FilterNode::leaf("UnitPrice", "eq", json!(null));
                let page = query(store.as_ref(), None, 0, &[], Some(&is_null)).await.unwrap();
                assert_eq!(names(&page.data), vec!["Mystery"]);

                let not_null = FilterNode::leaf("UnitPrice", "neq", json!(null));
                let page = query(store.as_ref(), None, 0, &[], Some(&not_null)).await.unwrap();
                assert_eq!(page.total, 3);

                let greater = FilterNode::leaf("UnitPrice", "gt", json!(1));
                let page = query(store.as_ref(), None, 0, &[], Some(&greater)).await.unwrap();
                assert_ids(&page.data, &[2, 3]);

                let not_two = FilterNode::leaf("UnitsInStock", "neq", json!(2));
                let page = query(store.as_ref(), None, 0, &[], Some(&not_two)).await.unwrap();
                assert_ids(&page.data, &[1, 3, 4]);
            }

            #[tokio::test]
            async fn test_sort_with_key_tie_breaker() {
                let (store, products) = seeded(25).await;
                let mut expected: Vec<(i16, i32)> = products
                    .iter()
                    .map(|p| (p.units_in_stock.unwrap(), p.product_id))
                    .collect();
                expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
                let expected: Vec<i32> = expected.into_iter().map(|(_, id)| id).collect();

                let sort = vec![SortDescriptor::new("UnitsInStock", "desc")];
                let first = query(store.as_ref(), Some(10), 0, &sort, None).await.unwrap();
                let second = query(store.as_ref(), Some(10), 10, &sort, None).await.unwrap();

                assert_ids(&first.data, &expected[..10]);
                assert_ids(&second.data, &expected[10..20]);
            }

            #[tokio::test]
            async fn test_sort_by_alias_descending_key() {
                let (store, _) = seeded(5).await;

                let sort = vec![SortDescriptor::new("id", "DESC")];
                let page = query(store.as_ref(), None, 0, &sort, None).await.unwrap();

                assert_ids(&page.data, &[5, 4, 3, 2, 1]);
            }

            #[tokio::test]
            async fn test_sort_nulls_first_ascending() {
                let store = make_store().await;
                let mut products = numbered_products(2);
                products.push(bare_product("Mystery"));
                storage_harness::insert_all(store.as_ref(), products).await;

                let asc = vec![SortDescriptor::new("UnitPrice", "asc")];
                let page = query(store.as_ref(), None, 0, &asc, None).await.unwrap();
                assert_ids(&page.data, &[3, 1, 2]);

                let desc = vec![SortDescriptor::new("UnitPrice", "desc")];
                let page = query(store.as_ref(), None, 0, &desc, None).await.unwrap();
                assert_ids(&page.data, &[2, 1, 3]);
            }

            // ==============================================================
            // Query errors
            // ==============================================================

            #[tokio::test]
            async fn test_invalid_operator() {
                let (store, _) = seeded(3).await;

                let filter = FilterNode::leaf("ProductName", "like", json!("Chai"));
                let err = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap_err();

                assert_eq!(
                    query_error(err),
                    QueryError::InvalidOperator {
                        operator: "like".to_string()
                    }
                );
            }

            #[tokio::test]
            async fn test_unknown_filter_field() {
                let (store, _) = seeded(3).await;

                let filter = FilterNode::leaf("SupplierID", "eq", json!(1));
                let err = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap_err();

                assert!(matches!(query_error(err), QueryError::UnknownField { .. }));
            }

            #[tokio::test]
            async fn test_unknown_sort_field() {
                let (store, _) = seeded(3).await;

                let sort = vec![SortDescriptor::new("SupplierID", "asc")];
                let err = query(store.as_ref(), None, 0, &sort, None).await.unwrap_err();

                assert_eq!(err.error_code(), "UNKNOWN_FIELD");
            }

            #[tokio::test]
            async fn test_sort_field_is_never_spliced() {
                let (store, _) = seeded(3).await;

                let sort = vec![SortDescriptor::new("1; DROP TABLE products", "asc")];
                let err = query(store.as_ref(), None, 0, &sort, None).await.unwrap_err();
                query_error(err);

                let page = query(store.as_ref(), None, 0, &[], None).await.unwrap();
                assert_eq!(page.total, 3);
            }

            #[tokio::test]
            async fn test_invalid_sort_direction() {
                let (store, _) = seeded(3).await;

                let sort = vec![SortDescriptor::new("ProductName", "sideways")];
                let err = query(store.as_ref(), None, 0, &sort, None).await.unwrap_err();

                assert_eq!(err.error_code(), "INVALID_SORT_DIRECTION");
            }

            #[tokio::test]
            async fn test_sort_field_with_extra_terms_rejected() {
                let (store, _) = seeded(3).await;

                let sort = vec![SortDescriptor::new("ProductName desc, UnitPrice", "asc")];
                let err = query(store.as_ref(), None, 0, &sort, None).await.unwrap_err();

                assert_eq!(
                    query_error(err),
                    QueryError::UnknownField {
                        field: "ProductName desc, UnitPrice".to_string()
                    }
                );
            }

            #[tokio::test]
            async fn test_empty_sort_direction_rejected() {
                let (store, _) = seeded(3).await;

                let sort = vec![SortDescriptor::new("ProductName", "")];
                let err = query(store.as_ref(), None, 0, &sort, None).await.unwrap_err();

                assert_eq!(err.error_code(), "INVALID_SORT_DIRECTION");
            }

            #[tokio::test]
            async fn test_sort_direction_with_extra_terms_rejected() {
                let (store, _) = seeded(3).await;

                let sort = vec![SortDescriptor::new("ProductName", "desc, UnitPrice desc")];
                let err = query(store.as_ref(), None, 0, &sort, None).await.unwrap_err();

                assert_eq!(
                    query_error(err),
                    QueryError::InvalidSortDirection {
                        field: "ProductName".to_string(),
                        direction: "desc, UnitPrice desc".to_string(),
                    }
                );
            }

            #[tokio::test]
            async fn test_text_operator_on_number() {
                let (store, _) = seeded(3).await;

                let filter = FilterNode::leaf("UnitPrice", "contains", json!("1"));
                let err = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap_err();

                assert!(matches!(
                    query_error(err),
                    QueryError::UnsupportedOperator { .. }
                ));
            }

            #[tokio::test]
            async fn test_value_type_mismatch() {
                let (store, _) = seeded(3).await;

                let filter = FilterNode::leaf("UnitsInStock", "gt", json!("plenty"));
                let err = query(store.as_ref(), None, 0, &[], Some(&filter)).await.unwrap_err();

                assert!(matches!(query_error(err), QueryError::TypeMismatch { .. }));
            }

            // ==============================================================
            // Writes
            // ==============================================================

            #[tokio::test]
            async fn test_add_assigns_ids_in_order() {
                let store = make_store().await;

                let created =
                    storage_harness::insert_all(store.as_ref(), numbered_products(3)).await;

                assert_ids(&created, &[1, 2, 3]);
                assert_eq!(names(&created), vec!["Product 01", "Product 02", "Product 03"]);
            }

            #[tokio::test]
            async fn test_attach_modified_replaces_record() {
                let (store, products) = seeded(3).await;
                let mut changed = products[1].clone();
                changed.product_name = "Renamed".to_string();
                changed.unit_price = None;
                changed.discontinued = true;

                let mut session = store.session().await.unwrap();
                session.attach_modified(changed.clone());
                assert_eq!(session.pending(), 1);
                let inserted = session.save_changes().await.unwrap();
                assert!(inserted.is_empty());
                drop(session);

                let page = query(store.as_ref(), None, 0, &[], None).await.unwrap();
                assert_eq!(page.data[1], changed);
                assert_eq!(page.data[0], products[0]);
            }

            #[tokio::test]
            async fn test_remove_deletes_record() {
                let (store, _) = seeded(3).await;

                let mut session = store.session().await.unwrap();
                session.remove(2);
                session.save_changes().await.unwrap();
                drop(session);

                let page = query(store.as_ref(), None, 0, &[], None).await.unwrap();
                assert_eq!(page.total, 2);
                assert_ids(&page.data, &[1, 3]);
            }

            #[tokio::test]
            async fn test_batch_with_unknown_id_applies_nothing() {
                let (store, products) = seeded(3).await;
                let mut changed = products[0].clone();
                changed.product_name = "Should not stick".to_string();

                let mut session = store.session().await.unwrap();
                session.attach_modified(changed);
                session.remove(3);
                session.remove(999);
                let err = session.save_changes().await.unwrap_err();
                drop(session);

                assert!(matches!(
                    err,
                    GridError::Entity(EntityError::NotFound { id: 999, .. })
                ));
                let page = query(store.as_ref(), None, 0, &[], None).await.unwrap();
                assert_eq!(page.data, products);
            }

            #[tokio::test]
            async fn test_unsaved_changes_are_discarded() {
                let store = make_store().await;

                {
                    let mut session = store.session().await.unwrap();
                    session.add(bare_product("Draft"));
                }

                let page = query(store.as_ref(), None, 0, &[], None).await.unwrap();
                assert_eq!(page.total, 0);
            }

            #[tokio::test]
            async fn test_ids_are_not_reused() {
                let (store, _) = seeded(3).await;

                let mut session = store.session().await.unwrap();
                session.remove(3);
                session.save_changes().await.unwrap();
                drop(session);

                let created =
                    storage_harness::insert_all(store.as_ref(), vec![bare_product("Late")]).await;
                assert_ids(&created, &[4]);
            }

            #[tokio::test]
            async fn test_concurrent_sessions() {
                let store = make_store().await;

                let mut handles = Vec::new();
                for worker in 0..4 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        let mut session = store.session().await.unwrap();
                        for i in 0..5 {
                            session.add(bare_product(&format!("Worker {} item {}", worker, i)));
                        }
                        session.save_changes().await.unwrap().len()
                    }));
                }

                let mut inserted = 0;
                for handle in handles {
                    inserted += handle.await.unwrap();
                }

                assert_eq!(inserted, 20);
                let page = query(store.as_ref(), None, 0, &[], None).await.unwrap();
                assert_eq!(page.total, 20);
                let mut seen = ids(&page.data);
                seen.dedup();
                assert_eq!(seen.len(), 20);
            }
        }
    };
}
