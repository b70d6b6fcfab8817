//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresProductStore`, a [`DataStore`] for products backed by a
//! `products` table, and the SQL renderer that turns predicate and ordering
//! text into parameterized SQL.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! datasource-rs = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Query translation
//!
//! - bound values become sequential `$1`, `$2` placeholders, never literals
//! - `StartsWith`/`EndsWith`/`Contains` become `ILIKE` with `%`, `_` and `\` escaped
//! - equality with `null` becomes `IS NULL` / `IS NOT NULL`
//! - ascending keys sort `NULLS FIRST`, descending keys `NULLS LAST`

use crate::core::entity::Entity;
use crate::core::error::{EntityError, GridResult, QueryError, StorageError};
use crate::core::expression::{CompareOp, Expr, TextMethod, parse_ordering, parse_predicate};
use crate::core::field::{FieldKind, FieldMap, FieldValue};
use crate::core::query::{Predicate, Query};
use crate::core::store::{DataSession, DataStore, Queryable};
use crate::products::Product;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Create the `products` table if it does not exist (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> GridResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            product_id SERIAL PRIMARY KEY,
            product_name VARCHAR(40) NOT NULL,
            unit_price NUMERIC(19, 4) NULL,
            units_in_stock SMALLINT NULL,
            discontinued BOOLEAN NOT NULL DEFAULT FALSE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_name ON products (product_name)")
        .execute(pool)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// SQL rendering
// ---------------------------------------------------------------------------

/// A WHERE clause and the values bound to its placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub sql: String,
    pub binds: Vec<FieldValue>,
}

/// Render a predicate as a WHERE clause; `None` renders `TRUE`
pub fn render_predicate<T>(
    predicate: Option<&Predicate>,
    fields: &FieldMap<T>,
) -> Result<SqlPredicate, QueryError> {
    let Some(predicate) = predicate else {
        return Ok(SqlPredicate {
            sql: "TRUE".to_string(),
            binds: Vec::new(),
        });
    };

    let expr = parse_predicate(&predicate.expression)?;
    let mut renderer = PredicateRenderer {
        fields,
        predicate,
        binds: Vec::new(),
    };
    let sql = renderer.render(&expr)?;

    Ok(SqlPredicate {
        sql,
        binds: renderer.binds,
    })
}

/// Render ordering text as the body of an ORDER BY clause
pub fn render_ordering<T>(ordering: &str, fields: &FieldMap<T>) -> Result<String, QueryError> {
    let terms = parse_ordering(ordering)?
        .into_iter()
        .map(|term| -> Result<String, QueryError> {
            let column = fields.resolve(&term.field)?.column;
            Ok(if term.descending {
                format!("{} DESC NULLS LAST", column)
            } else {
                format!("{} ASC NULLS FIRST", column)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(terms.join(", "))
}

/// Escape LIKE metacharacters so the value matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

struct PredicateRenderer<'a, T> {
    fields: &'a FieldMap<T>,
    predicate: &'a Predicate,
    binds: Vec<FieldValue>,
}

impl<T> PredicateRenderer<'_, T> {
    fn bind(&mut self, value: FieldValue) -> usize {
        self.binds.push(value);
        self.binds.len()
    }

    fn render(&mut self, expr: &Expr) -> Result<String, QueryError> {
        match expr {
            Expr::Literal(true) => Ok("TRUE".to_string()),
            Expr::Literal(false) => Ok("FALSE".to_string()),
            Expr::Compare { field, op, param } => {
                let column = self.fields.resolve(field)?.column;
                let value = self.predicate.parameter(*param)?.clone();

                if value.is_null() {
                    return Ok(match op {
                        CompareOp::Eq => format!("{} IS NULL", column),
                        CompareOp::Ne => format!("{} IS NOT NULL", column),
                        _ => "FALSE".to_string(),
                    });
                }

                let n = self.bind(value);
                Ok(match op {
                    CompareOp::Eq => format!("{} = ${}", column, n),
                    CompareOp::Ne => format!("{} IS DISTINCT FROM ${}", column, n),
                    CompareOp::Lt => format!("{} < ${}", column, n),
                    CompareOp::Le => format!("{} <= ${}", column, n),
                    CompareOp::Gt => format!("{} > ${}", column, n),
                    CompareOp::Ge => format!("{} >= ${}", column, n),
                })
            }
            Expr::Text {
                field,
                method,
                param,
            } => {
                let def = self.fields.resolve(field)?;
                if def.kind != FieldKind::Text {
                    return Err(QueryError::UnsupportedOperator {
                        field: field.clone(),
                        operator: method.name().to_string(),
                    });
                }
                let needle = match self.predicate.parameter(*param)? {
                    FieldValue::String(s) => escape_like(s),
                    other => {
                        return Err(QueryError::TypeMismatch {
                            field: field.clone(),
                            expected: FieldKind::Text.name(),
                            value: other.to_string(),
                        });
                    }
                };
                let pattern = match method {
                    TextMethod::StartsWith => format!("{}%", needle),
                    TextMethod::EndsWith => format!("%{}", needle),
                    TextMethod::Contains => format!("%{}%", needle),
                };
                let n = self.bind(FieldValue::String(pattern));
                Ok(format!("{} ILIKE ${} ESCAPE '\\'", def.column, n))
            }
            Expr::And(terms) => self.render_group(terms, " AND "),
            Expr::Or(terms) => self.render_group(terms, " OR "),
        }
    }

    fn render_group(&mut self, terms: &[Expr], separator: &str) -> Result<String, QueryError> {
        let parts = terms
            .iter()
            .map(|term| self.render(term))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("({})", parts.join(separator)))
    }
}

type PgQueryAs<'q, O> = QueryAs<'q, Postgres, O, PgArguments>;

fn bind_values<'q, O>(mut query: PgQueryAs<'q, O>, values: &[FieldValue]) -> PgQueryAs<'q, O> {
    for value in values {
        query = match value {
            FieldValue::String(s) => query.bind(s.clone()),
            FieldValue::Integer(i) => query.bind(*i),
            FieldValue::Decimal(d) => query.bind(*d),
            FieldValue::Boolean(b) => query.bind(*b),
            FieldValue::Null => query.bind(None::<String>),
        };
    }
    query
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// PostgresProductStore
// ---------------------------------------------------------------------------

const PRODUCT_COLUMNS: &str = "product_id, product_name, unit_price, units_in_stock, discontinued";

type ProductRow = (i32, String, Option<Decimal>, Option<i16>, bool);

fn row_to_product(
    (product_id, product_name, unit_price, units_in_stock, discontinued): ProductRow,
) -> Product {
    Product {
        product_id,
        product_name,
        unit_price,
        units_in_stock,
        discontinued,
    }
}

/// Product store backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// let store = PostgresProductStore::connect("postgres://localhost/northwind", 5).await?;
/// let mut session = store.session().await?;
/// let total = session.count(None).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Wrap an existing pool; the schema is not touched
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and make sure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> GridResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        ensure_schema(&pool).await?;

        tracing::info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DataStore<Product> for PostgresProductStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn session(&self) -> GridResult<Box<dyn DataSession<Product>>> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PostgresSession {
            conn,
            changes: Vec::new(),
        }))
    }
}

enum Change {
    Add(Product),
    Replace(Product),
    Remove(i32),
}

/// Session holding one pooled connection until dropped
pub struct PostgresSession {
    conn: PoolConnection<Postgres>,
    changes: Vec<Change>,
}

#[async_trait]
impl Queryable<Product> for PostgresSession {
    async fn count(&mut self, predicate: Option<&Predicate>) -> GridResult<u64> {
        let filter = render_predicate(predicate, Product::fields())?;
        let sql = format!("SELECT COUNT(*) FROM products WHERE {}", filter.sql);

        let (count,) = bind_values(sqlx::query_as::<_, (i64,)>(&sql), &filter.binds)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch(&mut self, query: &Query) -> GridResult<Vec<Product>> {
        let fields = Product::fields();
        let filter = render_predicate(query.predicate.as_ref(), fields)?;
        let order_by = render_ordering(&query.ordering, fields)?;

        let mut sql = format!(
            "SELECT {} FROM products WHERE {} ORDER BY {} OFFSET ${}",
            PRODUCT_COLUMNS,
            filter.sql,
            order_by,
            filter.binds.len() + 1
        );
        if query.take.is_some() {
            sql.push_str(&format!(" LIMIT ${}", filter.binds.len() + 2));
        }
        tracing::debug!(sql = %sql, binds = filter.binds.len(), "fetching products");

        let mut statement = bind_values(sqlx::query_as::<_, ProductRow>(&sql), &filter.binds)
            .bind(to_i64(query.skip));
        if let Some(take) = query.take {
            statement = statement.bind(to_i64(take));
        }

        let rows = statement.fetch_all(&mut *self.conn).await?;
        Ok(rows.into_iter().map(row_to_product).collect())
    }
}

#[async_trait]
impl DataSession<Product> for PostgresSession {
    fn add(&mut self, entity: Product) {
        self.changes.push(Change::Add(entity));
    }

    fn attach_modified(&mut self, entity: Product) {
        self.changes.push(Change::Replace(entity));
    }

    fn remove(&mut self, id: i32) {
        self.changes.push(Change::Remove(id));
    }

    fn pending(&self) -> usize {
        self.changes.len()
    }

    async fn save_changes(&mut self) -> GridResult<Vec<Product>> {
        let changes = std::mem::take(&mut self.changes);
        let not_found = |id: i32| EntityError::NotFound {
            entity_type: Product::entity_type().to_string(),
            id,
        };

        // Dropping the transaction on an early return rolls it back
        let mut tx = sqlx::Connection::begin(&mut *self.conn)
            .await
            .map_err(|e| transaction_error("begin", e))?;
        let mut inserted = Vec::new();

        for change in changes {
            match change {
                Change::Add(mut product) => {
                    let (id,): (i32,) = sqlx::query_as(
                        "INSERT INTO products (product_name, unit_price, units_in_stock, discontinued)
                         VALUES ($1, $2, $3, $4)
                         RETURNING product_id",
                    )
                    .bind(&product.product_name)
                    .bind(product.unit_price)
                    .bind(product.units_in_stock)
                    .bind(product.discontinued)
                    .fetch_one(&mut *tx)
                    .await?;
                    product.set_id(id);
                    inserted.push(product);
                }
                Change::Replace(product) => {
                    let result = sqlx::query(
                        "UPDATE products
                         SET product_name = $1, unit_price = $2, units_in_stock = $3, discontinued = $4
                         WHERE product_id = $5",
                    )
                    .bind(&product.product_name)
                    .bind(product.unit_price)
                    .bind(product.units_in_stock)
                    .bind(product.discontinued)
                    .bind(product.product_id)
                    .execute(&mut *tx)
                    .await?;
                    if result.rows_affected() == 0 {
                        return Err(not_found(product.product_id).into());
                    }
                }
                Change::Remove(id) => {
                    let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                    if result.rows_affected() == 0 {
                        return Err(not_found(id).into());
                    }
                }
            }
        }

        tx.commit().await.map_err(|e| transaction_error("commit", e))?;
        tracing::debug!(inserted = inserted.len(), "committed product changes");
        Ok(inserted)
    }
}

fn transaction_error(step: &str, err: sqlx::Error) -> StorageError {
    StorageError::TransactionError {
        message: format!("{} failed: {}", step, err),
    }
}

impl Drop for PostgresSession {
    fn drop(&mut self) {
        if !self.changes.is_empty() {
            tracing::warn!(
                pending = self.changes.len(),
                "session dropped with unsaved changes"
            );
        }
    }
}
