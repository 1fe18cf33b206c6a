//! Product catalog collaborator.
//!
//! Read-only from the engine's perspective: the cart never writes to it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{Product, ProductSnapshot};
use crate::domain::value_objects::Money;
use crate::{Error, Result};

/// Resolves product identifiers to catalog records.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Looks up one product; `ProductNotFound` when the id does not
    /// resolve.
    async fn lookup(&self, id: Uuid) -> Result<Product>;

    /// The whole catalog, in code order.
    async fn list(&self) -> Result<Vec<Product>>;

    /// The products a cart's computations need, keyed by id.
    async fn snapshot(&self, ids: &[Uuid]) -> Result<ProductSnapshot> {
        let mut products = HashMap::with_capacity(ids.len());
        for &id in ids {
            products.insert(id, self.lookup(id).await?);
        }
        Ok(products)
    }
}

/// In-memory catalog for tests and runs without a database.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with the stock demo products.
    pub fn with_default_products() -> Self {
        let products = [
            Product::new("GR1", "Green Tea", Money::from_minor(311)),
            Product::new("SR1", "Strawberries", Money::from_minor(500)),
            Product::new("CF1", "Coffee", Money::from_minor(1123)),
        ];
        Self {
            products: Arc::new(RwLock::new(
                products.into_iter().map(|p| (p.id, p)).collect(),
            )),
        }
    }

    pub async fn insert(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn lookup(&self, id: Uuid) -> Result<Product> {
        self.products
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::ProductNotFound)
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(products)
    }
}

/// Postgres-backed catalog.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    code: String,
    name: String,
    price: Decimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            code: row.code,
            name: row.name,
            price: Money::new(row.price),
        }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn lookup(&self, id: Uuid) -> Result<Product> {
        sqlx::query_as::<_, ProductRow>("SELECT id, code, name, price FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::from)
            .ok_or(Error::ProductNotFound)
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, code, name, price FROM products ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
