//! Cart persistence collaborator.
//!
//! The engine only needs load-mutate-save over one cart record at a time;
//! schema migration and query capabilities stay with the backing store.
//! Last write wins per cart: no cross-request locking is promised here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, LineItem};
use crate::domain::value_objects::{Money, Quantity};
use crate::{Error, Result};

#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Persists a brand-new cart.
    async fn create(&self, cart: &Cart) -> Result<()>;

    /// Loads a cart; `CartNotFound` when absent (or already destroyed).
    async fn load(&self, id: Uuid) -> Result<Cart>;

    /// Writes a cart and its line items back.
    async fn save(&self, cart: &Cart) -> Result<()>;

    /// Deletes a cart and its line items; `CartNotFound` when absent.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// All carts, in creation order.
    async fn list(&self) -> Result<Vec<Cart>>;
}

/// In-memory repository for tests and runs without a database.
#[derive(Clone, Default)]
pub struct InMemoryCartRepository {
    carts: Arc<RwLock<HashMap<Uuid, Cart>>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.carts.read().await.len()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn create(&self, cart: &Cart) -> Result<()> {
        self.carts.write().await.insert(cart.id(), cart.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Cart> {
        self.carts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::CartNotFound)
    }

    async fn save(&self, cart: &Cart) -> Result<()> {
        let mut carts = self.carts.write().await;
        if !carts.contains_key(&cart.id()) {
            return Err(Error::CartNotFound);
        }
        carts.insert(cart.id(), cart.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.carts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::CartNotFound)
    }

    async fn list(&self) -> Result<Vec<Cart>> {
        let mut carts: Vec<Cart> = self.carts.read().await.values().cloned().collect();
        carts.sort_by_key(|c| (c.created_at(), c.id()));
        Ok(carts)
    }
}

/// Postgres-backed repository.
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    basket: String,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    id: Uuid,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
}

fn rehydrate(row: CartRow, item_rows: Vec<LineItemRow>) -> Result<Cart> {
    let items = item_rows
        .into_iter()
        .map(|r| {
            let quantity = Quantity::new(i64::from(r.quantity))?;
            Ok(LineItem::rehydrate(r.id, r.product_id, quantity))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Cart::rehydrate(
        row.id,
        items,
        row.basket,
        Money::new(row.total_price),
        row.created_at,
        row.updated_at,
    ))
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn create(&self, cart: &Cart) -> Result<()> {
        sqlx::query(
            "INSERT INTO carts (id, basket, total_price, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(cart.id())
        .bind(cart.basket())
        .bind(cart.total_price().amount())
        .bind(cart.created_at())
        .bind(cart.updated_at())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Cart> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, basket, total_price, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::CartNotFound)?;

        let item_rows = sqlx::query_as::<_, LineItemRow>(
            "SELECT id, cart_id, product_id, quantity FROM line_items \
             WHERE cart_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rehydrate(row, item_rows)
    }

    async fn save(&self, cart: &Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE carts SET basket = $2, total_price = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(cart.id())
        .bind(cart.basket())
        .bind(cart.total_price().amount())
        .bind(cart.updated_at())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(Error::CartNotFound);
        }

        // Line items are rewritten wholesale; carts are small and the
        // regenerated position column keeps insertion order.
        sqlx::query("DELETE FROM line_items WHERE cart_id = $1")
            .bind(cart.id())
            .execute(&mut *tx)
            .await?;
        for item in cart.items() {
            sqlx::query(
                "INSERT INTO line_items (id, cart_id, product_id, quantity) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(item.id())
            .bind(cart.id())
            .bind(item.product_id())
            .bind(item.quantity().value() as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::CartNotFound);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Cart>> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT id, basket, total_price, created_at, updated_at \
             FROM carts ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query_as::<_, LineItemRow>(
            "SELECT id, cart_id, product_id, quantity FROM line_items ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_cart: HashMap<Uuid, Vec<LineItemRow>> = HashMap::new();
        for item in item_rows {
            items_by_cart.entry(item.cart_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_cart.remove(&row.id).unwrap_or_default();
                rehydrate(row, items)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let repo = InMemoryCartRepository::new();
        let cart = Cart::new();
        repo.create(&cart).await.unwrap();

        let loaded = repo.load(cart.id()).await.unwrap();
        assert_eq!(loaded.id(), cart.id());
        assert_eq!(repo.count().await, 1);

        repo.delete(cart.id()).await.unwrap();
        assert!(matches!(
            repo.load(cart.id()).await,
            Err(Error::CartNotFound)
        ));
    }

    #[tokio::test]
    async fn test_save_requires_existing_cart() {
        let repo = InMemoryCartRepository::new();
        let cart = Cart::new();
        assert!(matches!(repo.save(&cart).await, Err(Error::CartNotFound)));
    }

    #[tokio::test]
    async fn test_delete_missing_cart_is_reported() {
        let repo = InMemoryCartRepository::new();
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(Error::CartNotFound)
        ));
    }
}
