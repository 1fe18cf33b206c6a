//! Cart service: the load → mutate → recompute → save cycle.

use std::sync::Arc;

use uuid::Uuid;

use crate::catalog::Catalog;
use crate::domain::aggregates::{Cart, CartView, Product, ProductSnapshot};
use crate::domain::value_objects::Quantity;
use crate::repository::CartRepository;
use crate::Result;

/// Orchestrates cart operations over one catalog and one repository.
///
/// Every mutation ends with a recompute of the cached basket and total
/// before the cart is saved, so the stored fields can never be read
/// stale. All operations return the full recomputed cart view.
#[derive(Clone)]
pub struct CartService {
    catalog: Arc<dyn Catalog>,
    carts: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(catalog: Arc<dyn Catalog>, carts: Arc<dyn CartRepository>) -> Self {
        Self { catalog, carts }
    }

    pub async fn create_cart(&self) -> Result<CartView> {
        let cart = Cart::new();
        self.carts.create(&cart).await?;
        tracing::info!(cart_id = %cart.id(), "cart created");
        cart.view(&ProductSnapshot::new())
    }

    pub async fn cart(&self, id: Uuid) -> Result<CartView> {
        let cart = self.carts.load(id).await?;
        let products = self.snapshot_for(&cart).await?;
        cart.view(&products)
    }

    pub async fn list_carts(&self) -> Result<Vec<CartView>> {
        let mut views = vec![];
        for cart in self.carts.list().await? {
            let products = self.snapshot_for(&cart).await?;
            views.push(cart.view(&products)?);
        }
        Ok(views)
    }

    /// Adds `quantity` units of a catalog product to the cart, merging
    /// into an existing line item when one matches.
    pub async fn add_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartView> {
        let mut cart = self.carts.load(cart_id).await?;
        let product = self.catalog.lookup(product_id).await?;
        cart.add_product(product.id, quantity);
        self.finish_mutation(cart).await
    }

    pub async fn remove_product(&self, cart_id: Uuid, product_id: Uuid) -> Result<CartView> {
        let mut cart = self.carts.load(cart_id).await?;
        cart.remove_product(product_id)?;
        self.finish_mutation(cart).await
    }

    /// Sets a line item's quantity exactly; zero or below removes it.
    pub async fn set_quantity(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<CartView> {
        let mut cart = self.carts.load(cart_id).await?;
        cart.set_quantity(product_id, quantity)?;
        self.finish_mutation(cart).await
    }

    pub async fn delete_cart(&self, id: Uuid) -> Result<()> {
        self.carts.delete(id).await?;
        tracing::info!(cart_id = %id, "cart destroyed");
        Ok(())
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        self.catalog.list().await
    }

    async fn finish_mutation(&self, mut cart: Cart) -> Result<CartView> {
        let products = self.snapshot_for(&cart).await?;
        cart.recompute_totals(&products)?;
        self.carts.save(&cart).await?;
        tracing::debug!(
            cart_id = %cart.id(),
            total = %cart.total_price(),
            basket = %cart.basket(),
            "cart totals recomputed"
        );
        cart.view(&products)
    }

    async fn snapshot_for(&self, cart: &Cart) -> Result<ProductSnapshot> {
        let ids: Vec<Uuid> = cart.items().iter().map(|i| i.product_id()).collect();
        self.catalog.snapshot(&ids).await
    }
}
