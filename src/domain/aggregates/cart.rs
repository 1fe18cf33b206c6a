//! Cart aggregate: line items, totals and the basket summary.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Product;
use crate::domain::pricing::DiscountRule;
use crate::domain::value_objects::{Money, Quantity};
use crate::{Error, Result};

/// The catalog entries a cart's computations need, keyed by product id.
///
/// The service layer builds one per operation; the aggregate itself never
/// talks to the catalog.
pub type ProductSnapshot = HashMap<Uuid, Product>;

/// One (product, quantity) pairing within a cart.
///
/// Subtotals are pure and recomputed on every read from the current
/// catalog price and quantity; nothing is cached here.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    id: Uuid,
    product_id: Uuid,
    quantity: Quantity,
}

impl LineItem {
    fn new(product_id: Uuid, quantity: Quantity) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            quantity,
        }
    }

    pub(crate) fn rehydrate(id: Uuid, product_id: Uuid, quantity: Quantity) -> Self {
        Self {
            id,
            product_id,
            quantity,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn product_id(&self) -> Uuid {
        self.product_id
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Plain subtotal: unit price times quantity, rounded to two digits.
    pub fn subtotal(&self, product: &Product) -> Money {
        product.price.times(self.quantity.value())
    }

    /// Subtotal after the product's discount rule, if it has one.
    pub fn discounted_subtotal(&self, product: &Product) -> Money {
        match DiscountRule::for_code(&product.code) {
            Some(rule) => rule.apply(product.price, self.quantity),
            None => self.subtotal(product),
        }
    }
}

/// A cart owning its line items in insertion order.
///
/// `basket` and `total_price` are caches over the live line items: they
/// must be refreshed with [`Cart::recompute_totals`] after every mutation
/// and before the cart is persisted or shown. A cart holds at most one
/// line item per distinct product, and never one with quantity zero.
#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    items: Vec<LineItem>,
    basket: String,
    total_price: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            items: vec![],
            basket: String::new(),
            total_price: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn rehydrate(
        id: Uuid,
        items: Vec<LineItem>,
        basket: String,
        total_price: Money,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            items,
            basket,
            total_price,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn basket(&self) -> &str {
        &self.basket
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `quantity` units of a product: increments the existing line
    /// item if one matches, otherwise appends a new one. Adding zero
    /// units never creates a line item.
    pub fn add_product(&mut self, product_id: Uuid, quantity: Quantity) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing.quantity.add(quantity);
        } else if !quantity.is_zero() {
            self.items.push(LineItem::new(product_id, quantity));
        }
    }

    /// Removes the line item for a product. `LineItemNotFound` when no
    /// line matches; the items are left untouched in that case.
    pub fn remove_product(&mut self, product_id: Uuid) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(Error::LineItemNotFound);
        }
        Ok(())
    }

    /// Sets the quantity of a product's line item to `quantity` exactly
    /// (absolute set, not a delta). Zero or below removes the line item.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i64) -> Result<()> {
        let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) else {
            return Err(Error::LineItemNotFound);
        };
        if quantity <= 0 {
            self.items.retain(|i| i.product_id != product_id);
            return Ok(());
        }
        item.quantity = Quantity::new(quantity)?;
        Ok(())
    }

    /// Live cart total: the sum of the already-rounded per-line discounted
    /// subtotals. The sum itself is not rounded again.
    pub fn calculated_total_price(&self, products: &ProductSnapshot) -> Result<Money> {
        self.items
            .iter()
            .map(|item| {
                let product = products.get(&item.product_id).ok_or(Error::ProductNotFound)?;
                Ok(item.discounted_subtotal(product))
            })
            .sum()
    }

    fn basket_string(&self, products: &ProductSnapshot) -> Result<String> {
        let parts = self
            .items
            .iter()
            .map(|item| {
                let product = products.get(&item.product_id).ok_or(Error::ProductNotFound)?;
                Ok(format!("{} x {}", product.code, item.quantity))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(","))
    }

    /// Refreshes the cached total and basket from the live line items.
    /// Idempotent: calling it twice without an intervening mutation yields
    /// the same total and basket.
    pub fn recompute_totals(&mut self, products: &ProductSnapshot) -> Result<()> {
        self.total_price = self.calculated_total_price(products)?;
        self.basket = self.basket_string(products)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Detailed cart view, derived at read time and never stored.
    pub fn view(&self, products: &ProductSnapshot) -> Result<CartView> {
        let line_items = self
            .items
            .iter()
            .map(|item| {
                let product = products.get(&item.product_id).ok_or(Error::ProductNotFound)?;
                Ok(LineItemView {
                    id: item.id,
                    product_id: item.product_id,
                    product_code: product.code.clone(),
                    product_name: product.name.clone(),
                    quantity: item.quantity.value(),
                    unit_price: product.price,
                    subtotal: item.subtotal(product),
                    discounted_subtotal: item.discounted_subtotal(product),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CartView {
            id: self.id,
            basket: self.basket.clone(),
            total_price: self.total_price,
            calculated_total_price: self.calculated_total_price(products)?,
            line_items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable cart view: the stored fields plus the live-computed total
/// and the detailed line items.
#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    pub id: Uuid,
    pub basket: String,
    pub total_price: Money,
    pub calculated_total_price: Money,
    pub line_items: Vec<LineItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LineItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
    pub discounted_subtotal: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn fixtures() -> (ProductSnapshot, Product, Product, Product) {
        let green_tea = Product::new("GR1", "Green Tea", Money::from_minor(311));
        let strawberries = Product::new("SR1", "Strawberries", Money::from_minor(500));
        let coffee = Product::new("CF1", "Coffee", Money::from_minor(1123));
        let snapshot = [&green_tea, &strawberries, &coffee]
            .into_iter()
            .map(|p| (p.id, p.clone()))
            .collect();
        (snapshot, green_tea, strawberries, coffee)
    }

    #[test]
    fn test_line_item_subtotals() {
        let (_, green_tea, ..) = fixtures();
        let item = LineItem::new(green_tea.id, qty(3));

        assert_eq!(item.subtotal(&green_tea), Money::from_minor(933));
        // BOGO: pay for 2 of 3
        assert_eq!(item.discounted_subtotal(&green_tea), Money::from_minor(622));
    }

    #[test]
    fn test_no_rule_means_plain_subtotal() {
        let widget = Product::new("WD1", "Widget", Money::from_minor(250));
        let item = LineItem::new(widget.id, qty(4));

        assert_eq!(item.discounted_subtotal(&widget), item.subtotal(&widget));
    }

    #[test]
    fn test_add_merges_existing_product() {
        let (snapshot, green_tea, ..) = fixtures();
        let mut cart = Cart::new();

        cart.add_product(green_tea.id, qty(2));
        cart.add_product(green_tea.id, qty(1));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity().value(), 3);

        cart.recompute_totals(&snapshot).unwrap();
        assert_eq!(cart.basket(), "GR1 x 3");
    }

    #[test]
    fn test_add_zero_units_creates_no_line_item() {
        let (snapshot, green_tea, ..) = fixtures();
        let mut cart = Cart::new();

        cart.add_product(green_tea.id, qty(0));
        cart.recompute_totals(&snapshot).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.basket(), "");

        // Merging zero units into an existing line leaves it unchanged
        cart.add_product(green_tea.id, qty(2));
        cart.add_product(green_tea.id, qty(0));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity().value(), 2);
    }

    #[test]
    fn test_total_sums_discounted_subtotals() {
        let (snapshot, green_tea, strawberries, coffee) = fixtures();
        let mut cart = Cart::new();

        cart.add_product(green_tea.id, qty(3));
        cart.add_product(strawberries.id, qty(1));
        cart.add_product(coffee.id, qty(1));
        cart.recompute_totals(&snapshot).unwrap();

        // 6.22 + 5.00 + 11.23
        assert_eq!(cart.total_price(), Money::from_minor(2245));
        assert_eq!(
            cart.calculated_total_price(&snapshot).unwrap(),
            Money::from_minor(2245)
        );
    }

    #[test]
    fn test_basket_insertion_order() {
        let (snapshot, green_tea, strawberries, _) = fixtures();
        let mut cart = Cart::new();

        cart.recompute_totals(&snapshot).unwrap();
        assert_eq!(cart.basket(), "");

        cart.add_product(green_tea.id, qty(2));
        cart.recompute_totals(&snapshot).unwrap();
        assert_eq!(cart.basket(), "GR1 x 2");

        cart.add_product(strawberries.id, qty(3));
        cart.recompute_totals(&snapshot).unwrap();
        assert_eq!(cart.basket(), "GR1 x 2,SR1 x 3");
    }

    #[test]
    fn test_set_quantity_zero_removes_like_remove_product() {
        let (snapshot, green_tea, ..) = fixtures();

        let mut by_zero = Cart::new();
        by_zero.add_product(green_tea.id, qty(2));
        by_zero.set_quantity(green_tea.id, 0).unwrap();
        by_zero.recompute_totals(&snapshot).unwrap();

        let mut by_remove = Cart::new();
        by_remove.add_product(green_tea.id, qty(2));
        by_remove.remove_product(green_tea.id).unwrap();
        by_remove.recompute_totals(&snapshot).unwrap();

        for cart in [&by_zero, &by_remove] {
            assert!(cart.is_empty());
            assert_eq!(cart.basket(), "");
            assert_eq!(cart.total_price(), Money::ZERO);
        }
    }

    #[test]
    fn test_set_quantity_is_absolute() {
        let (snapshot, green_tea, ..) = fixtures();
        let mut cart = Cart::new();

        cart.add_product(green_tea.id, qty(2));
        cart.set_quantity(green_tea.id, 5).unwrap();
        cart.recompute_totals(&snapshot).unwrap();

        assert_eq!(cart.items()[0].quantity().value(), 5);
        assert_eq!(cart.basket(), "GR1 x 5");
    }

    #[test]
    fn test_missing_line_item_is_reported_not_mutated() {
        let (_, green_tea, strawberries, _) = fixtures();
        let mut cart = Cart::new();
        cart.add_product(green_tea.id, qty(2));

        assert!(matches!(
            cart.remove_product(strawberries.id),
            Err(Error::LineItemNotFound)
        ));
        assert!(matches!(
            cart.set_quantity(strawberries.id, 4),
            Err(Error::LineItemNotFound)
        ));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity().value(), 2);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let (snapshot, green_tea, strawberries, _) = fixtures();
        let mut cart = Cart::new();
        cart.add_product(green_tea.id, qty(2));
        cart.add_product(strawberries.id, qty(3));

        cart.recompute_totals(&snapshot).unwrap();
        let total = cart.total_price();
        let basket = cart.basket().to_string();

        cart.recompute_totals(&snapshot).unwrap();
        assert_eq!(cart.total_price(), total);
        assert_eq!(cart.basket(), basket);
    }

    #[test]
    fn test_view_details() {
        let (snapshot, green_tea, ..) = fixtures();
        let mut cart = Cart::new();
        cart.add_product(green_tea.id, qty(2));
        cart.recompute_totals(&snapshot).unwrap();

        let view = cart.view(&snapshot).unwrap();
        assert_eq!(view.basket, "GR1 x 2");
        assert_eq!(view.total_price, view.calculated_total_price);
        assert_eq!(view.line_items.len(), 1);

        let line = &view.line_items[0];
        assert_eq!(line.product_code, "GR1");
        assert_eq!(line.product_name, "Green Tea");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Money::from_minor(311));
        assert_eq!(line.subtotal, Money::from_minor(622));
        assert_eq!(line.discounted_subtotal, Money::from_minor(311));
    }
}
