//! Aggregates module

pub mod cart;
pub mod product;

pub use cart::{Cart, CartView, LineItem, LineItemView, ProductSnapshot};
pub use product::Product;
