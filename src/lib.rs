//! Cartwheel, a shopping-cart pricing service.
//!
//! Given a mutable collection of product line items, the engine computes a
//! per-line discounted price, a cart-level total, and a human-readable
//! basket summary string, recomputed after every mutation.
//!
//! ## Layout
//! - [`domain`] holds the pricing core: value objects, discount rules and
//!   the cart aggregate. It performs no I/O and is fully testable with
//!   plain fixtures.
//! - [`catalog`] and [`repository`] are the collaborator seams (product
//!   lookup and cart persistence), each with an in-memory and a Postgres
//!   implementation.
//! - [`service`] ties one catalog and one repository together and owns the
//!   load → mutate → recompute → save cycle.
//! - [`api`] is the HTTP surface consumed by a JSON client.

pub mod api;
pub mod catalog;
pub mod domain;
pub mod repository;
pub mod service;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors surfaced by the cart engine and its collaborators.
///
/// The engine never swallows these; the API layer translates each kind to
/// an HTTP status. `NotFound` outcomes are reported to the caller as
/// normal results, never a crash.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cart not found")]
    CartNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Product not found in cart")]
    LineItemNotFound,

    /// A negative quantity reached a constructor or update. Contract
    /// violation: rejected before mutation, never silently clamped.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
