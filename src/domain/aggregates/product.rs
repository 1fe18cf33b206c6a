//! Product catalog record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Money;

/// A sellable product as the catalog collaborator exposes it.
///
/// Immutable from the cart engine's point of view. Line items reference
/// products by id rather than embedding them, so a catalog price change is
/// reflected the next time a subtotal is computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Short business code used for discount lookup, e.g. "GR1".
    pub code: String,
    pub name: String,
    /// Catalog unit price, non-negative with two fraction digits.
    pub price: Money,
}

impl Product {
    pub fn new(code: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            price,
        }
    }
}
