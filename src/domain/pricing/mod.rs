//! Discount rules keyed by product code.
//!
//! Each rule is a pure function of `(unit_price, quantity)`. The set is a
//! closed sum type: adding a promotion means adding a variant and a line
//! in [`DiscountRule::for_code`], call sites stay untouched.

use crate::domain::value_objects::{Money, Quantity};

/// Quantity a threshold rule starts applying at.
const BULK_THRESHOLD: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscountRule {
    /// Every second unit is free: pay for `ceil(quantity / 2)` units.
    BuyOneGetOneFree,

    /// Once `min_quantity` is reached, every unit is charged at
    /// `flat_unit_price` instead of the catalog price. The flat price is a
    /// rule-local constant, not derived from the catalog.
    ThresholdFlatPrice {
        min_quantity: u32,
        flat_unit_price: Money,
    },
}

impl DiscountRule {
    /// Resolves the discount rule for a product code, if it has one.
    pub fn for_code(code: &str) -> Option<DiscountRule> {
        match code {
            "GR1" => Some(DiscountRule::BuyOneGetOneFree),
            "SR1" => Some(DiscountRule::ThresholdFlatPrice {
                min_quantity: BULK_THRESHOLD,
                flat_unit_price: Money::from_minor(450),
            }),
            "CF1" => Some(DiscountRule::ThresholdFlatPrice {
                min_quantity: BULK_THRESHOLD,
                flat_unit_price: Money::from_minor(749),
            }),
            _ => None,
        }
    }

    /// Discounted subtotal for `quantity` units at `unit_price`, rounded
    /// to two fraction digits at the point it is produced.
    pub fn apply(&self, unit_price: Money, quantity: Quantity) -> Money {
        match *self {
            DiscountRule::BuyOneGetOneFree => {
                // Ceiling division phrased to stay in range at u32::MAX
                let payable = quantity.value() / 2 + quantity.value() % 2;
                unit_price.times(payable)
            }
            DiscountRule::ThresholdFlatPrice {
                min_quantity,
                flat_unit_price,
            } => {
                if quantity.value() >= min_quantity {
                    flat_unit_price.times(quantity.value())
                } else {
                    unit_price.times(quantity.value())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_unknown_code_has_no_rule() {
        assert_eq!(DiscountRule::for_code("XX1"), None);
        assert_eq!(DiscountRule::for_code(""), None);
    }

    #[test]
    fn test_buy_one_get_one_free() {
        let rule = DiscountRule::for_code("GR1").unwrap();
        let price = Money::from_minor(311);

        assert_eq!(rule.apply(price, qty(1)), Money::from_minor(311));
        assert_eq!(rule.apply(price, qty(2)), Money::from_minor(311));
        assert_eq!(rule.apply(price, qty(3)), Money::from_minor(622));
        assert_eq!(rule.apply(price, qty(4)), Money::from_minor(622));
        assert_eq!(rule.apply(price, qty(0)), Money::ZERO);
    }

    #[test]
    fn test_buy_one_get_one_free_at_max_quantity() {
        let rule = DiscountRule::for_code("GR1").unwrap();
        let price = Money::from_minor(311);
        let quantity = qty(i64::from(u32::MAX));

        assert_eq!(rule.apply(price, quantity), price.times(u32::MAX / 2 + 1));
    }

    #[test]
    fn test_threshold_below_minimum_charges_catalog_price() {
        let rule = DiscountRule::for_code("SR1").unwrap();
        let price = Money::from_minor(500);

        assert_eq!(rule.apply(price, qty(1)), Money::from_minor(500));
        assert_eq!(rule.apply(price, qty(2)), Money::from_minor(1000));
    }

    #[test]
    fn test_threshold_strawberries() {
        let rule = DiscountRule::for_code("SR1").unwrap();
        let price = Money::from_minor(500);

        // 3 * 4.50
        assert_eq!(rule.apply(price, qty(3)), Money::from_minor(1350));
        assert_eq!(rule.apply(price, qty(5)), Money::from_minor(2250));
    }

    #[test]
    fn test_threshold_coffee() {
        let rule = DiscountRule::for_code("CF1").unwrap();
        let price = Money::from_minor(1123);

        // 3 * 7.49
        assert_eq!(rule.apply(price, qty(3)), Money::from_minor(2247));
        assert_eq!(rule.apply(price, qty(2)), Money::from_minor(2246));
    }
}
