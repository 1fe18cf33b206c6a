//! Domain model: value objects, discount rules and the cart aggregate.
//!
//! Nothing in this tree does I/O; catalog lookups happen in the service
//! layer and computations receive a snapshot of the products they need.

pub mod aggregates;
pub mod pricing;
pub mod value_objects;
