//! Catalog-backed resolvers.

pub use keel_di_extras::*;
