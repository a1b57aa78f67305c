//# The storefront's client side domain model
pub mod catalog_query;
pub mod favorites;
pub mod pagination;
pub mod query;
