pub mod models;
pub mod storefront;

pub use storefront_catalog as catalog;
