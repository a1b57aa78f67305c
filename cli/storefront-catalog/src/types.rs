//! Catalog interaction types.
//!
//! These types mirror the catalog service's JSON documents. Products are
//! treated as immutable snapshots: an update from the service replaces the
//! whole value rather than patching it.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Externally assigned, stable product identity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A customer review attached to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_email: Option<String>,
}

/// A product snapshot as received from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_policy: Option<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// A minimal product, mostly useful for tests and mock data.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id: ProductId(id),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            price: 0.0,
            discount_percentage: None,
            rating: 0.0,
            stock: 0,
            tags: Vec::new(),
            brand: None,
            sku: None,
            warranty_information: None,
            shipping_information: None,
            availability_status: None,
            return_policy: None,
            reviews: Vec::new(),
            thumbnail: None,
            images: Vec::new(),
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }
}

/// Partial product fields sent when creating or updating a product.
///
/// Unset fields are left out of the request body entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductDraft {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Acknowledgement returned when a product is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub deleted_on: Option<String>,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A category as listed by the catalog's full category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Human readable label for a category slug, e.g. `home-decoration` becomes
/// `home decoration`.
pub fn category_display_name(slug: &str) -> String {
    slug.replace('-', " ")
}

// ---------------------------------------------------------------------------
// Result pages
// ---------------------------------------------------------------------------

/// One page of products together with the size of the full result set.
///
/// `items` never holds more than `page_size` products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UncheckedResultPage")]
pub struct ResultPage {
    items: Vec<Product>,
    total: u64,
    page_size: NonZeroU32,
}

impl ResultPage {
    pub fn new(mut items: Vec<Product>, total: u64, page_size: NonZeroU32) -> Self {
        let max_items = page_size.get() as usize;
        if items.len() > max_items {
            tracing::debug!(
                received = items.len(),
                page_size = max_items,
                "truncating oversized result page"
            );
            items.truncate(max_items);
        }
        Self {
            items,
            total,
            page_size,
        }
    }

    pub fn empty(page_size: NonZeroU32) -> Self {
        Self::new(Vec::new(), 0, page_size)
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Product> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Deserialize)]
struct UncheckedResultPage {
    items: Vec<Product>,
    total: u64,
    page_size: NonZeroU32,
}

impl From<UncheckedResultPage> for ResultPage {
    fn from(page: UncheckedResultPage) -> Self {
        ResultPage::new(page.items, page.total, page.page_size)
    }
}

/// The list document returned by the listing and search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProductList {
    pub(crate) products: Vec<Product>,
    #[serde(default)]
    pub(crate) total: u64,
}
