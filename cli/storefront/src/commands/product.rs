use anyhow::Result;
use bpaf::Bpaf;
use itertools::Itertools;
use storefront_catalog::ClientTrait;
use storefront_catalog::types::{Product, ProductDraft, ProductId};
use storefront_sdk::storefront::Storefront;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::utils::display::DisplayProduct;
use crate::utils::message;

/// Product fields settable from the command line
#[derive(Debug, Bpaf, Clone, Default)]
pub struct ProductFields {
    /// Name of the product
    #[bpaf(long, argument("title"))]
    pub title: Option<String>,

    /// Description of the product
    #[bpaf(long, argument("text"))]
    pub description: Option<String>,

    /// Price, must be greater than 0
    #[bpaf(long, argument("price"))]
    pub price: Option<f64>,

    /// Units in stock
    #[bpaf(long, argument("count"))]
    pub stock: Option<i64>,

    /// Brand of the product
    #[bpaf(long, argument("brand"))]
    pub brand: Option<String>,

    /// Category slug of the product
    #[bpaf(long, argument("slug"))]
    pub category: Option<String>,
}

/// A rule a product form violates
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FieldError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Description is required")]
    MissingDescription,
    #[error("Price must be greater than 0")]
    InvalidPrice,
    #[error("Stock must be 0 or greater")]
    InvalidStock,
    #[error("Category is required")]
    MissingCategory,
}

/// Every rule a product form violates
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid product: {}", .0.iter().join(", "))]
pub struct InvalidProductForm(pub Vec<FieldError>);

/// The complete set of editable product fields.
///
/// New products start from an empty form, edits start from the current
/// product. Either way the complete form is validated before anything is
/// sent to the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub brand: String,
    pub category: String,
}

impl ProductForm {
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: Some(product.price),
            stock: Some(product.stock.into()),
            brand: product.brand.clone().unwrap_or_default(),
            category: product.category.clone(),
        }
    }

    /// Overwrite the fields that were given on the command line
    pub fn apply(mut self, fields: ProductFields) -> Self {
        if let Some(title) = fields.title {
            self.title = title;
        }
        if let Some(description) = fields.description {
            self.description = description;
        }
        if fields.price.is_some() {
            self.price = fields.price;
        }
        if fields.stock.is_some() {
            self.stock = fields.stock;
        }
        if let Some(brand) = fields.brand {
            self.brand = brand;
        }
        if let Some(category) = fields.category {
            self.category = category;
        }
        self
    }

    pub fn validate(self) -> Result<ProductDraft, InvalidProductForm> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::MissingTitle);
        }
        let description = self.description.trim();
        if description.is_empty() {
            errors.push(FieldError::MissingDescription);
        }
        let price = self.price.filter(|price| *price > 0.0);
        if price.is_none() {
            errors.push(FieldError::InvalidPrice);
        }
        let stock = self.stock.and_then(|stock| u32::try_from(stock).ok());
        if stock.is_none() {
            errors.push(FieldError::InvalidStock);
        }
        let category = self.category.trim();
        if category.is_empty() {
            errors.push(FieldError::MissingCategory);
        }

        if !errors.is_empty() {
            return Err(InvalidProductForm(errors));
        }

        let brand = self.brand.trim();
        Ok(ProductDraft {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            price,
            stock,
            brand: (!brand.is_empty()).then(|| brand.to_string()),
            category: Some(category.to_string()),
        })
    }
}

// Add a product to the catalog
#[derive(Debug, Bpaf, Clone)]
pub struct Create {
    #[bpaf(external(product_fields))]
    pub fields: ProductFields,
}

impl Create {
    #[instrument(name = "create", skip_all)]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let draft = ProductForm::default().apply(self.fields).validate()?;
        debug!(?draft, "creating product");

        let product = storefront.client().create(&draft).await?;

        message::created(format!("Created product {}", product.id));
        println!("{}", DisplayProduct(&product));
        Ok(())
    }
}

// Change fields of an existing product
#[derive(Debug, Bpaf, Clone)]
pub struct Update {
    #[bpaf(external(product_fields))]
    pub fields: ProductFields,

    /// The id of the product to change
    #[bpaf(positional("id"))]
    pub id: ProductId,
}

impl Update {
    #[instrument(name = "update", skip_all, fields(id = %self.id))]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let client = storefront.client();
        let current = client.get_by_id(self.id).await?;

        let draft = ProductForm::from_product(&current)
            .apply(self.fields)
            .validate()?;
        debug!(?draft, "updating product");

        let product = client.update(self.id, &draft).await?;

        message::updated(format!("Updated product {}", product.id));
        println!("{}", DisplayProduct(&product));
        Ok(())
    }
}

// Remove a product from the catalog
#[derive(Debug, Bpaf, Clone)]
pub struct Delete {
    /// The id of the product to remove
    #[bpaf(positional("id"))]
    pub id: ProductId,
}

impl Delete {
    #[instrument(name = "delete", skip_all, fields(id = %self.id))]
    pub async fn handle(self, storefront: &Storefront<impl ClientTrait>) -> Result<()> {
        let deleted = storefront.client().delete(self.id).await?;

        // A deleted product can't stay a favorite
        storefront.favorites.remove(self.id);

        message::deleted(format!(
            "Deleted product {} '{}'",
            deleted.product.id, deleted.product.title
        ));
        Ok(())
    }
}
