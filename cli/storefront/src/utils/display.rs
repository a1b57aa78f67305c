use std::fmt::{self, Display, Write};

use itertools::Itertools;
use storefront_catalog::types::{Product, category_display_name};
use storefront_sdk::models::favorites::Favorites;
use storefront_sdk::models::pagination::PageControls;

const FAVORITE_MARKER: char = '♥';

pub(crate) fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// A table-ish listing of products, one per line.
///
/// Favorites are marked if a [Favorites] snapshot is given.
pub(crate) struct DisplayProducts<'a> {
    products: &'a [Product],
    favorites: Option<&'a Favorites>,
}

impl<'a> DisplayProducts<'a> {
    pub(crate) fn new(products: &'a [Product]) -> Self {
        Self {
            products,
            favorites: None,
        }
    }

    pub(crate) fn with_favorites(mut self, favorites: &'a Favorites) -> Self {
        self.favorites = Some(favorites);
        self
    }
}

impl Display for DisplayProducts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id_width = self
            .products
            .iter()
            .map(|p| p.id.to_string().len())
            .max()
            .unwrap_or_default();
        let title_width = self
            .products
            .iter()
            .map(|p| p.title.chars().count())
            .max()
            .unwrap_or_default();

        let mut products = self.products.iter().peekable();
        while let Some(product) = products.next() {
            let marker = match self.favorites {
                Some(favorites) if favorites.contains(product.id) => FAVORITE_MARKER,
                _ => ' ',
            };
            write!(
                f,
                "{marker} {id:>id_width$}  {title:<title_width$}  {price:>10}",
                id = product.id,
                title = product.title,
                price = format_price(product.price),
            )?;
            if !product.category.is_empty() {
                write!(f, "  {}", category_display_name(&product.category))?;
            }
            if !product.is_in_stock() {
                write!(f, "  (out of stock)")?;
            }
            // Only print a newline if there are more items to print
            if products.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// All known details of a single product.
pub(crate) struct DisplayProduct<'a>(pub &'a Product);

impl Display for DisplayProduct<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let product = self.0;

        writeln!(f, "{} (#{})", product.title, product.id)?;

        let mut price = format_price(product.price);
        if let Some(discount) = product.discount_percentage.filter(|d| *d > 0.0) {
            write!(price, " ({discount:.0}% off)")?;
        }

        let mut fields = vec![("Price", price)];
        if !product.category.is_empty() {
            fields.push(("Category", category_display_name(&product.category)));
        }
        if let Some(brand) = &product.brand {
            fields.push(("Brand", brand.clone()));
        }
        fields.push((
            "Rating",
            format!(
                "{:.1} ({} reviews)",
                product.rating,
                product.review_count()
            ),
        ));
        fields.push(("Stock", match product.availability_status.as_deref() {
            Some(status) => format!("{} ({status})", product.stock),
            None => product.stock.to_string(),
        }));
        if !product.tags.is_empty() {
            fields.push(("Tags", product.tags.iter().join(", ")));
        }
        if let Some(sku) = &product.sku {
            fields.push(("SKU", sku.clone()));
        }
        if let Some(warranty) = &product.warranty_information {
            fields.push(("Warranty", warranty.clone()));
        }
        if let Some(shipping) = &product.shipping_information {
            fields.push(("Shipping", shipping.clone()));
        }
        if let Some(return_policy) = &product.return_policy {
            fields.push(("Returns", return_policy.clone()));
        }

        let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or_default();
        for (label, value) in fields {
            writeln!(f, "  {label:<width$}  {value}")?;
        }

        if !product.description.is_empty() {
            writeln!(f)?;
            write!(f, "{}", product.description)?;
        }
        Ok(())
    }
}

/// Page navigation, e.g. `‹ 1 [2] 3 4 5 ›  page 2 of 10`
pub(crate) struct DisplayPageControls<'a>(pub &'a PageControls);

impl Display for DisplayPageControls<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let controls = self.0;
        let current = controls.current_page.get();

        let pages = controls
            .window
            .iter()
            .map(|page| {
                if *page == current {
                    format!("[{page}]")
                } else {
                    page.to_string()
                }
            })
            .join(" ");

        let previous = if controls.has_previous { '‹' } else { ' ' };
        let next = if controls.has_next { '›' } else { ' ' };
        write!(
            f,
            "{previous} {pages} {next}  page {current} of {total}",
            total = controls.total_pages
        )?;
        if !controls.enabled {
            write!(f, " (loading)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use pretty_assertions::assert_eq;
    use storefront_sdk::models::favorites::FavoritesStore;

    use super::*;

    fn product(id: u64, title: &str, price: f64, stock: u32) -> Product {
        Product {
            price,
            stock,
            category: "home-decoration".to_string(),
            ..Product::new(id, title)
        }
    }

    #[test]
    fn products_are_aligned_and_marked() {
        let products = vec![
            product(1, "Lamp", 12.5, 3),
            product(12, "Armchair", 249.0, 0),
        ];
        let store = FavoritesStore::new();
        store.toggle(products[1].clone());
        let favorites = store.snapshot();

        let rendered = DisplayProducts::new(&products)
            .with_favorites(&favorites)
            .to_string();
        assert_eq!(
            rendered,
            [
                "   1  Lamp          $12.50  home decoration",
                "♥ 12  Armchair     $249.00  home decoration  (out of stock)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn page_controls_highlight_current_page() {
        let controls = PageControls::new(
            120,
            NonZeroU32::new(12).unwrap(),
            NonZeroU32::new(2).unwrap(),
            false,
        );
        assert_eq!(
            DisplayPageControls(&controls).to_string(),
            "‹ 1 [2] 3 4 5 ›  page 2 of 10"
        );
    }

    #[test]
    fn page_controls_at_last_page_while_loading() {
        let controls = PageControls::new(
            30,
            NonZeroU32::new(12).unwrap(),
            NonZeroU32::new(3).unwrap(),
            true,
        );
        assert_eq!(
            DisplayPageControls(&controls).to_string(),
            "‹ 1 2 [3]    page 3 of 3 (loading)"
        );
    }

    #[test]
    fn details_show_discount_and_reviews() {
        let product = Product {
            discount_percentage: Some(12.4),
            brand: Some("Lumen".to_string()),
            description: "A small lamp.".to_string(),
            ..product(1, "Lamp", 12.5, 3)
        };
        let rendered = DisplayProduct(&product).to_string();
        assert!(rendered.starts_with("Lamp (#1)\n"), "{rendered}");
        assert!(rendered.contains("$12.50 (12% off)"), "{rendered}");
        assert!(rendered.contains("Brand     Lumen"), "{rendered}");
        assert!(rendered.contains("0.0 (0 reviews)"), "{rendered}");
        assert!(rendered.ends_with("\nA small lamp."), "{rendered}");
    }
}
