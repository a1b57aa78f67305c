//! The set of products a user has marked as favorite.
//!
//! [FavoritesStore] owns the set and publishes every change through a
//! [tokio::sync::watch] channel, so any number of views can observe it
//! without holding a reference to the store.

use indexmap::IndexMap;
use storefront_catalog::types::{Product, ProductId};
use tokio::sync::watch;
use tracing::debug;

/// An insertion ordered snapshot of the favorites, keyed by product id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Favorites(IndexMap<ProductId, Product>);

impl Favorites {
    pub fn contains(&self, id: ProductId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.0.get(&id)
    }

    /// Products in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.0.values()
    }
}

impl<'a> IntoIterator for &'a Favorites {
    type IntoIter = indexmap::map::Values<'a, ProductId, Product>;
    type Item = &'a Product;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}

/// What a call to [FavoritesStore::toggle] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

/// The single owner of the favorites set.
///
/// Subscribers are only notified when the set actually changes.
#[derive(Debug)]
pub struct FavoritesStore {
    state: watch::Sender<Favorites>,
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Favorites::default());
        Self { state }
    }

    /// Remove `product` if it is a favorite, add it otherwise.
    pub fn toggle(&self, product: Product) -> Toggled {
        let mut toggled = Toggled::Added;
        self.state.send_modify(|favorites| {
            if favorites.0.shift_remove(&product.id).is_some() {
                toggled = Toggled::Removed;
            } else {
                favorites.0.insert(product.id, product);
            }
        });
        debug!(?toggled, count = self.len(), "toggled favorite");
        toggled
    }

    /// Returns whether `id` was a favorite.
    pub fn remove(&self, id: ProductId) -> bool {
        let removed = self
            .state
            .send_if_modified(|favorites| favorites.0.shift_remove(&id).is_some());
        if removed {
            debug!(%id, "removed favorite");
        }
        removed
    }

    pub fn clear(&self) {
        self.state.send_if_modified(|favorites| {
            let changed = !favorites.is_empty();
            favorites.0.clear();
            changed
        });
    }

    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.state.borrow().contains(id)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    pub fn snapshot(&self) -> Favorites {
        self.state.borrow().clone()
    }

    /// Watch the favorites. The current set is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<Favorites> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ids(favorites: &Favorites) -> Vec<u64> {
        favorites.iter().map(|product| product.id.get()).collect()
    }

    #[test]
    fn toggle_twice_restores_set() {
        let store = FavoritesStore::new();
        assert_eq!(store.toggle(Product::new(1, "a")), Toggled::Added);
        assert!(store.is_favorite(ProductId::from(1)));
        assert_eq!(store.toggle(Product::new(1, "a")), Toggled::Removed);
        assert!(!store.is_favorite(ProductId::from(1)));
        assert!(store.is_empty());
    }

    #[test]
    fn keeps_insertion_order() {
        let store = FavoritesStore::new();
        for id in [3, 1, 2] {
            store.toggle(Product::new(id, "p"));
        }
        store.toggle(Product::new(1, "p"));
        store.toggle(Product::new(1, "p"));

        assert_eq!(ids(&store.snapshot()), vec![3, 2, 1]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn stores_at_most_one_entry_per_id() {
        let store = FavoritesStore::new();
        store.toggle(Product::new(7, "first"));
        store.remove(ProductId::from(7));
        store.toggle(Product::new(7, "second"));

        let favorites = store.snapshot();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites.get(ProductId::from(7)).unwrap().title, "second");
    }

    #[test]
    fn subscribers_see_changes() {
        let store = FavoritesStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.toggle(Product::new(1, "a"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn noop_mutations_do_not_notify() {
        let store = FavoritesStore::new();
        let rx = store.subscribe();

        assert!(!store.remove(ProductId::from(1)));
        store.clear();
        assert!(!rx.has_changed().unwrap());
    }
}
