use std::cmp::Ordering;

/// Ordered in-memory list shared by the list-backed stores
#[derive(Debug, Clone)]
pub struct ListStore<T> {
    items: Vec<T>,
}

impl<T> Default for ListStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> ListStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn insert(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn insert_bulk<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.items.extend(items);
    }

    /// Stable sort: equal elements keep their current relative order
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.items.sort_by(compare);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
