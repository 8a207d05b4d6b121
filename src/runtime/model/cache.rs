use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::runtime::value::Value;

use super::{ModelChangeListener, ModelRc};

/// Lazily cached view of a model, kept fresh by change notifications.
///
/// Invariant: when the row count is known, `rows.len()` equals it. A `None`
/// row has not been read since it last changed.
pub struct ModelCache {
    model: ModelRc,
    row_count: Cell<Option<usize>>,
    rows: RefCell<Vec<Option<Value>>>,
    fetches: Cell<usize>,
}

impl ModelCache {
    /// Create a cache and subscribe it to `model`.
    pub fn new(model: &ModelRc) -> Rc<ModelCache> {
        let cache = Rc::new(ModelCache {
            model: model.clone(),
            row_count: Cell::new(None),
            rows: RefCell::new(Vec::new()),
            fetches: Cell::new(0),
        });
        let listener: Weak<ModelCache> = Rc::downgrade(&cache);
        model.add_listener(listener);
        cache
    }

    pub fn model(&self) -> &ModelRc {
        &self.model
    }

    pub fn row_count(&self) -> usize {
        if let Some(count) = self.row_count.get() {
            return count;
        }
        let count = self.model.row_count();
        self.row_count.set(Some(count));
        *self.rows.borrow_mut() = vec![None; count];
        count
    }

    pub fn row_data(&self, row: usize) -> Option<Value> {
        if row >= self.row_count() {
            return None;
        }
        if let Some(Some(value)) = self.rows.borrow().get(row) {
            return Some(value.clone());
        }
        let value = self.model.row_data(row)?;
        self.fetches.set(self.fetches.get() + 1);
        if let Some(slot) = self.rows.borrow_mut().get_mut(row) {
            *slot = Some(value.clone());
        }
        Some(value)
    }

    pub fn rows(&self) -> Vec<Value> {
        (0..self.row_count())
            .map_while(|row| self.row_data(row))
            .collect()
    }

    /// Number of rows read from the model rather than from the cache.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl ModelChangeListener for ModelCache {
    fn row_added(&self, index: usize, count: usize) {
        let Some(known) = self.row_count.get() else {
            return;
        };
        let mut rows = self.rows.borrow_mut();
        let index = index.min(rows.len());
        rows.splice(index..index, std::iter::repeat_n(None, count));
        self.row_count.set(Some(known + count));
    }

    fn row_changed(&self, row: usize) {
        if let Some(slot) = self.rows.borrow_mut().get_mut(row) {
            *slot = None;
        }
    }

    fn row_removed(&self, index: usize, count: usize) {
        if self.row_count.get().is_none() {
            return;
        }
        let mut rows = self.rows.borrow_mut();
        let start = index.min(rows.len());
        let end = index.saturating_add(count).min(rows.len());
        rows.drain(start..end);
        self.row_count.set(Some(rows.len()));
    }

    fn reset(&self) {
        self.row_count.set(None);
        self.rows.borrow_mut().clear();
    }
}
