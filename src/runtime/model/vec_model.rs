use std::cell::RefCell;

use crate::runtime::value::Value;

use super::{Model, ModelPeer};

/// Growable host-side model. Every mutation is applied before it is reported.
#[derive(Default)]
pub struct VecModel {
    rows: RefCell<Vec<Value>>,
    peer: RefCell<ModelPeer>,
}

impl VecModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    pub fn push(&self, value: Value) {
        let index = {
            let mut rows = self.rows.borrow_mut();
            rows.push(value);
            rows.len() - 1
        };
        self.peer.borrow().row_added(index, 1);
    }

    /// Panics if `index > len`, like `Vec::insert`.
    pub fn insert(&self, index: usize, value: Value) {
        self.rows.borrow_mut().insert(index, value);
        self.peer.borrow().row_added(index, 1);
    }

    /// `None` when `index` is out of range.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let removed = {
            let mut rows = self.rows.borrow_mut();
            (index < rows.len()).then(|| rows.remove(index))
        };
        if removed.is_some() {
            self.peer.borrow().row_removed(index, 1);
        }
        removed
    }

    /// Replace every row.
    pub fn set_vec(&self, rows: Vec<Value>) {
        *self.rows.borrow_mut() = rows;
        self.peer.borrow().reset();
    }

    pub fn extend(&self, values: impl IntoIterator<Item = Value>) {
        let (index, count) = {
            let mut rows = self.rows.borrow_mut();
            let index = rows.len();
            rows.extend(values);
            (index, rows.len() - index)
        };
        if count > 0 {
            self.peer.borrow().row_added(index, count);
        }
    }

    pub fn clear(&self) {
        let count = std::mem::take(&mut *self.rows.borrow_mut()).len();
        if count > 0 {
            self.peer.borrow().row_removed(0, count);
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.rows.borrow().clone()
    }
}

impl From<Vec<Value>> for VecModel {
    fn from(rows: Vec<Value>) -> Self {
        Self {
            rows: RefCell::new(rows),
            peer: RefCell::default(),
        }
    }
}

impl Model for VecModel {
    fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    fn row_data(&self, row: usize) -> Option<Value> {
        self.rows.borrow().get(row).cloned()
    }

    fn set_row_data(&self, row: usize, data: Value) {
        let applied = match self.rows.borrow_mut().get_mut(row) {
            Some(slot) => {
                *slot = data;
                true
            }
            None => false,
        };
        if applied {
            self.peer.borrow().row_changed(row);
        }
    }

    fn attach_peer(&self, peer: ModelPeer) {
        *self.peer.borrow_mut() = peer;
    }
}
