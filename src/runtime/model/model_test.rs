use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::runtime::{leak_detector, value::Value};

use super::*;

/// Read-only model that records its peer and lets tests mutate rows silently.
#[derive(Default)]
struct HostList {
    rows: RefCell<Vec<Value>>,
    peer: RefCell<ModelPeer>,
    writes: Cell<usize>,
}

impl Model for HostList {
    fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    fn row_data(&self, row: usize) -> Option<Value> {
        self.rows.borrow().get(row).cloned()
    }

    fn attach_peer(&self, peer: ModelPeer) {
        *self.peer.borrow_mut() = peer;
    }
}

fn numbers(values: &[i32]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

#[test]
fn out_of_range_rows_are_absent() {
    let model = ModelRc::new(VecModel::from(numbers(&[1, 2])));
    assert_eq!(model.row_count(), 2);
    assert_eq!(model.row_data(1), Some(Value::from(2)));
    assert_eq!(model.row_data(2), None);
}

#[test]
fn writes_to_read_only_models_are_ignored() {
    let host = Rc::new(HostList::default());
    host.rows.borrow_mut().push(Value::from(1));
    let model = ModelAdapter::new(host.clone());
    model.set_row_data(0, Value::from(5));
    assert_eq!(model.row_data(0), Some(Value::from(1)));
    assert_eq!(host.writes.get(), 0);
}

#[test]
fn teardown_runs_once_and_detaches_the_peer() {
    let before = leak_detector::snapshot();
    let host = Rc::new(HostList::default());
    let model = ModelAdapter::new(host.clone());
    let copy = model.clone();
    assert!(host.peer.borrow().is_attached());

    drop(model);
    assert!(host.peer.borrow().is_attached());
    drop(copy);
    assert!(!host.peer.borrow().is_attached());

    let after = leak_detector::snapshot();
    assert_eq!(after.adapters_created - before.adapters_created, 1);
    assert_eq!(after.adapters_torn_down - before.adapters_torn_down, 1);
    assert_eq!(Rc::strong_count(&host), 1);

    // An inert peer swallows notifications.
    host.peer.borrow().reset();
}

#[test]
fn cache_reads_each_row_once() {
    let model = ModelRc::new(VecModel::from(numbers(&[1, 2, 3])));
    let cache = ModelCache::new(&model);
    assert_eq!(cache.rows(), numbers(&[1, 2, 3]));
    assert_eq!(cache.rows(), numbers(&[1, 2, 3]));
    assert_eq!(cache.fetch_count(), 3);
}

#[test]
fn cache_follows_vec_model_mutations() {
    let host = Rc::new(VecModel::from(numbers(&[1, 2, 3])));
    let model = ModelAdapter::new(host.clone());
    let cache = ModelCache::new(&model);
    assert_eq!(cache.rows(), numbers(&[1, 2, 3]));

    host.push(Value::from(4));
    host.insert(0, Value::from(0));
    assert_eq!(cache.rows(), numbers(&[0, 1, 2, 3, 4]));

    host.remove(2);
    model.set_row_data(0, Value::from(10));
    assert_eq!(cache.rows(), numbers(&[10, 1, 3, 4]));

    host.extend(numbers(&[5, 6]));
    assert_eq!(cache.row_count(), 6);
    host.clear();
    assert_eq!(cache.row_count(), 0);
}

#[test]
fn reset_discards_stale_rows() {
    let host = Rc::new(HostList::default());
    *host.rows.borrow_mut() = numbers(&[1, 2, 3]);
    let model = ModelAdapter::new(host.clone());
    let cache = ModelCache::new(&model);
    assert_eq!(cache.row_data(1), Some(Value::from(2)));

    // Mutated without a per-row notification; only the reset tells the cache.
    *host.rows.borrow_mut() = numbers(&[7, 8]);
    assert_eq!(cache.row_data(1), Some(Value::from(2)));
    host.peer.borrow().reset();

    assert_eq!(cache.row_count(), 2);
    assert_eq!(cache.row_data(1), Some(Value::from(8)));
    assert_eq!(cache.row_data(2), None);
}

#[test]
fn dropped_listeners_are_pruned() {
    let model = ModelRc::new(VecModel::new());
    let first = ModelCache::new(&model);
    let second = ModelCache::new(&model);
    assert_eq!(model.notify().listener_count(), 2);
    drop(first);
    model.notify().reset();
    assert_eq!(model.notify().listener_count(), 1);
    drop(second);
}

#[test]
fn row_iterator_snapshots_the_count() {
    let host = Rc::new(VecModel::from(numbers(&[1, 2])));
    let model = ModelAdapter::new(host.clone());
    let rows: Vec<Value> = model.iter().collect();
    assert_eq!(rows, numbers(&[1, 2]));
    assert_eq!(host.len(), 2);
}
