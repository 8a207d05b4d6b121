//! Host collections bound to UI lists.
//!
//! A host implements [`Model`]. Wrapping it with [`ModelAdapter::new`] yields a
//! [`ModelRc`], the handle the runtime stores in [`Value::Model`]. The adapter
//! hands the host a [`ModelPeer`], a weak emit-only handle on the adapter's
//! [`ModelNotify`]; the host reports every mutation through it *after* the
//! mutation is readable. Runtime-side listeners such as [`ModelCache`]
//! subscribe to the notifier.
//!
//! Ownership runs one way: the adapter owns the host model, the host owns
//! only a peer. The adapter keeps itself alive until the last `ModelRc` is
//! dropped, which calls [`ModelAdaptor::teardown`] exactly once.
//!
//! [`Value::Model`]: crate::runtime::value::Value::Model

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use crate::runtime::value::Value;

mod adapter;
mod cache;
mod vec_model;

pub use adapter::{ModelAdapter, ModelRc, ModelRowIter};
pub use cache::ModelCache;
pub use vec_model::VecModel;

/// Host-side indexed collection.
pub trait Model {
    fn row_count(&self) -> usize;

    /// `None` when `row` is out of range.
    fn row_data(&self, row: usize) -> Option<Value>;

    /// Write requested by the UI. Read-only models keep the default, which
    /// ignores the write.
    fn set_row_data(&self, row: usize, data: Value) {
        let _ = (row, data);
    }

    /// Called once when the model is wrapped. Models that never change can
    /// ignore the peer.
    fn attach_peer(&self, peer: ModelPeer) {
        let _ = peer;
    }
}

/// Receiver of change notifications, implemented by runtime-side caches.
pub trait ModelChangeListener {
    fn row_added(&self, index: usize, count: usize);
    fn row_changed(&self, row: usize);
    fn row_removed(&self, index: usize, count: usize);
    /// Everything known about the model is stale.
    fn reset(&self);
}

/// Fan-out of change notifications to runtime listeners.
///
/// Listeners are held weakly; dropped listeners are pruned on the next
/// notification.
#[derive(Default)]
pub struct ModelNotify {
    listeners: RefCell<Vec<Weak<dyn ModelChangeListener>>>,
    detached: Cell<bool>,
}

impl ModelNotify {
    pub fn add_listener(&self, listener: Weak<dyn ModelChangeListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|listener| listener.strong_count() > 0)
            .count()
    }

    pub(crate) fn detach(&self) {
        self.detached.set(true);
        self.listeners.borrow_mut().clear();
    }

    pub fn is_detached(&self) -> bool {
        self.detached.get()
    }

    // Listeners may add listeners while being notified; no borrow is held
    // across the calls.
    fn emit(&self, f: impl Fn(&dyn ModelChangeListener)) {
        if self.detached.get() {
            return;
        }
        let live: Vec<Rc<dyn ModelChangeListener>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|listener| listener.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            f(listener.as_ref());
        }
    }

    pub fn row_added(&self, index: usize, count: usize) {
        log::trace!("model: {} row(s) added at {}", count, index);
        self.emit(|listener| listener.row_added(index, count));
    }

    pub fn row_changed(&self, row: usize) {
        log::trace!("model: row {} changed", row);
        self.emit(|listener| listener.row_changed(row));
    }

    pub fn row_removed(&self, index: usize, count: usize) {
        log::trace!("model: {} row(s) removed at {}", count, index);
        self.emit(|listener| listener.row_removed(index, count));
    }

    pub fn reset(&self) {
        log::trace!("model: reset");
        self.emit(|listener| listener.reset());
    }
}

/// The host's handle on an adapter's notifier.
///
/// A peer never keeps the adapter alive. Once the adapter is torn down the
/// peer is inert: [`is_attached`](Self::is_attached) turns false and
/// notifications are dropped.
#[derive(Clone, Default)]
pub struct ModelPeer {
    notify: Weak<ModelNotify>,
}

impl ModelPeer {
    pub(crate) fn new(notify: &Rc<ModelNotify>) -> Self {
        Self {
            notify: Rc::downgrade(notify),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.notify
            .upgrade()
            .is_some_and(|notify| !notify.is_detached())
    }

    fn with_notify(&self, f: impl FnOnce(&ModelNotify)) {
        if let Some(notify) = self.notify.upgrade() {
            f(&notify);
        }
    }

    pub fn row_added(&self, index: usize, count: usize) {
        self.with_notify(|notify| notify.row_added(index, count));
    }

    pub fn row_changed(&self, row: usize) {
        self.with_notify(|notify| notify.row_changed(row));
    }

    pub fn row_removed(&self, index: usize, count: usize) {
        self.with_notify(|notify| notify.row_removed(index, count));
    }

    pub fn reset(&self) {
        self.with_notify(|notify| notify.reset());
    }
}

/// Runtime-facing side of a model binding.
pub trait ModelAdaptor {
    fn row_count(&self) -> usize;
    /// `None` when `row` is out of range.
    fn row_data(&self, row: usize) -> Option<Value>;
    /// Ignored by read-only models; callers must not assume the write applied.
    fn set_row_data(&self, row: usize, data: Value);
    fn notify(&self) -> &ModelNotify;
    /// Called exactly once, when the runtime releases its last handle.
    fn teardown(&self);
}

#[cfg(test)]
mod model_test;
