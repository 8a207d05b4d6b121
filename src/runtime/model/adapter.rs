use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use crate::runtime::{leak_detector, thread::ThreadAffinity, value::Value};

use super::{Model, ModelAdaptor, ModelChangeListener, ModelNotify, ModelPeer};

/// Wraps one host [`Model`] for the runtime.
pub struct ModelAdapter {
    model: Rc<dyn Model>,
    notify: Rc<ModelNotify>,
    keep_alive: RefCell<Option<Rc<ModelAdapter>>>,
    torn_down: Cell<bool>,
    affinity: ThreadAffinity,
}

impl ModelAdapter {
    /// Wrap `model`, attach its peer and return the runtime handle.
    pub fn new(model: Rc<dyn Model>) -> ModelRc {
        let adapter = Rc::new(ModelAdapter {
            model,
            notify: Rc::new(ModelNotify::default()),
            keep_alive: RefCell::new(None),
            torn_down: Cell::new(false),
            affinity: ThreadAffinity::current(),
        });
        *adapter.keep_alive.borrow_mut() = Some(adapter.clone());
        adapter.model.attach_peer(ModelPeer::new(&adapter.notify));
        leak_detector::record_adapter_created();
        ModelRc::from_adaptor(adapter)
    }

    pub fn model(&self) -> &Rc<dyn Model> {
        &self.model
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }
}

impl ModelAdaptor for ModelAdapter {
    fn row_count(&self) -> usize {
        self.affinity.assert_current("ModelAdapter::row_count");
        self.model.row_count()
    }

    fn row_data(&self, row: usize) -> Option<Value> {
        self.affinity.assert_current("ModelAdapter::row_data");
        if row >= self.model.row_count() {
            return None;
        }
        self.model.row_data(row)
    }

    fn set_row_data(&self, row: usize, data: Value) {
        self.affinity.assert_current("ModelAdapter::set_row_data");
        if row < self.model.row_count() {
            self.model.set_row_data(row, data);
        }
    }

    fn notify(&self) -> &ModelNotify {
        &self.notify
    }

    fn teardown(&self) {
        self.affinity.assert_current("ModelAdapter::teardown");
        if self.torn_down.replace(true) {
            return;
        }
        self.notify.detach();
        let me = self.keep_alive.borrow_mut().take();
        leak_detector::record_adapter_torn_down();
        drop(me);
    }
}

struct ModelBinding {
    adaptor: Rc<dyn ModelAdaptor>,
}

impl Drop for ModelBinding {
    fn drop(&mut self) {
        self.adaptor.teardown();
    }
}

/// The runtime's shared handle on a model binding.
///
/// Cloning shares the binding. Dropping the last clone tears the adapter down.
#[derive(Clone)]
pub struct ModelRc(Rc<ModelBinding>);

impl ModelRc {
    /// Shorthand for [`ModelAdapter::new`].
    pub fn new(model: impl Model + 'static) -> Self {
        ModelAdapter::new(Rc::new(model))
    }

    /// Bind a custom runtime-side adaptor.
    pub fn from_adaptor(adaptor: Rc<dyn ModelAdaptor>) -> Self {
        ModelRc(Rc::new(ModelBinding { adaptor }))
    }

    pub fn row_count(&self) -> usize {
        self.0.adaptor.row_count()
    }

    pub fn row_data(&self, row: usize) -> Option<Value> {
        self.0.adaptor.row_data(row)
    }

    pub fn set_row_data(&self, row: usize, data: Value) {
        self.0.adaptor.set_row_data(row, data);
    }

    pub fn notify(&self) -> &ModelNotify {
        self.0.adaptor.notify()
    }

    pub fn add_listener(&self, listener: Weak<dyn ModelChangeListener>) {
        self.notify().add_listener(listener);
    }

    pub fn iter(&self) -> ModelRowIter<'_> {
        ModelRowIter {
            model: self,
            row: 0,
            count: self.row_count(),
        }
    }

    /// Same binding, not merely equal rows.
    pub fn ptr_eq(&self, other: &ModelRc) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ModelRc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRc")
            .field("rows", &self.row_count())
            .finish()
    }
}

/// Rows of a model as counted when the iterator was created.
pub struct ModelRowIter<'a> {
    model: &'a ModelRc,
    row: usize,
    count: usize,
}

impl Iterator for ModelRowIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.row >= self.count {
            return None;
        }
        let value = self.model.row_data(self.row);
        self.row += 1;
        if value.is_none() {
            self.count = self.row;
        }
        value
    }
}
