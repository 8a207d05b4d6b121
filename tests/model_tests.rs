mod common;

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use common::compile;
use vellum::{
    Model, ModelAdapter, ModelPeer, ModelRc, Value, VecModel,
    runtime::{leak_detector, model::ModelChangeListener},
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Added(usize, usize),
    Changed(usize),
    Removed(usize, usize),
    Reset,
}

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<Event>>,
}

impl ModelChangeListener for Recorder {
    fn row_added(&self, index: usize, count: usize) {
        self.events.borrow_mut().push(Event::Added(index, count));
    }

    fn row_changed(&self, row: usize) {
        self.events.borrow_mut().push(Event::Changed(row));
    }

    fn row_removed(&self, index: usize, count: usize) {
        self.events.borrow_mut().push(Event::Removed(index, count));
    }

    fn reset(&self) {
        self.events.borrow_mut().push(Event::Reset);
    }
}

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

/// Rows `start..end`, regenerated on demand.
struct Range {
    start: Cell<i32>,
    end: Cell<i32>,
    peer: RefCell<ModelPeer>,
}

impl Range {
    fn new(start: i32, end: i32) -> Self {
        Self {
            start: Cell::new(start),
            end: Cell::new(end),
            peer: RefCell::default(),
        }
    }

    fn shift(&self, by: i32) {
        self.start.set(self.start.get() + by);
        self.end.set(self.end.get() + by);
        self.peer.borrow().reset();
    }
}

impl Model for Range {
    fn row_count(&self) -> usize {
        (self.end.get() - self.start.get()).max(0) as usize
    }

    fn row_data(&self, row: usize) -> Option<Value> {
        Some(Value::from(self.start.get() + row as i32))
    }

    fn attach_peer(&self, peer: ModelPeer) {
        *self.peer.borrow_mut() = peer;
    }
}

#[test]
fn vec_model_reports_every_mutation() {
    let host = Rc::new(VecModel::new());
    let model = ModelAdapter::new(host.clone());
    let recorder = Rc::new(Recorder::default());
    let listener: Rc<dyn ModelChangeListener> = recorder.clone();
    model.add_listener(Rc::downgrade(&listener));

    host.push(Value::from("a"));
    host.extend(strings(&["b", "c"]));
    host.insert(1, Value::from("x"));
    model.set_row_data(0, Value::from("A"));
    host.remove(3);
    host.remove(9);
    host.set_vec(strings(&["only"]));
    host.clear();
    host.clear();

    assert_eq!(
        *recorder.events.borrow(),
        vec![
            Event::Added(0, 1),
            Event::Added(1, 2),
            Event::Added(1, 1),
            Event::Changed(0),
            Event::Removed(3, 1),
            Event::Reset,
            Event::Removed(0, 1),
        ]
    );
    drop(listener);
}

#[test]
fn out_of_range_writes_are_ignored() {
    let host = Rc::new(VecModel::from(strings(&["a"])));
    let model = ModelAdapter::new(host.clone());
    model.set_row_data(5, Value::from("z"));
    assert_eq!(host.to_vec(), strings(&["a"]));
}

#[test]
fn host_models_drive_repeaters() {
    let instance = compile(
        "export component Numbers {\n\
         in property <[int]> values;\n\
         for value in values : Text { text: \"\" + value; }\n}\n",
    )
    .create();

    let range = Rc::new(Range::new(1, 4));
    instance.set_property("values", Value::Model(ModelAdapter::new(range.clone())));
    let texts = |instance: &vellum::ComponentInstance| -> Vec<Value> {
        instance
            .render_scene()
            .children
            .iter()
            .filter_map(|child| child.properties.get("text").cloned())
            .collect()
    };
    assert_eq!(texts(&instance), strings(&["1", "2", "3"]));

    range.shift(10);
    assert_eq!(texts(&instance), strings(&["11", "12", "13"]));
}

#[test]
fn one_model_can_back_several_instances() {
    let definition = compile("export component View { in-out property <[string]> rows; }");
    let first = definition.create();
    let second = definition.create();

    let host = Rc::new(VecModel::from(strings(&["a"])));
    let model = ModelAdapter::new(host.clone());
    first.set_property("rows", Value::Model(model.clone()));
    second.set_property("rows", Value::Model(model));

    host.push(Value::from("b"));
    assert_eq!(first.rows("rows"), Some(strings(&["a", "b"])));
    assert_eq!(second.rows("rows"), Some(strings(&["a", "b"])));
}

#[test]
fn replacing_a_model_refreshes_cached_rows() {
    let instance = compile("export component View { in-out property <[string]> rows; }").create();
    instance.set_property("rows", Value::from(strings(&["old"])));
    assert_eq!(instance.rows("rows"), Some(strings(&["old"])));

    instance.set_property("rows", Value::from(strings(&["new", "rows"])));
    assert_eq!(instance.rows("rows"), Some(strings(&["new", "rows"])));
}

#[test]
fn adapters_are_torn_down_with_their_last_holder() {
    let before = leak_detector::snapshot();
    let host = Rc::new(Range::new(0, 2));
    {
        let instance = compile("export component View { in-out property <[int]> rows; }").create();
        instance.set_property("rows", Value::Model(ModelAdapter::new(host.clone())));
        assert_eq!(instance.rows("rows"), Some(vec![Value::from(0), Value::from(1)]));
        assert!(host.peer.borrow().is_attached());
        assert_eq!(leak_detector::snapshot().live_adapters(), before.live_adapters() + 1);
    }

    assert!(!host.peer.borrow().is_attached());
    assert_eq!(leak_detector::snapshot().live_adapters(), before.live_adapters());
    assert_eq!(Rc::strong_count(&host), 1);
    host.shift(1);
}

#[test]
fn models_compare_by_rows() {
    let a = Value::from(strings(&["x", "y"]));
    let b = Value::Model(ModelRc::new(VecModel::from(strings(&["x", "y"]))));
    let c = Value::from(strings(&["x"]));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.clone(), a);
}
