#![allow(dead_code)]

use custom_elements::{
    AttributeChange, ConstructorRef, CustomElementClass, DefineOptions, Document, NodeId,
    RegistryId,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Class stand-in that counts lifecycle hooks and keeps every change it saw.
#[derive(Default)]
pub struct RecordingClass {
    pub constructed: Cell<usize>,
    pub connected: Cell<usize>,
    pub disconnected: Cell<usize>,
    pub changes: RefCell<Vec<(NodeId, AttributeChange)>>,
}

impl RecordingClass {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn changes_for(&self, element: NodeId) -> Vec<AttributeChange> {
        self.changes
            .borrow()
            .iter()
            .filter(|(target, _)| *target == element)
            .map(|(_, change)| change.clone())
            .collect()
    }
}

impl CustomElementClass for RecordingClass {
    fn constructed(&self, _element: NodeId) {
        self.constructed.set(self.constructed.get() + 1);
    }

    fn connected(&self, _element: NodeId) {
        self.connected.set(self.connected.get() + 1);
    }

    fn disconnected(&self, _element: NodeId) {
        self.disconnected.set(self.disconnected.get() + 1);
    }

    fn attribute_changed(&self, element: NodeId, change: &AttributeChange) {
        self.changes.borrow_mut().push((element, change.clone()));
    }
}

pub fn as_constructor(class: &Rc<RecordingClass>) -> ConstructorRef {
    class.clone()
}

/// Define `tag_name` in `registry` with a fresh recording class.
pub fn define_recording(
    doc: &mut Document,
    registry: RegistryId,
    tag_name: &str,
    observed: &[&str],
) -> Rc<RecordingClass> {
    let class = RecordingClass::new();
    doc.define(
        registry,
        tag_name,
        as_constructor(&class),
        DefineOptions::observing(observed.iter().copied()),
    )
    .expect("definition should succeed");
    class
}

/// A connected host in the body with a shadow root scoped to `registry`.
pub fn get_shadow_root(doc: &mut Document, registry: Option<RegistryId>) -> NodeId {
    let host = doc.create_element("div").expect("create host");
    doc.append_child(doc.body(), host).expect("append host");
    doc.attach_shadow(host, registry).expect("attach shadow")
}

/// Append a `<div>` to `parent`, assign `markup` to its innerHTML and return
/// the first parsed element.
pub fn get_html(doc: &mut Document, markup: &str, parent: NodeId) -> NodeId {
    let container = doc.create_element("div").expect("create container");
    doc.append_child(parent, container).expect("append container");
    doc.set_inner_html(container, markup).expect("set innerHTML");
    doc.first_element_child(container)
        .expect("markup should produce an element")
}

pub fn change(name: &str, old_value: Option<&str>, new_value: Option<&str>) -> AttributeChange {
    AttributeChange::new(name, old_value, new_value)
}
