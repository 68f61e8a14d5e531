//! Upgrade Engine.
//!
//! An element moves from `Plain` to `Upgraded` at most once. The upgrade runs
//! `constructed`, then one synthesized `(name, None, value)` change per present
//! observed attribute in attribute order, then `connected` when the element is
//! connected. Upgrades never happen for elements without a governing registry.

use crate::document::Document;
use crate::error::RegistryError;
use crate::registry::{ConstructorRef, Definition, RegistryId, same_constructor};
use crate::tree::NodeId;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub enum ElementState {
    #[default]
    Plain,
    Upgraded(Rc<Definition>),
}

impl ElementState {
    pub fn is_upgraded(&self) -> bool {
        matches!(self, ElementState::Upgraded(_))
    }

    pub fn definition(&self) -> Option<&Rc<Definition>> {
        match self {
            ElementState::Upgraded(definition) => Some(definition),
            ElementState::Plain => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeResult {
    Upgraded,
    AlreadyUpgraded,
    /// The governing registry has no matching definition. Retryable.
    NotDefined,
    /// The element's root is not a document or shadow root. Retryable once attached.
    Deferred,
}

impl Document {
    pub fn try_upgrade(&mut self, element: NodeId) -> UpgradeResult {
        let Some(data) = self.nodes.element(element) else {
            return UpgradeResult::NotDefined;
        };
        if data.state.is_upgraded() {
            return UpgradeResult::AlreadyUpgraded;
        }
        let local_name = Arc::clone(&data.local_name);
        let Some(registry) = self.governing_registry(element) else {
            log::trace!(
                target: "custom_elements.upgrade",
                "<{local_name}> deferred: no governing registry"
            );
            return UpgradeResult::Deferred;
        };
        let Some(definition) = self.registries.lookup(registry, &local_name) else {
            log::trace!(
                target: "custom_elements.upgrade",
                "<{local_name}> not defined in {registry}"
            );
            return UpgradeResult::NotDefined;
        };
        self.upgrade_with(element, definition);
        UpgradeResult::Upgraded
    }

    /// Upgrade every element of the shadow-including subtree at `root` that
    /// `registry` governs, or that has no governing registry yet.
    ///
    /// Returns the number of elements upgraded.
    pub fn upgrade(&mut self, registry: RegistryId, root: NodeId) -> Result<usize, RegistryError> {
        if self.registries.registry(registry).is_none() {
            return Err(RegistryError::UnknownRegistry(registry));
        }
        let mut upgraded = 0;
        for node in self.nodes.inclusive_descendants(root, true) {
            let Some(data) = self.nodes.element(node) else {
                continue;
            };
            if data.state.is_upgraded() {
                continue;
            }
            if self
                .governing_registry(node)
                .is_some_and(|governing| governing != registry)
            {
                continue;
            }
            if let Some(definition) = self.registries.lookup(registry, &data.local_name) {
                self.upgrade_with(node, definition);
                upgraded += 1;
            }
        }
        Ok(upgraded)
    }

    pub fn is_upgraded(&self, element: NodeId) -> bool {
        self.nodes
            .element(element)
            .is_some_and(|data| data.state.is_upgraded())
    }

    pub fn definition(&self, element: NodeId) -> Option<Rc<Definition>> {
        self.nodes.element(element)?.state.definition().cloned()
    }

    /// Whether `element` was upgraded with `constructor`, like `instanceof`.
    pub fn is_instance_of(&self, element: NodeId, constructor: &ConstructorRef) -> bool {
        self.definition(element)
            .is_some_and(|definition| same_constructor(definition.constructor(), constructor))
    }

    pub(crate) fn upgrade_with(&mut self, element: NodeId, definition: Rc<Definition>) {
        let Some(data) = self.nodes.element_mut(element) else {
            return;
        };
        debug_assert!(!data.state.is_upgraded(), "upgrade is monotonic");
        data.state = ElementState::Upgraded(Rc::clone(&definition));
        log::debug!(
            target: "custom_elements.upgrade",
            "upgraded {element:?} as <{}>",
            definition.tag_name()
        );

        definition.constructor().constructed(element);

        let initial: Vec<(Arc<str>, String)> = self
            .attributes(element)
            .into_iter()
            .map(|attr| self.attrs.get(attr))
            .filter(|attr| definition.is_observed(&attr.name))
            .map(|attr| (Arc::clone(&attr.name), attr.value.clone()))
            .collect();
        for (name, value) in initial {
            self.record_attribute_change(element, &name, None, Some(value));
        }

        if self.is_connected(element) {
            definition.constructor().connected(element);
        }
    }

    /// Upgrade connected elements that a fresh definition now matches, in
    /// shadow-including tree order.
    pub(crate) fn upgrade_after_define(
        &mut self,
        registry: RegistryId,
        definition: &Rc<Definition>,
    ) {
        let candidates: Vec<NodeId> = self
            .nodes
            .inclusive_descendants(self.document_node(), true)
            .into_iter()
            .filter(|&node| {
                self.nodes.element(node).is_some_and(|data| {
                    !data.state.is_upgraded() && &*data.local_name == definition.tag_name()
                })
            })
            .filter(|&node| self.governing_registry(node) == Some(registry))
            .collect();
        for node in candidates {
            self.upgrade_with(node, Rc::clone(definition));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CustomElementClass, DefineOptions};
    use std::cell::Cell;

    #[derive(Default)]
    struct Counting {
        constructed: Cell<usize>,
        connected: Cell<usize>,
    }

    impl CustomElementClass for Counting {
        fn constructed(&self, _element: NodeId) {
            self.constructed.set(self.constructed.get() + 1);
        }

        fn connected(&self, _element: NodeId) {
            self.connected.set(self.connected.get() + 1);
        }
    }

    #[test]
    fn try_upgrade_is_idempotent() {
        let mut doc = Document::new();
        let class = Rc::new(Counting::default());
        doc.define(RegistryId::GLOBAL, "x-foo", class.clone(), DefineOptions::default())
            .unwrap();
        let body = doc.body();
        doc.set_inner_html(body, "<x-foo></x-foo>").unwrap();
        let el = doc.first_element_child(body).unwrap();

        assert!(doc.is_upgraded(el));
        assert_eq!(doc.try_upgrade(el), UpgradeResult::AlreadyUpgraded);
        assert_eq!(doc.try_upgrade(el), UpgradeResult::AlreadyUpgraded);
        assert_eq!(class.constructed.get(), 1);
        assert_eq!(class.connected.get(), 1);
    }

    #[test]
    fn try_upgrade_reports_misses() {
        let mut doc = Document::new();
        let detached = doc.create_element("x-foo").unwrap();
        assert_eq!(doc.try_upgrade(detached), UpgradeResult::Deferred);

        doc.append_child(doc.body(), detached).unwrap();
        assert_eq!(doc.try_upgrade(detached), UpgradeResult::NotDefined);

        let text = doc.create_text_node("x");
        assert_eq!(doc.try_upgrade(text), UpgradeResult::NotDefined);
    }

    #[test]
    fn explicit_upgrade_reaches_detached_subtrees() {
        let mut doc = Document::new();
        let class = Rc::new(Counting::default());
        let registry = doc.create_scoped_registry();
        doc.define(registry, "x-foo", class.clone(), DefineOptions::default())
            .unwrap();

        let fragment = doc.create_document_fragment();
        let el = doc.create_element("x-foo").unwrap();
        doc.append_child(fragment, el).unwrap();
        assert!(!doc.is_upgraded(el));

        assert_eq!(doc.upgrade(registry, fragment), Ok(1));
        assert!(doc.is_upgraded(el));
        assert_eq!(class.constructed.get(), 1);
        assert_eq!(class.connected.get(), 0);
        assert_eq!(doc.upgrade(registry, fragment), Ok(0));
    }
}
