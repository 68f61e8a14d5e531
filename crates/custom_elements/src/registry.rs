//! Registry Store: per-scope tag-name → definition tables.
//!
//! Invariants:
//! - `RegistryId::GLOBAL` always exists and is never associated with a scope.
//! - Definitions are append-only; a tag name is defined at most once per registry.
//! - A scoped registry is associated with at most one shadow root, fixed at
//!   `attach_shadow` time.

use crate::attributes::AttributeChange;
use crate::error::RegistryError;
use crate::tree::NodeId;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Lifecycle hooks of a custom element class.
///
/// Hooks run synchronously inside the DOM operation that triggered them and
/// only receive ids and values; they cannot re-enter the document.
pub trait CustomElementClass {
    fn constructed(&self, _element: NodeId) {}

    fn connected(&self, _element: NodeId) {}

    fn disconnected(&self, _element: NodeId) {}

    fn attribute_changed(&self, _element: NodeId, _change: &AttributeChange) {}
}

/// Opaque constructor reference. Identity is the allocation, not the type.
pub type ConstructorRef = Rc<dyn CustomElementClass>;

pub fn same_constructor(a: &ConstructorRef, b: &ConstructorRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(u32);

impl RegistryId {
    pub const GLOBAL: RegistryId = RegistryId(0);

    pub fn is_global(self) -> bool {
        self == Self::GLOBAL
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            f.write_str("global registry")
        } else {
            write!(f, "registry #{}", self.0)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DefineOptions {
    pub observed_attributes: Vec<String>,
}

impl DefineOptions {
    pub fn observing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            observed_attributes: names.into_iter().map(Into::into).collect(),
        }
    }
}

pub struct Definition {
    tag_name: Arc<str>,
    constructor: ConstructorRef,
    observed_attributes: Vec<Arc<str>>,
}

impl Definition {
    fn new(tag_name: &str, constructor: ConstructorRef, options: DefineOptions) -> Self {
        // Names are kept as declared and matched case-sensitively.
        let mut observed_attributes: Vec<Arc<str>> = Vec::new();
        for name in options.observed_attributes {
            if !observed_attributes.iter().any(|seen| **seen == *name) {
                observed_attributes.push(Arc::from(name));
            }
        }
        Self {
            tag_name: Arc::from(tag_name),
            constructor,
            observed_attributes,
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn constructor(&self) -> &ConstructorRef {
        &self.constructor
    }

    pub fn observed_attributes(&self) -> &[Arc<str>] {
        &self.observed_attributes
    }

    pub fn is_observed(&self, name: &str) -> bool {
        self.observed_attributes.iter().any(|observed| **observed == *name)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("tag_name", &self.tag_name)
            .field("observed_attributes", &self.observed_attributes)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Registry {
    id: RegistryId,
    definitions: HashMap<Arc<str>, Rc<Definition>>,
    scope: Option<NodeId>,
}

impl Registry {
    fn new(id: RegistryId) -> Self {
        Self {
            id,
            definitions: HashMap::new(),
            scope: None,
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// The shadow root this registry governs, if it has been attached to one.
    pub fn scope(&self) -> Option<NodeId> {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn lookup(&self, tag_name: &str) -> Option<Rc<Definition>> {
        if tag_name.bytes().any(|b| b.is_ascii_uppercase()) {
            return self
                .definitions
                .get(tag_name.to_ascii_lowercase().as_str())
                .cloned();
        }
        self.definitions.get(tag_name).cloned()
    }
}

const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Valid custom element name: starts with an ASCII lowercase letter, contains a
/// hyphen, has no ASCII uppercase and no markup-significant characters, and is
/// not reserved.
pub fn is_valid_custom_element_name(name: &str) -> bool {
    let Some(first) = name.bytes().next() else {
        return false;
    };
    first.is_ascii_lowercase()
        && name.contains('-')
        && !name.bytes().any(|b| {
            b.is_ascii_uppercase()
                || b.is_ascii_whitespace()
                || matches!(b, b'/' | b'>' | b'=' | b'<' | b'"' | b'\'' | 0)
        })
        && !RESERVED_NAMES.contains(&name)
}

#[derive(Debug)]
pub struct RegistryStore {
    registries: Vec<Registry>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self {
            registries: vec![Registry::new(RegistryId::GLOBAL)],
        }
    }

    /// Allocate a new empty registry that is not yet associated with a scope.
    pub fn create_scoped_registry(&mut self) -> RegistryId {
        let id = RegistryId(self.registries.len() as u32);
        self.registries.push(Registry::new(id));
        log::debug!(target: "custom_elements.registry", "created {id}");
        id
    }

    pub fn registry(&self, id: RegistryId) -> Option<&Registry> {
        self.registries.get(id.0 as usize)
    }

    pub fn global(&self) -> &Registry {
        &self.registries[RegistryId::GLOBAL.0 as usize]
    }

    pub fn define(
        &mut self,
        id: RegistryId,
        tag_name: &str,
        constructor: ConstructorRef,
        options: DefineOptions,
    ) -> Result<Rc<Definition>, RegistryError> {
        let registry = self
            .registries
            .get_mut(id.0 as usize)
            .ok_or(RegistryError::UnknownRegistry(id))?;
        if !is_valid_custom_element_name(tag_name) {
            return Err(RegistryError::InvalidName(tag_name.to_string()));
        }
        if registry.definitions.contains_key(tag_name) {
            return Err(RegistryError::AlreadyDefined {
                registry: id,
                tag_name: tag_name.to_string(),
            });
        }
        if let Some(existing) = registry
            .definitions
            .values()
            .find(|definition| same_constructor(definition.constructor(), &constructor))
        {
            return Err(RegistryError::ConstructorInUse {
                registry: id,
                tag_name: existing.tag_name().to_string(),
            });
        }

        let definition = Rc::new(Definition::new(tag_name, constructor, options));
        registry
            .definitions
            .insert(Arc::clone(&definition.tag_name), Rc::clone(&definition));
        log::debug!(
            target: "custom_elements.registry",
            "defined <{tag_name}> in {id} observing {:?}",
            definition.observed_attributes
        );
        Ok(definition)
    }

    pub fn lookup(&self, id: RegistryId, tag_name: &str) -> Option<Rc<Definition>> {
        self.registry(id)?.lookup(tag_name)
    }

    /// The constructor bound to `tag_name`, like `CustomElementRegistry.get`.
    pub fn get(&self, id: RegistryId, tag_name: &str) -> Option<ConstructorRef> {
        self.lookup(id, tag_name)
            .map(|definition| Rc::clone(definition.constructor()))
    }

    pub(crate) fn scope_of(&self, id: RegistryId) -> Option<NodeId> {
        self.registry(id)?.scope
    }

    pub(crate) fn associate(&mut self, id: RegistryId, root: NodeId) {
        if let Some(registry) = self.registries.get_mut(id.0 as usize) {
            debug_assert!(registry.scope.is_none(), "registry scope is immutable");
            registry.scope = Some(root);
        }
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new()
    }
}
