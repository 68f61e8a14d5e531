use crate::attr::AttrArena;
use crate::attributes::html_name;
use crate::config::EngineConfig;
use crate::error::{DomError, RegistryError};
use crate::registry::{ConstructorRef, DefineOptions, RegistryId, RegistryStore};
use crate::tree::{ElementData, NodeArena, NodeId, NodeKind};
use std::sync::Arc;

/// A document and everything scoped to it: node storage, attribute cells and
/// the registry store. The global registry is the store's `RegistryId::GLOBAL`.
#[derive(Debug)]
pub struct Document {
    pub(crate) config: EngineConfig,
    pub(crate) registries: RegistryStore,
    pub(crate) nodes: NodeArena,
    pub(crate) attrs: AttrArena,
    document_node: NodeId,
    document_element: NodeId,
    body: NodeId,
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// A document with an `<html><head></head><body></body></html>` skeleton.
    pub fn with_config(config: EngineConfig) -> Self {
        let mut nodes = NodeArena::default();
        let document_node = nodes.push(NodeKind::Document);
        let document_element = nodes.push(NodeKind::Element(ElementData::new(Arc::from("html"))));
        let head = nodes.push(NodeKind::Element(ElementData::new(Arc::from("head"))));
        let body = nodes.push(NodeKind::Element(ElementData::new(Arc::from("body"))));
        nodes.append(document_node, document_element);
        nodes.append(document_element, head);
        nodes.append(document_element, body);
        Self {
            config,
            registries: RegistryStore::new(),
            nodes,
            attrs: AttrArena::default(),
            document_node,
            document_element,
            body,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registries(&self) -> &RegistryStore {
        &self.registries
    }

    pub fn document_node(&self) -> NodeId {
        self.document_node
    }

    pub fn document_element(&self) -> NodeId {
        self.document_element
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn create_scoped_registry(&mut self) -> RegistryId {
        self.registries.create_scoped_registry()
    }

    /// Define `tag_name` in `registry`, then upgrade connected elements that the
    /// new definition governs.
    pub fn define(
        &mut self,
        registry: RegistryId,
        tag_name: &str,
        constructor: ConstructorRef,
        options: DefineOptions,
    ) -> Result<(), RegistryError> {
        let definition = self
            .registries
            .define(registry, tag_name, constructor, options)?;
        if self.config.upgrade_on_define {
            self.upgrade_after_define(registry, &definition);
        }
        Ok(())
    }

    pub fn get(&self, registry: RegistryId, tag_name: &str) -> Option<ConstructorRef> {
        self.registries.get(registry, tag_name)
    }

    /// Create an element owned by the document, upgraded against the global
    /// registry when it defines `local_name`.
    pub fn create_element(&mut self, local_name: &str) -> Result<NodeId, DomError> {
        self.create_element_with_registry(RegistryId::GLOBAL, local_name)
    }

    /// Create an element on behalf of `scope`, resolving its definition against
    /// the registry that governs `scope` (a shadow root's `createElement`).
    pub fn create_element_in(
        &mut self,
        scope: NodeId,
        local_name: &str,
    ) -> Result<NodeId, DomError> {
        let registry = self.resolve_registry(scope);
        self.create_element_with_registry(registry, local_name)
    }

    fn create_element_with_registry(
        &mut self,
        registry: RegistryId,
        local_name: &str,
    ) -> Result<NodeId, DomError> {
        let local_name = html_name(local_name)?;
        let definition = self.registries.lookup(registry, &local_name);
        let element = self.nodes.push(NodeKind::Element(ElementData::new(local_name)));
        if let Some(definition) = definition {
            self.upgrade_with(element, definition);
        }
        Ok(element)
    }

    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.nodes.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.nodes.push(NodeKind::Comment(text.to_string()))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.nodes.push(NodeKind::DocumentFragment)
    }

    /// Attach a shadow root to `host`, optionally scoped to `registry`.
    ///
    /// The association is fixed for the root's lifetime. Passing the global
    /// registry is the same as passing none.
    pub fn attach_shadow(
        &mut self,
        host: NodeId,
        registry: Option<RegistryId>,
    ) -> Result<NodeId, DomError> {
        let data = self.nodes.element(host).ok_or(DomError::NotAnElement(host))?;
        if data.shadow_root.is_some() {
            return Err(DomError::NotSupported("element already hosts a shadow root"));
        }
        let registry = match registry {
            Some(id) if !id.is_global() => {
                if self.registries.registry(id).is_none() {
                    return Err(RegistryError::UnknownRegistry(id).into());
                }
                if self.registries.scope_of(id).is_some() {
                    return Err(DomError::RegistryInUse(id));
                }
                Some(id)
            }
            _ => None,
        };

        let shadow_root = self.nodes.push(NodeKind::ShadowRoot { host, registry });
        if let Some(id) = registry {
            self.registries.associate(id, shadow_root);
        }
        if let Some(data) = self.nodes.element_mut(host) {
            data.shadow_root = Some(shadow_root);
        }
        log::debug!(
            target: "custom_elements.registry",
            "attached shadow root {shadow_root:?} to {host:?} ({})",
            registry.unwrap_or(RegistryId::GLOBAL)
        );
        Ok(shadow_root)
    }

    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.nodes.element(host)?.shadow_root
    }

    pub fn host(&self, shadow_root: NodeId) -> Option<NodeId> {
        match self.nodes.kind(shadow_root) {
            Some(NodeKind::ShadowRoot { host, .. }) => Some(*host),
            _ => None,
        }
    }

    /// `None` when `node` was not created by this document.
    pub fn node_kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.kind(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.parent(node)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.children(node)
    }

    pub fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .find(|&child| self.nodes.is_element(child))
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&child| self.nodes.is_element(child))
            .collect()
    }

    pub fn local_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.element(node).map(ElementData::local_name)
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.nodes.kind(node) {
            Some(NodeKind::Text(text) | NodeKind::Comment(text)) => Some(text),
            _ => None,
        }
    }

    /// Whether the shadow-including root of `node` is the document.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.nodes.shadow_including_root(node) == self.document_node
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
