//! Scope Resolver.
//!
//! Resolution always uses the node's current root: a document root maps to the
//! global registry, a shadow root to its associated registry (or the global one
//! when it has none). Any other root, a detached fragment or a parentless
//! element, has no governing registry.

use crate::document::Document;
use crate::registry::RegistryId;
use crate::tree::{NodeId, NodeKind};

impl Document {
    /// The topmost ancestor of `node`, stopping at shadow roots.
    pub fn root(&self, node: NodeId) -> NodeId {
        self.nodes.root(node)
    }

    pub fn governing_registry(&self, node: NodeId) -> Option<RegistryId> {
        match self.nodes.kind(self.nodes.root(node))? {
            NodeKind::Document => Some(RegistryId::GLOBAL),
            NodeKind::ShadowRoot { registry, .. } => Some(registry.unwrap_or(RegistryId::GLOBAL)),
            NodeKind::DocumentFragment
            | NodeKind::Element(_)
            | NodeKind::Text(_)
            | NodeKind::Comment(_) => None,
        }
    }

    /// The registry custom tags under `node` resolve against; the global one
    /// when the root has no scoped association.
    pub fn resolve_registry(&self, node: NodeId) -> RegistryId {
        self.governing_registry(node).unwrap_or(RegistryId::GLOBAL)
    }

    /// The registry fixed on a shadow root at `attach_shadow` time.
    pub fn shadow_root_registry(&self, shadow_root: NodeId) -> Option<RegistryId> {
        match self.nodes.kind(shadow_root) {
            Some(NodeKind::ShadowRoot { registry, .. }) => *registry,
            _ => None,
        }
    }
}
