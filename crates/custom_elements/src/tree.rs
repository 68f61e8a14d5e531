//! Node arena backing a `Document`.
//!
//! Invariants:
//! - `NodeId`s are never reused. An id the arena never minted reads as an
//!   absent node rather than panicking.
//! - A node has at most one parent; shadow roots never have a parent and point
//!   at their host instead.
//! - Operations must not create cycles.

use crate::attr::AttrId;
use crate::attributes::AttributeChange;
use crate::error::DomError;
use crate::registry::RegistryId;
use crate::upgrade::ElementState;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Document,
    DocumentFragment,
    ShadowRoot {
        host: NodeId,
        registry: Option<RegistryId>,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl NodeKind {
    fn allows_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::DocumentFragment
                | NodeKind::ShadowRoot { .. }
                | NodeKind::Element(_)
        )
    }
}

#[derive(Debug)]
pub struct ElementData {
    pub(crate) local_name: Arc<str>,
    pub(crate) attributes: Vec<AttrId>,
    pub(crate) state: ElementState,
    pub(crate) shadow_root: Option<NodeId>,
    pub(crate) changed_attributes: Vec<AttributeChange>,
}

impl ElementData {
    pub(crate) fn new(local_name: Arc<str>) -> Self {
        Self {
            local_name,
            attributes: Vec::new(),
            state: ElementState::Plain,
            shadow_root: None,
            changed_attributes: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn state(&self) -> &ElementState {
        &self.state
    }

    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<NodeRecord>,
}

impl NodeArena {
    pub(crate) fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index())
    }

    /// `None` for an id this arena never minted.
    pub(crate) fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.record(id).map(|record| &record.kind)
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id)?.parent
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        self.record(id).map_or(&[], |record| &record.children)
    }

    pub(crate) fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id)? {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.index())?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&sibling| sibling == id)?;
        siblings.get(pos + 1).copied()
    }

    /// The topmost ancestor, without crossing shadow boundaries.
    pub(crate) fn root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// The root reached by continuing from each shadow root to its host.
    pub(crate) fn shadow_including_root(&self, id: NodeId) -> NodeId {
        let mut root = self.root(id);
        while let Some(NodeKind::ShadowRoot { host, .. }) = self.kind(root) {
            root = self.root(*host);
        }
        root
    }

    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Inclusive descendants of `root` in tree order (parents before children).
    ///
    /// With `enter_shadow_roots`, a host's shadow root and its contents follow the
    /// host directly, before the host's light children.
    pub(crate) fn inclusive_descendants(
        &self,
        root: NodeId,
        enter_shadow_roots: bool,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(record) = self.record(id) else {
                continue;
            };
            out.push(id);
            stack.extend(record.children.iter().rev().copied());
            if enter_shadow_roots {
                if let NodeKind::Element(ElementData {
                    shadow_root: Some(shadow_root),
                    ..
                }) = &record.kind
                {
                    stack.push(*shadow_root);
                }
            }
        }
        out
    }

    pub(crate) fn validate_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let (Some(parent_kind), Some(child_kind)) = (self.kind(parent), self.kind(child)) else {
            return Err(DomError::NotFound);
        };
        let hierarchy = DomError::HierarchyRequest { parent, child };
        if !parent_kind.allows_children() {
            return Err(hierarchy);
        }
        if matches!(child_kind, NodeKind::Document | NodeKind::ShadowRoot { .. }) {
            return Err(hierarchy);
        }
        // A host may not be inserted into its own shadow tree.
        let mut current = parent;
        loop {
            if self.is_inclusive_ancestor(child, current) {
                return Err(hierarchy);
            }
            match self.kind(self.root(current)) {
                Some(NodeKind::ShadowRoot { host, .. }) => current = *host,
                _ => break,
            }
        }
        Ok(())
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "child already has a parent");
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Link a parentless `child` under `parent`, before `before` when given.
    pub(crate) fn link(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        let Some(reference) = before else {
            self.append(parent, child);
            return Ok(());
        };
        debug_assert!(self.parent(child).is_none(), "child already has a parent");
        let siblings = &mut self.nodes[parent.index()].children;
        let pos = siblings
            .iter()
            .position(|&sibling| sibling == reference)
            .ok_or(DomError::NotFound)?;
        siblings.insert(pos, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    pub(crate) fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self
            .nodes
            .get_mut(child.index())
            .and_then(|record| record.parent.take())
        else {
            return;
        };
        self.nodes[parent.index()]
            .children
            .retain(|&sibling| sibling != child);
    }
}
