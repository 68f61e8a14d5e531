//! Tree mutation and the markup entry points built on it.
//!
//! Insertion runs the connected hook for upgraded elements that become
//! connected, and retries upgrades for plain ones. Removal from a connected tree
//! runs the disconnected hook. Markup is always parsed into a detached fragment
//! first, so its elements are created plain and upgraded in tree order once they
//! land under a document or shadow root.

use crate::document::Document;
use crate::error::DomError;
use crate::tree::{ElementData, NodeId, NodeKind};
use html::FragmentNode;
use html::serialize::{
    is_rawtext_element, is_void_element, push_comment, push_end_tag, push_escaped_text,
    push_start_tag,
};
use std::str::FromStr;
use std::sync::Arc;

/// Where `insert_adjacent_html` places its nodes relative to the element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjacentPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl FromStr for AdjacentPosition {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("beforebegin") {
            Ok(AdjacentPosition::BeforeBegin)
        } else if s.eq_ignore_ascii_case("afterbegin") {
            Ok(AdjacentPosition::AfterBegin)
        } else if s.eq_ignore_ascii_case("beforeend") {
            Ok(AdjacentPosition::BeforeEnd)
        } else if s.eq_ignore_ascii_case("afterend") {
            Ok(AdjacentPosition::AfterEnd)
        } else {
            Err(DomError::Syntax(s.to_string()))
        }
    }
}

impl Document {
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId, DomError> {
        let upgrade = self.config.upgrade_on_insertion;
        self.insert(parent, node, None, upgrade)?;
        Ok(node)
    }

    /// Insert `node` before `reference`, or append when `reference` is `None`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        let upgrade = self.config.upgrade_on_insertion;
        self.insert(parent, node, reference, upgrade)?;
        Ok(node)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        if self.nodes.parent(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.remove(child);
        Ok(child)
    }

    /// Replace the children of `node` with the parsed `markup`.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        match self.nodes.kind(node) {
            None => return Err(DomError::NotFound),
            Some(NodeKind::Document | NodeKind::Text(_) | NodeKind::Comment(_)) => {
                return Err(DomError::NotSupported("innerHTML needs an element or shadow root"));
            }
            Some(_) => {}
        }
        let fragment = self.parse_into_fragment(markup);
        for child in self.nodes.children(node).to_vec() {
            self.remove(child);
        }
        self.insert(node, fragment, None, true)?;
        log::trace!(target: "custom_elements.mutation", "innerHTML replaced children of {node:?}");
        Ok(())
    }

    /// Parse `markup` and insert it relative to `element`.
    ///
    /// `beforebegin` and `afterend` need a parent other than the document node.
    pub fn insert_adjacent_html(
        &mut self,
        element: NodeId,
        position: &str,
        markup: &str,
    ) -> Result<(), DomError> {
        let position: AdjacentPosition = position.parse()?;
        if !self.nodes.is_element(element) {
            return Err(DomError::NotAnElement(element));
        }
        let (parent, reference) = match position {
            AdjacentPosition::BeforeBegin => (self.outer_parent(element)?, Some(element)),
            AdjacentPosition::AfterBegin => {
                (element, self.nodes.children(element).first().copied())
            }
            AdjacentPosition::BeforeEnd => (element, None),
            AdjacentPosition::AfterEnd => {
                (self.outer_parent(element)?, self.nodes.next_sibling(element))
            }
        };
        let fragment = self.parse_into_fragment(markup);
        self.insert(parent, fragment, reference, true)?;
        log::trace!(
            target: "custom_elements.mutation",
            "insertAdjacentHTML {position:?} on {element:?}"
        );
        Ok(())
    }

    /// Serialization of the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        let rawtext = self
            .nodes
            .element(node)
            .is_some_and(|data| is_rawtext_element(&data.local_name));
        for &child in self.nodes.children(node) {
            self.serialize_node(&mut out, child, rawtext);
        }
        out
    }

    /// Serialization of `node` itself, including its children.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.serialize_node(&mut out, node, false);
        out
    }

    fn outer_parent(&self, element: NodeId) -> Result<NodeId, DomError> {
        match self.nodes.parent(element) {
            Some(parent) if parent != self.document_node() => Ok(parent),
            _ => Err(DomError::NoModificationAllowed(element)),
        }
    }

    fn insert(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
        attempt_upgrade: bool,
    ) -> Result<(), DomError> {
        self.nodes.validate_insertion(parent, node)?;
        if let Some(reference) = reference {
            if self.nodes.parent(reference) != Some(parent) {
                return Err(DomError::NotFound);
            }
        }
        let reference = match reference {
            Some(reference) if reference == node => self.nodes.next_sibling(node),
            other => other,
        };

        // Subtrees taken from a root without a registry were deferred and always retry.
        let attempt_upgrade = attempt_upgrade || self.governing_registry(node).is_none();

        let inserted = if matches!(self.nodes.kind(node), Some(NodeKind::DocumentFragment)) {
            let children = self.nodes.children(node).to_vec();
            for &child in &children {
                self.nodes.unlink(child);
            }
            children
        } else {
            if self.nodes.parent(node).is_some() {
                self.remove(node);
            }
            vec![node]
        };

        for &child in &inserted {
            self.nodes.link(parent, child, reference)?;
        }
        log::trace!(
            target: "custom_elements.mutation",
            "inserted {} node(s) into {parent:?}",
            inserted.len()
        );
        for child in inserted {
            self.run_insertion_steps(child, attempt_upgrade);
        }
        Ok(())
    }

    fn remove(&mut self, node: NodeId) {
        let was_connected = self.is_connected(node);
        self.nodes.unlink(node);
        if !was_connected {
            return;
        }
        for id in self.nodes.inclusive_descendants(node, true) {
            if let Some(definition) = self.definition(id) {
                definition.constructor().disconnected(id);
            }
        }
    }

    fn run_insertion_steps(&mut self, node: NodeId, attempt_upgrade: bool) {
        let connected = self.is_connected(node);
        for id in self.nodes.inclusive_descendants(node, true) {
            let Some(data) = self.nodes.element(id) else {
                continue;
            };
            match data.state.definition().cloned() {
                Some(definition) if connected => definition.constructor().connected(id),
                Some(_) => {}
                None if attempt_upgrade => {
                    self.try_upgrade(id);
                }
                None => {}
            }
        }
    }

    /// Materialize parsed markup as a detached fragment owned by this document.
    fn parse_into_fragment(&mut self, markup: &str) -> NodeId {
        let parsed = html::parse_fragment(markup, &self.config.fragment);
        let fragment = self.create_document_fragment();
        for node in &parsed {
            self.build_node(fragment, node);
        }
        fragment
    }

    fn build_node(&mut self, parent: NodeId, node: &FragmentNode) {
        let id = match node {
            FragmentNode::Element {
                name,
                attributes,
                children,
            } => {
                let id = self
                    .nodes
                    .push(NodeKind::Element(ElementData::new(Arc::clone(name))));
                for (attribute, value) in attributes {
                    let attr = self.attrs.push(Arc::clone(attribute), value.clone(), Some(id));
                    self.push_attribute(id, attr);
                }
                for child in children {
                    self.build_node(id, child);
                }
                id
            }
            FragmentNode::Text(text) => self.create_text_node(text),
            FragmentNode::Comment(text) => self.create_comment(text),
        };
        self.nodes.append(parent, id);
    }

    fn serialize_node(&self, out: &mut String, node: NodeId, rawtext_parent: bool) {
        let Some(kind) = self.nodes.kind(node) else {
            return;
        };
        match kind {
            NodeKind::Element(data) => {
                let name = data.local_name();
                push_start_tag(
                    out,
                    name,
                    data.attributes.iter().map(|&attr| {
                        let attr = self.attrs.get(attr);
                        (attr.name.as_ref(), attr.value.as_str())
                    }),
                );
                if is_void_element(name) {
                    return;
                }
                let rawtext = is_rawtext_element(name);
                for &child in self.nodes.children(node) {
                    self.serialize_node(out, child, rawtext);
                }
                push_end_tag(out, name);
            }
            NodeKind::Text(text) if rawtext_parent => out.push_str(text),
            NodeKind::Text(text) => push_escaped_text(out, text),
            NodeKind::Comment(text) => push_comment(out, text),
            NodeKind::Document | NodeKind::DocumentFragment | NodeKind::ShadowRoot { .. } => {
                for &child in self.nodes.children(node) {
                    self.serialize_node(out, child, false);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_positions_parse_case_insensitively() {
        assert_eq!("beforeBegin".parse(), Ok(AdjacentPosition::BeforeBegin));
        assert_eq!("AFTEREND".parse(), Ok(AdjacentPosition::AfterEnd));
        assert_eq!(
            "middle".parse::<AdjacentPosition>(),
            Err(DomError::Syntax("middle".to_string()))
        );
    }

    #[test]
    fn inner_html_round_trips_through_the_tree() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_inner_html(body, r#"<p class="a">x &amp; y</p><!--c--><br><script>a<b</script>"#)
            .unwrap();
        assert_eq!(
            doc.inner_html(body),
            r#"<p class="a">x &amp; y</p><!--c--><br><script>a<b</script>"#
        );
        let p = doc.first_element_child(body).unwrap();
        assert_eq!(doc.outer_html(p), r#"<p class="a">x &amp; y</p>"#);
        assert_eq!(doc.get_attribute(p, "class"), Some("a"));
        assert_eq!(doc.owner_element(doc.attributes(p)[0]), Some(p));
    }

    #[test]
    fn set_inner_html_replaces_previous_children() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_inner_html(body, "<i></i><b></b>").unwrap();
        let old = doc.first_element_child(body).unwrap();
        doc.set_inner_html(body, "text").unwrap();
        assert_eq!(doc.inner_html(body), "text");
        assert_eq!(doc.parent(old), None);

        let text = doc.children(body)[0];
        assert!(matches!(
            doc.set_inner_html(text, "<p></p>"),
            Err(DomError::NotSupported(_))
        ));
    }

    #[test]
    fn insert_adjacent_html_positions() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_inner_html(body, "<div><p></p></div>").unwrap();
        let div = doc.first_element_child(body).unwrap();

        doc.insert_adjacent_html(div, "beforebegin", "<a></a>").unwrap();
        doc.insert_adjacent_html(div, "afterbegin", "<b></b>").unwrap();
        doc.insert_adjacent_html(div, "beforeend", "<i></i>").unwrap();
        doc.insert_adjacent_html(div, "afterend", "<s></s>").unwrap();
        assert_eq!(
            doc.inner_html(body),
            "<a></a><div><b></b><p></p><i></i></div><s></s>"
        );

        let html = doc.document_element();
        assert_eq!(
            doc.insert_adjacent_html(html, "afterend", "<a></a>"),
            Err(DomError::NoModificationAllowed(html))
        );
        let detached = doc.create_element("div").unwrap();
        assert_eq!(
            doc.insert_adjacent_html(detached, "beforebegin", "<a></a>"),
            Err(DomError::NoModificationAllowed(detached))
        );
        assert!(matches!(
            doc.insert_adjacent_html(div, "inside", ""),
            Err(DomError::Syntax(_))
        ));
    }

    #[test]
    fn insert_before_and_remove_child() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(body, b).unwrap();
        doc.insert_before(body, a, Some(b)).unwrap();
        assert_eq!(doc.children(body), &[a, b]);

        let stray = doc.create_element("i").unwrap();
        assert_eq!(doc.insert_before(body, stray, Some(stray)), Err(DomError::NotFound));
        assert_eq!(doc.remove_child(body, stray), Err(DomError::NotFound));
        assert_eq!(doc.remove_child(body, a), Ok(a));
        assert_eq!(doc.children(body), &[b]);
    }

    #[test]
    fn appending_moves_fragment_children() {
        let mut doc = Document::new();
        let fragment = doc.create_document_fragment();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.append_child(fragment, a).unwrap();
        doc.append_child(fragment, b).unwrap();

        let body = doc.body();
        doc.append_child(body, fragment).unwrap();
        assert!(doc.children(fragment).is_empty());
        assert_eq!(doc.children(body), &[a, b]);
        assert!(doc.is_connected(a));
    }

    #[test]
    fn nodes_from_another_document_are_not_found() {
        let mut other = Document::new();
        let foreign = (0..16)
            .map(|_| other.create_element("x-foo").unwrap())
            .last()
            .unwrap();

        let mut doc = Document::new();
        let body = doc.body();
        assert_eq!(doc.append_child(body, foreign), Err(DomError::NotFound));
        assert_eq!(doc.append_child(foreign, body), Err(DomError::NotFound));
        assert_eq!(doc.set_inner_html(foreign, "<p></p>"), Err(DomError::NotFound));
        assert_eq!(
            doc.insert_adjacent_html(foreign, "afterbegin", "<p></p>"),
            Err(DomError::NotAnElement(foreign))
        );
        assert_eq!(doc.remove_child(body, foreign), Err(DomError::NotFound));
        assert_eq!(doc.inner_html(foreign), "");
        assert_eq!(doc.outer_html(foreign), "");
        assert!(doc.node_kind(foreign).is_none());
        assert!(!doc.is_connected(foreign));
        assert_eq!(doc.governing_registry(foreign), None);
        assert_eq!(doc.try_upgrade(foreign), crate::upgrade::UpgradeResult::NotDefined);
    }

    #[test]
    fn rejects_hierarchy_violations() {
        let mut doc = Document::new();
        let body = doc.body();
        let html = doc.document_element();
        assert!(matches!(
            doc.append_child(body, html),
            Err(DomError::HierarchyRequest { .. })
        ));
    }
}
