//! Fragment parsing: markup string in, detached forest of node descriptors out.
//!
//! This is the host-parser contract consumed by DOM implementations for
//! `innerHTML` and `insertAdjacentHTML`. It never fails. Doctype tokens are
//! dropped, unmatched end tags are ignored, and elements left open at the end
//! of input are closed implicitly.

use crate::serialize::is_void_element;
use crate::tokenizer::tokenize;
use crate::types::{FragmentNode, Token};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentConfig {
    /// Open elements beyond this depth are attached as leaves; their content
    /// flattens into the deepest open element.
    pub max_depth: usize,
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}

struct OpenElement {
    name: Arc<str>,
    attributes: Vec<(Arc<str>, String)>,
    children: Vec<FragmentNode>,
}

impl OpenElement {
    fn close(self) -> FragmentNode {
        FragmentNode::Element {
            name: self.name,
            attributes: self.attributes,
            children: self.children,
        }
    }
}

pub fn parse_fragment(markup: &str, config: &FragmentConfig) -> Vec<FragmentNode> {
    let stream = tokenize(markup);
    let atoms = stream.atoms();
    let mut roots: Vec<FragmentNode> = Vec::new();
    let mut open: Vec<OpenElement> = Vec::new();

    fn current<'s>(
        roots: &'s mut Vec<FragmentNode>,
        open: &'s mut [OpenElement],
    ) -> &'s mut Vec<FragmentNode> {
        match open.last_mut() {
            Some(parent) => &mut parent.children,
            None => roots,
        }
    }

    for token in stream.iter() {
        match token {
            Token::Doctype(_) => {}
            Token::Comment(text) => {
                current(&mut roots, &mut open).push(FragmentNode::Comment(text.clone()));
            }
            Token::Text(text) => {
                let siblings = current(&mut roots, &mut open);
                match siblings.last_mut() {
                    Some(FragmentNode::Text(previous)) => previous.push_str(text),
                    _ => siblings.push(FragmentNode::Text(text.clone())),
                }
            }
            Token::StartTag {
                name, attributes, ..
            } => {
                let element = OpenElement {
                    name: atoms.resolve_arc(*name),
                    attributes: attributes
                        .iter()
                        .map(|(k, v)| (atoms.resolve_arc(*k), v.clone().unwrap_or_default()))
                        .collect(),
                    children: Vec::new(),
                };
                // The self-closing flag is ignored for non-void HTML elements.
                if is_void_element(&element.name) {
                    current(&mut roots, &mut open).push(element.close());
                } else if open.len() >= config.max_depth {
                    log::trace!(
                        target: "html.fragment",
                        "depth limit {} reached at <{}>",
                        config.max_depth,
                        element.name
                    );
                    current(&mut roots, &mut open).push(element.close());
                } else {
                    open.push(element);
                }
            }
            Token::EndTag(name) => {
                let target = atoms.resolve(*name);
                let Some(depth) = open.iter().rposition(|e| &*e.name == target) else {
                    continue;
                };
                while open.len() > depth {
                    close_top(&mut roots, &mut open);
                }
            }
        }
    }
    while !open.is_empty() {
        close_top(&mut roots, &mut open);
    }

    log::trace!(
        target: "html.fragment",
        "parsed fragment: {} bytes, {} top-level nodes",
        markup.len(),
        roots.len()
    );
    roots
}

fn close_top(roots: &mut Vec<FragmentNode>, open: &mut Vec<OpenElement>) {
    let Some(element) = open.pop() else {
        return;
    };
    let node = element.close();
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::serialize_fragment;

    fn parse(markup: &str) -> Vec<FragmentNode> {
        parse_fragment(markup, &FragmentConfig::default())
    }

    #[test]
    fn parses_nested_custom_elements() {
        let nodes = parse("<x-outer a=1><x-inner>hi</x-inner></x-outer>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].element_name(), Some("x-outer"));
        let inner = &nodes[0].children()[0];
        assert_eq!(inner.element_name(), Some("x-inner"));
        assert_eq!(inner.children(), &[FragmentNode::Text("hi".to_string())]);
    }

    #[test]
    fn valueless_attribute_is_empty_string() {
        let nodes = parse("<x-foo foo></x-foo>");
        let FragmentNode::Element { attributes, .. } = &nodes[0] else {
            panic!("expected element, got: {nodes:?}");
        };
        assert_eq!(attributes, &[(Arc::<str>::from("foo"), String::new())]);
    }

    #[test]
    fn self_closing_custom_element_is_not_void() {
        let nodes = parse("<x-foo/><span></span>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children()[0].element_name(), Some("span"));
    }

    #[test]
    fn unmatched_end_tags_are_ignored_and_open_elements_close() {
        let nodes = parse("</p><div><span>a</div>b");
        assert_eq!(serialize_fragment(&nodes), "<div><span>a</span></div>b");
    }

    #[test]
    fn depth_limit_flattens_content() {
        let config = FragmentConfig { max_depth: 2 };
        let nodes = parse_fragment("<a-a><b-b><c-c>x</c-c></b-b></a-a>", &config);
        assert_eq!(
            serialize_fragment(&nodes),
            "<a-a><b-b><c-c></c-c>x</b-b></a-a>"
        );
    }

    #[test]
    fn doctype_is_dropped() {
        let nodes = parse("<!doctype html><p>x</p>");
        assert_eq!(serialize_fragment(&nodes), "<p>x</p>");
    }
}
