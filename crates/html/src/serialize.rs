//! Serialization helpers shared by the host serializer and DOM implementations
//! that keep their own node storage.

use crate::types::FragmentNode;

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose text children are parsed and serialized verbatim.
pub fn is_rawtext_element(name: &str) -> bool {
    matches!(name, "script" | "style")
}

pub fn push_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

pub fn push_escaped_attribute(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

pub fn push_start_tag<'a, I>(out: &mut String, name: &str, attributes: I)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    out.push('<');
    out.push_str(name);
    for (attribute, value) in attributes {
        out.push(' ');
        out.push_str(attribute);
        out.push_str("=\"");
        push_escaped_attribute(out, value);
        out.push('"');
    }
    out.push('>');
}

pub fn push_end_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

pub fn push_comment(out: &mut String, text: &str) {
    out.push_str("<!--");
    out.push_str(text);
    out.push_str("-->");
}

/// Serialize a parsed forest back to markup.
pub fn serialize_fragment(nodes: &[FragmentNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, false);
    }
    out
}

fn write_node(out: &mut String, node: &FragmentNode, rawtext_parent: bool) {
    match node {
        FragmentNode::Element {
            name,
            attributes,
            children,
        } => {
            push_start_tag(
                out,
                name,
                attributes.iter().map(|(k, v)| (k.as_ref(), v.as_str())),
            );
            if is_void_element(name) {
                return;
            }
            let rawtext = is_rawtext_element(name);
            for child in children {
                write_node(out, child, rawtext);
            }
            push_end_tag(out, name);
        }
        FragmentNode::Text(text) if rawtext_parent => out.push_str(text),
        FragmentNode::Text(text) => push_escaped_text(out, text),
        FragmentNode::Comment(text) => push_comment(out, text),
    }
}
