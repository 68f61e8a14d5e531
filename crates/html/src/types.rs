use std::collections::HashMap;
use std::sync::Arc;

/// Opaque atom identifier, valid only for the table that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Interned tag and attribute names.
///
/// Invariant: ASCII letters are stored in canonical lowercase form for
/// HTML-namespace matching. Non-ASCII code points are preserved as-is.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<Arc<str>>,
    map: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_ascii_lowercase(&mut self, name: &str) -> AtomId {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            let folded = name.to_ascii_lowercase();
            return self.intern_folded(&folded);
        }
        self.intern_folded(name)
    }

    fn intern_folded(&mut self, name: &str) -> AtomId {
        if let Some(id) = self.map.get(name) {
            return *id;
        }
        debug_assert!(self.atoms.len() < u32::MAX as usize, "atom table exhausted");
        let id = AtomId(self.atoms.len() as u32);
        let atom = Arc::<str>::from(name);
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        id
    }

    pub fn resolve(&self, id: AtomId) -> &str {
        &self.atoms[id.0 as usize]
    }

    /// Cloned canonical name, so parsed trees can share the interned storage.
    pub fn resolve_arc(&self, id: AtomId) -> Arc<str> {
        Arc::clone(&self.atoms[id.0 as usize])
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: AtomId,
        attributes: Vec<(AtomId, Option<String>)>,
        self_closing: bool,
    },
    EndTag(AtomId),
    Comment(String),
    Text(String),
}

#[derive(Debug, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    atoms: AtomTable,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, atoms: AtomTable) -> Self {
        Self { tokens, atoms }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

/// A node descriptor produced by fragment parsing.
///
/// Descriptors are detached: they carry no identity and no owner document.
/// Attribute values are always present; a valueless attribute parses to `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, String)>,
        children: Vec<FragmentNode>,
    },
    Text(String),
    Comment(String),
}

impl FragmentNode {
    pub fn element_name(&self) -> Option<&str> {
        match self {
            FragmentNode::Element { name, .. } => Some(name),
            FragmentNode::Text(_) | FragmentNode::Comment(_) => None,
        }
    }

    pub fn children(&self) -> &[FragmentNode] {
        match self {
            FragmentNode::Element { children, .. } => children,
            FragmentNode::Text(_) | FragmentNode::Comment(_) => &[],
        }
    }
}
