use crate::tree::NodeId;
use std::sync::Arc;

/// Handle to an attribute node.
///
/// The element's attribute list and every `AttrId` held by callers address the
/// same cell, so a write through either path is visible to both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(u32);

#[derive(Debug)]
pub(crate) struct Attr {
    pub(crate) name: Arc<str>,
    pub(crate) value: String,
    pub(crate) owner: Option<NodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct AttrArena {
    attrs: Vec<Attr>,
}

impl AttrArena {
    pub(crate) fn push(&mut self, name: Arc<str>, value: String, owner: Option<NodeId>) -> AttrId {
        let id = AttrId(self.attrs.len() as u32);
        self.attrs.push(Attr { name, value, owner });
        id
    }

    /// Cell behind an id taken from an element's list, which always exists.
    pub(crate) fn get(&self, id: AttrId) -> &Attr {
        &self.attrs[id.0 as usize]
    }

    pub(crate) fn get_mut(&mut self, id: AttrId) -> &mut Attr {
        &mut self.attrs[id.0 as usize]
    }

    /// Cell behind a caller-held id, `None` when this arena never minted it.
    pub(crate) fn lookup(&self, id: AttrId) -> Option<&Attr> {
        self.attrs.get(id.0 as usize)
    }

    pub(crate) fn lookup_mut(&mut self, id: AttrId) -> Option<&mut Attr> {
        self.attrs.get_mut(id.0 as usize)
    }

    /// Find the attribute named `name` among `list`.
    pub(crate) fn find(&self, list: &[AttrId], name: &str) -> Option<(usize, AttrId)> {
        list.iter()
            .enumerate()
            .find(|(_, id)| &*self.get(**id).name == name)
            .map(|(pos, id)| (pos, *id))
    }
}
