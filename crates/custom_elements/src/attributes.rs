//! Attribute access paths and the change tracker behind them.
//!
//! Every mutation computes the value immediately before and after the call.
//! When the owning element is upgraded and the name is observed, the change is
//! appended to the element's log and delivered to `attribute_changed`, in the
//! order the mutations happened. Attribute nodes alias the element's storage:
//! writing through `set_attr_value` is indistinguishable from `set_attribute`.

use crate::attr::AttrId;
use crate::document::Document;
use crate::error::DomError;
use crate::tree::NodeId;
use crate::upgrade::ElementState;
use std::rc::Rc;
use std::sync::Arc;

/// One observed-attribute callback: `(name, old_value, new_value)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeChange {
    pub name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl AttributeChange {
    pub fn new(name: &str, old_value: Option<&str>, new_value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            old_value: old_value.map(str::to_string),
            new_value: new_value.map(str::to_string),
        }
    }
}

/// Validate a tag or attribute name and fold it to ASCII lowercase.
pub(crate) fn html_name(name: &str) -> Result<Arc<str>, DomError> {
    let invalid = name.is_empty()
        || name.chars().any(|c| {
            c.is_ascii_whitespace() || matches!(c, '/' | '>' | '<' | '=' | '"' | '\'' | '\0')
        });
    if invalid {
        return Err(DomError::InvalidCharacter(name.to_string()));
    }
    Ok(Arc::from(name.to_ascii_lowercase()))
}

impl Document {
    fn element_attributes(&self, element: NodeId) -> Result<&[AttrId], DomError> {
        self.nodes
            .element(element)
            .map(|data| data.attributes.as_slice())
            .ok_or(DomError::NotAnElement(element))
    }

    fn find_attribute(&self, element: NodeId, name: &str) -> Option<(usize, AttrId)> {
        let list = self.nodes.element(element)?.attributes.as_slice();
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            return self.attrs.find(list, &name.to_ascii_lowercase());
        }
        self.attrs.find(list, name)
    }

    /// Snapshot of the element's attribute nodes, in order.
    pub fn attributes(&self, element: NodeId) -> Vec<AttrId> {
        self.element_attributes(element)
            .map(<[AttrId]>::to_vec)
            .unwrap_or_default()
    }

    pub fn get_attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        let (_, attr) = self.find_attribute(element, name)?;
        Some(self.attrs.get(attr).value.as_str())
    }

    pub fn has_attribute(&self, element: NodeId, name: &str) -> bool {
        self.find_attribute(element, name).is_some()
    }

    pub fn get_attribute_node(&self, element: NodeId, name: &str) -> Option<AttrId> {
        self.find_attribute(element, name).map(|(_, attr)| attr)
    }

    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.element_attributes(element)?;
        let name = html_name(name)?;
        match self.find_attribute(element, &name) {
            Some((_, attr)) => {
                let cell = self.attrs.get_mut(attr);
                let old = std::mem::replace(&mut cell.value, value.to_string());
                self.record_attribute_change(element, &name, Some(old), Some(value.to_string()));
            }
            None => {
                let attr = self
                    .attrs
                    .push(Arc::clone(&name), value.to_string(), Some(element));
                self.push_attribute(element, attr);
                self.record_attribute_change(element, &name, None, Some(value.to_string()));
            }
        }
        Ok(())
    }

    /// Remove `name` if present. Absent attributes produce no callback.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> Result<(), DomError> {
        self.element_attributes(element)?;
        if let Some((pos, attr)) = self.find_attribute(element, name) {
            self.detach_attribute(element, pos, attr);
        }
        Ok(())
    }

    /// Platform `toggleAttribute`: returns whether the attribute is present afterwards.
    pub fn toggle_attribute(
        &mut self,
        element: NodeId,
        name: &str,
        force: Option<bool>,
    ) -> Result<bool, DomError> {
        self.element_attributes(element)?;
        let name = html_name(name)?;
        match (self.find_attribute(element, &name), force) {
            (None, Some(false)) => Ok(false),
            (None, _) => {
                self.set_attribute(element, &name, "")?;
                Ok(true)
            }
            (Some(_), Some(true)) => Ok(true),
            (Some((pos, attr)), _) => {
                self.detach_attribute(element, pos, attr);
                Ok(false)
            }
        }
    }

    /// Create a detached attribute node with an empty value.
    pub fn create_attribute(&mut self, name: &str) -> Result<AttrId, DomError> {
        let name = html_name(name)?;
        Ok(self.attrs.push(name, String::new(), None))
    }

    /// `None` when `attr` was not created by this document.
    pub fn attr_name(&self, attr: AttrId) -> Option<&str> {
        self.attrs.lookup(attr).map(|cell| &*cell.name)
    }

    pub fn attr_value(&self, attr: AttrId) -> Option<&str> {
        self.attrs.lookup(attr).map(|cell| cell.value.as_str())
    }

    pub fn owner_element(&self, attr: AttrId) -> Option<NodeId> {
        self.attrs.lookup(attr)?.owner
    }

    /// Write through an attribute node. Attached nodes notify their owner.
    pub fn set_attr_value(&mut self, attr: AttrId, value: &str) -> Result<(), DomError> {
        let cell = self.attrs.lookup_mut(attr).ok_or(DomError::NotFound)?;
        let old = std::mem::replace(&mut cell.value, value.to_string());
        let Some(owner) = cell.owner else {
            return Ok(());
        };
        let name = Arc::clone(&cell.name);
        self.record_attribute_change(owner, &name, Some(old), Some(value.to_string()));
        Ok(())
    }

    /// Attach `attr` to `element`, replacing a same-named attribute in place.
    ///
    /// Returns the replaced node, which becomes detached.
    pub fn set_attribute_node(
        &mut self,
        element: NodeId,
        attr: AttrId,
    ) -> Result<Option<AttrId>, DomError> {
        self.element_attributes(element)?;
        let cell = self.attrs.lookup_mut(attr).ok_or(DomError::NotFound)?;
        match cell.owner {
            Some(owner) if owner == element => return Ok(Some(attr)),
            Some(_) => return Err(DomError::InUseAttribute(attr)),
            None => {}
        }
        cell.owner = Some(element);
        let name = Arc::clone(&cell.name);
        let new_value = cell.value.clone();

        let replaced = self.find_attribute(element, &name);
        let old_value = match replaced {
            Some((pos, previous)) => {
                if let Some(data) = self.nodes.element_mut(element) {
                    data.attributes[pos] = attr;
                }
                let previous_cell = self.attrs.get_mut(previous);
                previous_cell.owner = None;
                Some(previous_cell.value.clone())
            }
            None => {
                self.push_attribute(element, attr);
                None
            }
        };
        self.record_attribute_change(element, &name, old_value, Some(new_value));
        Ok(replaced.map(|(_, previous)| previous))
    }

    pub fn remove_attribute_node(
        &mut self,
        element: NodeId,
        attr: AttrId,
    ) -> Result<AttrId, DomError> {
        let pos = self
            .element_attributes(element)?
            .iter()
            .position(|&candidate| candidate == attr)
            .ok_or(DomError::NotFound)?;
        self.detach_attribute(element, pos, attr);
        Ok(attr)
    }

    /// The ordered change log of an element.
    pub fn changed_attributes(&self, element: NodeId) -> &[AttributeChange] {
        self.nodes
            .element(element)
            .map(|data| data.changed_attributes.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn push_attribute(&mut self, element: NodeId, attr: AttrId) {
        if let Some(data) = self.nodes.element_mut(element) {
            data.attributes.push(attr);
        }
    }

    fn detach_attribute(&mut self, element: NodeId, pos: usize, attr: AttrId) {
        if let Some(data) = self.nodes.element_mut(element) {
            data.attributes.remove(pos);
        }
        let cell = self.attrs.get_mut(attr);
        cell.owner = None;
        let name = Arc::clone(&cell.name);
        let old = cell.value.clone();
        self.record_attribute_change(element, &name, Some(old), None);
    }

    pub(crate) fn record_attribute_change(
        &mut self,
        element: NodeId,
        name: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        let definition = match self.nodes.element(element).map(|data| &data.state) {
            Some(ElementState::Upgraded(definition)) if definition.is_observed(name) => {
                Rc::clone(definition)
            }
            _ => return,
        };
        let change = AttributeChange {
            name: name.to_string(),
            old_value,
            new_value,
        };
        log::trace!(
            target: "custom_elements.attributes",
            "<{}> {:?}: {:?} -> {:?}",
            definition.tag_name(),
            change.name,
            change.old_value,
            change.new_value
        );
        definition.constructor().attribute_changed(element, &change);
        if let Some(data) = self.nodes.element_mut(element) {
            data.changed_attributes.push(change);
        }
    }
}
