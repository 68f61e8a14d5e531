//! Scoped custom-element registries over a small arena DOM.
//!
//! Tag-to-class bindings live in per-scope registries: markup attached under a
//! shadow root that carries a registry resolves custom tags against that
//! registry, everything else against the document's global one. Upgrades are
//! synchronous and happen at most once per element; observed-attribute
//! callbacks fire in mutation order whichever API changed the attribute.

pub mod attributes;
pub mod config;
pub mod document;
pub mod error;
pub mod mutation;
pub mod registry;
pub mod scope;
pub mod tree;
pub mod upgrade;

mod attr;

pub use crate::attr::AttrId;
pub use crate::attributes::AttributeChange;
pub use crate::config::EngineConfig;
pub use crate::document::Document;
pub use crate::error::{DomError, RegistryError};
pub use crate::mutation::AdjacentPosition;
pub use crate::registry::{
    ConstructorRef, CustomElementClass, DefineOptions, Definition, Registry, RegistryId,
    RegistryStore, is_valid_custom_element_name, same_constructor,
};
pub use crate::tree::{ElementData, NodeId, NodeKind};
pub use crate::upgrade::{ElementState, UpgradeResult};
