use crate::attr::AttrId;
use crate::registry::RegistryId;
use crate::tree::NodeId;
use std::fmt;

/// Failures of `define` and other registry operations.
///
/// A failed definition leaves the registry and every prior upgrade untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    AlreadyDefined { registry: RegistryId, tag_name: String },
    InvalidName(String),
    ConstructorInUse { registry: RegistryId, tag_name: String },
    UnknownRegistry(RegistryId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyDefined { registry, tag_name } => {
                write!(f, "'{tag_name}' is already defined in {registry}")
            }
            RegistryError::InvalidName(name) => {
                write!(f, "'{name}' is not a valid custom element name")
            }
            RegistryError::ConstructorInUse { registry, tag_name } => {
                write!(
                    f,
                    "constructor is already used by '{tag_name}' in {registry}"
                )
            }
            RegistryError::UnknownRegistry(registry) => write!(f, "unknown {registry}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// DOM-level failures, named after the platform exceptions they stand for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    NotAnElement(NodeId),
    NotFound,
    InUseAttribute(AttrId),
    InvalidCharacter(String),
    HierarchyRequest { parent: NodeId, child: NodeId },
    NotSupported(&'static str),
    RegistryInUse(RegistryId),
    Syntax(String),
    NoModificationAllowed(NodeId),
    Registry(RegistryError),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::NotAnElement(node) => write!(f, "{node:?} is not an element"),
            DomError::NotFound => f.write_str("the object can not be found here"),
            DomError::InUseAttribute(attr) => {
                write!(f, "{attr:?} is already in use by another element")
            }
            DomError::InvalidCharacter(name) => {
                write!(f, "'{name}' contains an invalid character")
            }
            DomError::HierarchyRequest { parent, child } => {
                write!(f, "cannot insert {child:?} into {parent:?}")
            }
            DomError::NotSupported(what) => write!(f, "not supported: {what}"),
            DomError::RegistryInUse(registry) => {
                write!(f, "{registry} is already associated with a shadow root")
            }
            DomError::Syntax(input) => write!(f, "'{input}' is not a valid value"),
            DomError::NoModificationAllowed(node) => {
                write!(f, "{node:?} has no parent element to insert next to")
            }
            DomError::Registry(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for DomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DomError::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for DomError {
    fn from(err: RegistryError) -> Self {
        DomError::Registry(err)
    }
}
