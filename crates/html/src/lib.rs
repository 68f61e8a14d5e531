//! Host-side HTML parsing and serialization.
//!
//! DOM implementations consume this crate through `parse_fragment` and the
//! `serialize` helpers; tokenization details stay internal.

pub mod fragment;
pub mod serialize;

mod entities;
mod tokenizer;
mod types;

pub use crate::fragment::{FragmentConfig, parse_fragment};
pub use crate::serialize::{is_rawtext_element, is_void_element, serialize_fragment};
pub use crate::tokenizer::{Tokenizer, tokenize};
pub use crate::types::{AtomId, AtomTable, FragmentNode, Token, TokenStream};
