//! Textual descriptor format
//!
//! Reading ([`Deserializer`]) and writing ([`serialize`]) of entity
//! descriptors in the engine's protobuf-style text layout.

pub mod error;
pub(crate) mod lexer;
pub mod parser;
pub mod writer;

pub use error::{ParseError, ParseErrorKind};
pub use parser::Deserializer;
pub use writer::serialize;

use crate::components::SchemaRegistry;
use crate::entity::EntityDescriptor;
use crate::error::DescriptorError;

/// Parse a descriptor against the built-in schemas
pub fn deserialize(text: &str) -> Result<EntityDescriptor, DescriptorError> {
    Deserializer::new(SchemaRegistry::builtin()).deserialize(text)
}
