//! Error types for descriptor loading and instantiation
//!
//! Component-level operations return [`ComponentError`], which knows the
//! field path inside the component but not which entity or child it belongs
//! to. Entity-level operations wrap it into [`DescriptorError`] with the
//! entity id and the failing child id attached.

use std::path::PathBuf;

use thiserror::Error;

use crate::format::ParseError;
use crate::template::TemplateError;

/// The broad category of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed text
    Parse,
    /// Payload does not match its type's sub-schema
    Schema,
    /// Duplicate id, bad rotation, duplicate entity
    Validation,
    /// Placeholder without substitution
    UnresolvedPlaceholder,
    /// A locator inside a payload or property did not resolve
    ResourceNotFound,
    /// A component reference did not resolve
    NotFound,
    /// Reading a descriptor file failed
    Io,
}

/// Failure of a single component or embedded component
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComponentError {
    /// Payload or property does not match its schema
    #[error("schema error at '{field}': {message}")]
    Schema {
        /// Field path inside the component, e.g. `materials[0].textures[0].texture`
        field: String,
        /// Description of the mismatch
        message: String,
    },

    /// Structurally valid but semantically rejected value
    #[error("{message}")]
    Validation {
        /// Description of the problem
        message: String,
    },

    /// A placeholder in a string field could not be resolved
    #[error("placeholder in '{field}': {source}")]
    UnresolvedPlaceholder {
        /// Field path
        field: String,
        /// Underlying template failure
        source: TemplateError,
    },

    /// A resource locator in a payload or property did not resolve
    #[error("resource '{path}' referenced by '{field}' not found")]
    ResourceNotFound {
        /// Field path
        field: String,
        /// Locator that failed
        path: String,
    },

    /// The referenced component resource does not exist
    #[error("component '{path}' not found")]
    NotFound {
        /// Component locator
        path: String,
    },
}

impl ComponentError {
    /// Create a schema error
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::UnresolvedPlaceholder { .. } => ErrorKind::UnresolvedPlaceholder,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }
}

/// Errors loading, validating or instantiating an entity descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Malformed textual descriptor
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),

    /// Reading a descriptor file failed
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// An embedded payload or property does not match its schema
    #[error("entity '{entity}', component '{component}': schema error at '{field}': {message}")]
    Schema {
        /// Entity id
        entity: String,
        /// Failing child id
        component: String,
        /// Field path inside the child
        field: String,
        /// Description of the mismatch
        message: String,
    },

    /// Duplicate ids, non-normalizable rotations and similar
    #[error("entity '{entity}': {message}")]
    Validation {
        /// Entity id
        entity: String,
        /// Failing child id, when the problem is local to one child
        component: Option<String>,
        /// Description of the problem
        message: String,
    },

    /// Placeholder without substitution
    #[error("entity '{entity}', component '{component}': placeholder in '{field}': {source}")]
    UnresolvedPlaceholder {
        /// Entity id
        entity: String,
        /// Failing child id
        component: String,
        /// Field path inside the child
        field: String,
        /// Underlying template failure
        source: TemplateError,
    },

    /// A payload or property locator did not resolve
    #[error("entity '{entity}', component '{component}': resource '{path}' referenced by '{field}' not found")]
    ResourceNotFound {
        /// Entity id
        entity: String,
        /// Failing child id
        component: String,
        /// Field path inside the child
        field: String,
        /// Locator that failed
        path: String,
    },

    /// A component reference did not resolve
    #[error("entity '{entity}', component '{component}': component '{path}' not found")]
    ComponentNotFound {
        /// Entity id
        entity: String,
        /// Failing child id
        component: String,
        /// Component locator
        path: String,
    },
}

impl DescriptorError {
    /// Attach entity and child ids to a component failure
    pub fn in_component(entity: &str, component: &str, error: ComponentError) -> Self {
        let entity = entity.to_string();
        let component = component.to_string();
        match error {
            ComponentError::Schema { field, message } => Self::Schema { entity, component, field, message },
            ComponentError::Validation { message } => Self::Validation {
                entity,
                message: format!("component '{component}': {message}"),
                component: Some(component),
            },
            ComponentError::UnresolvedPlaceholder { field, source } => {
                Self::UnresolvedPlaceholder { entity, component, field, source }
            }
            ComponentError::ResourceNotFound { field, path } => Self::ResourceNotFound { entity, component, field, path },
            ComponentError::NotFound { path } => Self::ComponentNotFound { entity, component, path },
        }
    }

    /// Entity-level validation failure
    pub fn validation(entity: &str, component: Option<&str>, message: impl Into<String>) -> Self {
        Self::Validation {
            entity: entity.to_string(),
            component: component.map(str::to_string),
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::Parse,
            Self::Io { .. } => ErrorKind::Io,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::UnresolvedPlaceholder { .. } => ErrorKind::UnresolvedPlaceholder,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::ComponentNotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Entity the error belongs to, when known
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::Parse(_) | Self::Io { .. } => None,
            Self::Schema { entity, .. }
            | Self::Validation { entity, .. }
            | Self::UnresolvedPlaceholder { entity, .. }
            | Self::ResourceNotFound { entity, .. }
            | Self::ComponentNotFound { entity, .. } => Some(entity),
        }
    }

    /// Child (component or embedded component) id that failed, when known
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Parse(_) | Self::Io { .. } => None,
            Self::Validation { component, .. } => component.as_deref(),
            Self::Schema { component, .. }
            | Self::UnresolvedPlaceholder { component, .. }
            | Self::ResourceNotFound { component, .. }
            | Self::ComponentNotFound { component, .. } => Some(component),
        }
    }
}
