//! Error types for strategy resolution and metadata configuration.
//!
//! Instantiation has one cause type, [`InstantiationError`], reported through
//! two distinct wrappers so callers can tell the two stages apart:
//!
//! - [`BindingFailure`]: a mapper or field-resolver factory could not be
//!   created, so the domain type cannot be bound to the message type at all.
//! - [`FieldResolutionFailure`]: a converter, null-value inspector, or
//!   default-value provider could not be created, so one field cannot be
//!   processed. Whether that aborts the whole conversion is up to the engine.
//!
//! A panic raised inside a registered constructor function is not part of
//! this taxonomy. It unwinds through the resolver untouched: it is a defect in
//! the strategy implementation, not a resolution failure.
//!
//! [`CatalogError`] covers invalid metadata detected while a
//! [`crate::MetadataCatalog`] is built or loaded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ClassName, FieldName, TypeName};

// ---------------------------------------------------------------------------
// Instantiation causes
// ---------------------------------------------------------------------------

/// Coarse classification of an [`InstantiationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The class cannot be constructed with the requested constructor shape.
    Instantiation,
    /// A suitable constructor exists but is not public.
    Access,
}

/// Why a strategy class could not be instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InstantiationError {
    /// No class with this designator is registered for the requested capability.
    #[error("Strategy class {class} is not registered.")]
    UnknownClass {
        /// The designator that was looked up.
        class: ClassName,
    },

    /// The class is abstract or declares no zero-argument constructor.
    #[error("Default constructor not found.")]
    ConstructorNotFound {
        /// The class that could not be constructed.
        class: ClassName,
    },

    /// The selected constructor exists but its visibility is restricted.
    #[error("Make default constructor public for {class}")]
    ConstructorNotAccessible {
        /// The class whose constructor is not public.
        class: ClassName,
    },
}

impl InstantiationError {
    /// Returns the class designator the failure relates to.
    pub fn class(&self) -> &ClassName {
        match self {
            Self::UnknownClass { class }
            | Self::ConstructorNotFound { class }
            | Self::ConstructorNotAccessible { class } => class,
        }
    }

    /// Returns whether this is an instantiation or an access failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnknownClass { .. } | Self::ConstructorNotFound { .. } => {
                FailureKind::Instantiation
            }
            Self::ConstructorNotAccessible { .. } => FailureKind::Access,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage wrappers
// ---------------------------------------------------------------------------

/// A type-level binding could not be established.
///
/// Produced when the mapper or field-resolver factory named by a
/// [`crate::TypeAssociation`] cannot be instantiated. No partial mapping of
/// the type should be attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{cause}")]
pub struct BindingFailure {
    cause: InstantiationError,
}

impl BindingFailure {
    /// Returns the underlying instantiation cause.
    pub fn cause(&self) -> &InstantiationError {
        &self.cause
    }

    /// Shorthand for `self.cause().kind()`.
    pub fn kind(&self) -> FailureKind {
        self.cause.kind()
    }
}

impl From<InstantiationError> for BindingFailure {
    fn from(cause: InstantiationError) -> Self {
        Self { cause }
    }
}

/// A single field's strategies could not be resolved.
///
/// Produced when the converter, null-value inspector, or default-value
/// provider named by a [`crate::FieldAssociation`] cannot be instantiated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{cause}")]
pub struct FieldResolutionFailure {
    field: Option<FieldName>,
    cause: InstantiationError,
}

impl FieldResolutionFailure {
    /// Attaches the name of the field being processed.
    pub fn for_field(mut self, field: FieldName) -> Self {
        self.field = Some(field);
        self
    }

    /// The field being processed, when known.
    pub fn field(&self) -> Option<&FieldName> {
        self.field.as_ref()
    }

    /// Returns the underlying instantiation cause.
    pub fn cause(&self) -> &InstantiationError {
        &self.cause
    }

    /// Shorthand for `self.cause().kind()`.
    pub fn kind(&self) -> FailureKind {
        self.cause.kind()
    }
}

impl From<InstantiationError> for FieldResolutionFailure {
    fn from(cause: InstantiationError) -> Self {
        Self { field: None, cause }
    }
}

// ---------------------------------------------------------------------------
// Metadata configuration errors
// ---------------------------------------------------------------------------

/// Invalid metadata rejected while building or loading a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CatalogError {
    /// The metadata document could not be parsed.
    #[error("Metadata document is malformed: {message}")]
    Malformed {
        /// Parser diagnostic, including line and column.
        message: String,
    },

    /// Two associations on one domain type target the same message type.
    #[error("Domain type {domain_type} declares more than one association for {message_type}")]
    DuplicateMessageType {
        /// The domain type carrying the associations.
        domain_type: TypeName,
        /// The message type that appears twice.
        message_type: TypeName,
    },

    /// The same domain type was declared twice.
    #[error("Domain type {domain_type} is declared more than once")]
    DuplicateDomainType {
        /// The repeated domain type.
        domain_type: TypeName,
    },

    /// The same field was declared twice on one domain type.
    #[error("Field {field} is declared more than once on {domain_type}")]
    DuplicateField {
        /// The domain type owning the field.
        domain_type: TypeName,
        /// The repeated field name.
        field: FieldName,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> ClassName {
        ClassName::new(name).unwrap()
    }

    #[test]
    fn messages_distinguish_missing_from_restricted_constructors() {
        let missing = InstantiationError::ConstructorNotFound { class: class("Abstract") };
        let hidden = InstantiationError::ConstructorNotAccessible { class: class("Hidden") };

        assert_eq!(missing.to_string(), "Default constructor not found.");
        assert_eq!(hidden.to_string(), "Make default constructor public for Hidden");
        assert_eq!(missing.kind(), FailureKind::Instantiation);
        assert_eq!(hidden.kind(), FailureKind::Access);
    }

    #[test]
    fn unknown_class_counts_as_instantiation_failure() {
        let err = InstantiationError::UnknownClass { class: class("Ghost") };
        assert_eq!(err.kind(), FailureKind::Instantiation);
        assert_eq!(err.class().as_str(), "Ghost");
    }

    #[test]
    fn wrappers_keep_the_cause_message() {
        let cause = InstantiationError::ConstructorNotAccessible { class: class("Hidden") };

        let binding = BindingFailure::from(cause.clone());
        assert_eq!(binding.to_string(), cause.to_string());
        assert_eq!(binding.kind(), FailureKind::Access);

        let field = FieldResolutionFailure::from(cause.clone())
            .for_field(FieldName::new("total").unwrap());
        assert_eq!(field.to_string(), cause.to_string());
        assert_eq!(field.field().map(FieldName::as_str), Some("total"));
        assert_eq!(field.cause(), &cause);
    }
}
