//! Declarative binding metadata for domain types and their fields.
//!
//! A domain type declares which message type(s) it binds to through
//! [`TypeAssociation`]s, and each mapped field declares its per-field
//! strategies through a [`FieldAssociation`]. The [`MetadataCatalog`] holds
//! these records for every domain type, built in code with
//! [`MetadataCatalogBuilder`] or loaded from a JSON document.
//!
//! ## Document format
//!
//! ```json
//! {
//!   "domain_types": [
//!     { "name": "Order", "association": { "message_type": "OrderMsg" },
//!       "fields": [ { "name": "total", "type": "Money",
//!                     "converter": "MoneyConverter",
//!                     "use_domain_constructor": true } ] },
//!     { "name": "Shape", "associations": [
//!         { "message_type": "CircleMsg", "mapper": "CircleMapper" },
//!         { "message_type": "SquareMsg" } ] }
//!   ]
//! }
//! ```
//!
//! Omitted class designators fall back to the [`crate::builtin`] strategies.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::CatalogError;
use crate::strategies::builtin;
use crate::{ClassName, FieldName, TypeName};

fn builtin_mapper() -> ClassName {
    ClassName::from_static(builtin::MAPPER)
}

fn builtin_field_factory() -> ClassName {
    ClassName::from_static(builtin::FIELD_RESOLVER_FACTORY)
}

fn builtin_converter() -> ClassName {
    ClassName::from_static(builtin::CONVERTER)
}

fn builtin_null_value() -> ClassName {
    ClassName::from_static(builtin::NULL_VALUE_INSPECTOR)
}

fn builtin_default_value() -> ClassName {
    ClassName::from_static(builtin::DEFAULT_VALUE)
}

// ---------------------------------------------------------------------------
// Type-level metadata
// ---------------------------------------------------------------------------

/// Declared relationship between a domain type and one message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeAssociation {
    /// The message type this association targets.
    pub message_type: TypeName,

    /// [`crate::Mapper`] class used for the whole binding.
    #[serde(default = "builtin_mapper")]
    pub mapper: ClassName,

    /// [`crate::FieldResolverFactory`] class used for the binding's fields.
    #[serde(default = "builtin_field_factory")]
    pub field_factory: ClassName,
}

impl TypeAssociation {
    /// Creates an association to `message_type` using the built-in strategies.
    pub fn new(message_type: TypeName) -> Self {
        Self {
            message_type,
            mapper: builtin_mapper(),
            field_factory: builtin_field_factory(),
        }
    }

    /// Overrides the mapper class.
    pub fn with_mapper(mut self, mapper: ClassName) -> Self {
        self.mapper = mapper;
        self
    }

    /// Overrides the field-resolver factory class.
    pub fn with_field_factory(mut self, field_factory: ClassName) -> Self {
        self.field_factory = field_factory;
        self
    }
}

/// The associations carried by one domain type.
///
/// `Single` and `Multiple` are kept apart even for a one-element list: a
/// single association applies to every requested message type, a list is
/// matched by message type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Associations {
    /// The domain type declares no association.
    #[default]
    None,
    /// Exactly one association, applied unconditionally.
    Single(TypeAssociation),
    /// An ordered list of associations with distinct message types.
    Multiple(Vec<TypeAssociation>),
}

// ---------------------------------------------------------------------------
// Field-level metadata
// ---------------------------------------------------------------------------

/// Per-field strategy designators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAssociation {
    /// Name of the field on the message side, when it differs from the domain name.
    #[serde(default)]
    pub message_field: Option<String>,

    /// [`crate::TypeConverter`] class.
    #[serde(default = "builtin_converter")]
    pub converter: ClassName,

    /// [`crate::NullValueInspector`] class.
    #[serde(default = "builtin_null_value")]
    pub null_value: ClassName,

    /// [`crate::DefaultValue`] class.
    #[serde(default = "builtin_default_value")]
    pub default_value: ClassName,

    /// Construct the converter with the owning domain instance when one of its
    /// one-argument constructors accepts it.
    #[serde(default)]
    pub use_domain_constructor: bool,
}

impl Default for FieldAssociation {
    fn default() -> Self {
        Self {
            message_field: None,
            converter: builtin_converter(),
            null_value: builtin_null_value(),
            default_value: builtin_default_value(),
            use_domain_constructor: false,
        }
    }
}

impl FieldAssociation {
    /// Maps the field to a differently named message field.
    pub fn with_message_field(mut self, name: impl Into<String>) -> Self {
        self.message_field = Some(name.into());
        self
    }

    /// Overrides the converter class.
    pub fn with_converter(mut self, converter: ClassName) -> Self {
        self.converter = converter;
        self
    }

    /// Overrides the null-value inspector class.
    pub fn with_null_value(mut self, null_value: ClassName) -> Self {
        self.null_value = null_value;
        self
    }

    /// Overrides the default-value provider class.
    pub fn with_default_value(mut self, default_value: ClassName) -> Self {
        self.default_value = default_value;
        self
    }

    /// Opts into domain-aware converter construction.
    pub fn using_domain_constructor(mut self) -> Self {
        self.use_domain_constructor = true;
        self
    }
}

/// A mapped field of a domain type together with its association.
///
/// Deserialises through a flat, strict representation: a misspelled key is
/// an error rather than a silent fallback to a built-in strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldEntry")]
pub struct FieldMetadata {
    /// Field name on the domain type.
    pub name: FieldName,

    /// Declared type of the field, used when generating default values.
    #[serde(rename = "type")]
    pub field_type: TypeName,

    /// Strategy designators for the field.
    #[serde(flatten)]
    pub association: FieldAssociation,
}

impl FieldMetadata {
    /// Creates field metadata using the built-in strategies.
    pub fn new(name: FieldName, field_type: TypeName) -> Self {
        Self {
            name,
            field_type,
            association: FieldAssociation::default(),
        }
    }

    /// Replaces the field association.
    pub fn with_association(mut self, association: FieldAssociation) -> Self {
        self.association = association;
        self
    }
}

/// Everything declared on one domain type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMetadata {
    /// Message-type associations.
    pub associations: Associations,
    /// Mapped fields in declaration order.
    pub fields: Vec<FieldMetadata>,
}

impl TypeMetadata {
    /// Metadata for a type bound to exactly one message type.
    pub fn single(association: TypeAssociation) -> Self {
        Self {
            associations: Associations::Single(association),
            fields: Vec::new(),
        }
    }

    /// Metadata for a type bound to several message types, in lookup order.
    pub fn multiple(associations: Vec<TypeAssociation>) -> Self {
        Self {
            associations: Associations::Multiple(associations),
            fields: Vec::new(),
        }
    }

    /// Appends a mapped field.
    pub fn with_field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

static NO_ASSOCIATIONS: Associations = Associations::None;

/// Read-only metadata for every known domain type.
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    types: HashMap<TypeName, TypeMetadata>,
}

impl MetadataCatalog {
    /// Starts building a catalog in code.
    pub fn builder() -> MetadataCatalogBuilder {
        MetadataCatalogBuilder::default()
    }

    /// Parses and validates a metadata document (see the module docs).
    pub fn from_json_str(document: &str) -> Result<Self, CatalogError> {
        let parsed: CatalogDocument =
            serde_json::from_str(document).map_err(|e| CatalogError::Malformed {
                message: e.to_string(),
            })?;

        let mut builder = Self::builder();
        for entry in parsed.domain_types {
            let associations = match (entry.association, entry.associations) {
                (Some(_), Some(_)) => {
                    return Err(CatalogError::Malformed {
                        message: format!(
                            "domain type {} declares both `association` and `associations`",
                            entry.name
                        ),
                    })
                }
                (Some(single), None) => Associations::Single(single),
                (None, Some(list)) => Associations::Multiple(list),
                (None, None) => Associations::None,
            };
            builder = builder.domain_type(
                entry.name,
                TypeMetadata {
                    associations,
                    fields: entry.fields,
                },
            );
        }
        builder.build()
    }

    /// Returns the associations declared on `domain_type`.
    ///
    /// Unknown domain types report [`Associations::None`].
    pub fn associations(&self, domain_type: &TypeName) -> &Associations {
        self.types
            .get(domain_type)
            .map(|m| &m.associations)
            .unwrap_or(&NO_ASSOCIATIONS)
    }

    /// Returns the mapped fields of `domain_type` in declaration order.
    pub fn fields(&self, domain_type: &TypeName) -> &[FieldMetadata] {
        self.types
            .get(domain_type)
            .map(|m| m.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Looks up one mapped field.
    pub fn field(&self, domain_type: &TypeName, field: &FieldName) -> Option<&FieldMetadata> {
        self.fields(domain_type).iter().find(|f| &f.name == field)
    }

    /// Returns `true` if `domain_type` has any metadata at all.
    pub fn contains(&self, domain_type: &TypeName) -> bool {
        self.types.contains_key(domain_type)
    }
}

/// Collects [`TypeMetadata`] and validates it into a [`MetadataCatalog`].
#[derive(Debug, Default)]
pub struct MetadataCatalogBuilder {
    entries: Vec<(TypeName, TypeMetadata)>,
}

impl MetadataCatalogBuilder {
    /// Declares the metadata for one domain type.
    pub fn domain_type(mut self, name: TypeName, metadata: TypeMetadata) -> Self {
        self.entries.push((name, metadata));
        self
    }

    /// Validates and freezes the catalog.
    ///
    /// Rejects repeated domain types, repeated fields within a type, and
    /// association lists that target the same message type twice.
    pub fn build(self) -> Result<MetadataCatalog, CatalogError> {
        let mut types = HashMap::with_capacity(self.entries.len());
        for (name, metadata) in self.entries {
            if let Associations::Multiple(list) = &metadata.associations {
                let mut seen = HashSet::new();
                for association in list {
                    if !seen.insert(&association.message_type) {
                        return Err(CatalogError::DuplicateMessageType {
                            domain_type: name,
                            message_type: association.message_type.clone(),
                        });
                    }
                }
            }

            let mut seen_fields = HashSet::new();
            for field in &metadata.fields {
                if !seen_fields.insert(&field.name) {
                    return Err(CatalogError::DuplicateField {
                        domain_type: name,
                        field: field.name.clone(),
                    });
                }
            }

            if types.contains_key(&name) {
                return Err(CatalogError::DuplicateDomainType { domain_type: name });
            }
            types.insert(name, metadata);
        }

        debug!(domain_types = types.len(), "Metadata catalog built");
        Ok(MetadataCatalog { types })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldEntry {
    name: FieldName,
    #[serde(rename = "type")]
    field_type: TypeName,
    #[serde(default)]
    message_field: Option<String>,
    #[serde(default = "builtin_converter")]
    converter: ClassName,
    #[serde(default = "builtin_null_value")]
    null_value: ClassName,
    #[serde(default = "builtin_default_value")]
    default_value: ClassName,
    #[serde(default)]
    use_domain_constructor: bool,
}

impl From<FieldEntry> for FieldMetadata {
    fn from(entry: FieldEntry) -> Self {
        Self {
            name: entry.name,
            field_type: entry.field_type,
            association: FieldAssociation {
                message_field: entry.message_field,
                converter: entry.converter,
                null_value: entry.null_value,
                default_value: entry.default_value,
                use_domain_constructor: entry.use_domain_constructor,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    #[serde(default)]
    domain_types: Vec<DomainTypeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DomainTypeEntry {
    name: TypeName,
    #[serde(default)]
    association: Option<TypeAssociation>,
    #[serde(default)]
    associations: Option<Vec<TypeAssociation>>,
    #[serde(default)]
    fields: Vec<FieldMetadata>,
}
