//! Capability traits for pluggable conversion strategies, and the built-in
//! implementations every registry starts with.
//!
//! The conversion engine works on field maps ([`Fields`]) keyed by field name;
//! the message representation behind them is opaque to this crate. Strategies
//! are resolved per binding ([`Mapper`], [`FieldResolverFactory`]) or per field
//! ([`TypeConverter`], [`NullValueInspector`], [`DefaultValue`]) and are owned
//! by whoever asked for them.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FieldMetadata, FieldName, TypeName};

/// Field values keyed by field name, as seen by the conversion engine.
pub type Fields = serde_json::Map<String, Value>;

/// Designators under which [`crate::StrategyRegistry::with_defaults`] registers
/// the built-in strategies. Metadata that omits a class designator refers to
/// these.
pub mod builtin {
    /// [`super::DefaultMapper`].
    pub const MAPPER: &str = "DefaultMapper";
    /// [`super::DefaultFieldResolverFactory`].
    pub const FIELD_RESOLVER_FACTORY: &str = "DefaultFieldResolverFactory";
    /// [`super::DefaultConverter`].
    pub const CONVERTER: &str = "DefaultConverter";
    /// [`super::DefaultNullValueInspector`].
    pub const NULL_VALUE_INSPECTOR: &str = "DefaultNullValueInspector";
    /// [`super::DefaultValueProvider`].
    pub const DEFAULT_VALUE: &str = "DefaultValueProvider";
}

// ---------------------------------------------------------------------------
// Domain instances
// ---------------------------------------------------------------------------

/// A live domain object handed to domain-aware converter constructors.
///
/// [`DomainObject::domain_type`] is the runtime type used to decide which
/// one-argument constructor accepts the instance.
pub trait DomainObject: Any + Send + Sync + fmt::Debug {
    /// The runtime type of this instance.
    fn domain_type(&self) -> TypeName;

    /// Upcast used by converters to recover the concrete domain type.
    fn as_any(&self) -> &dyn Any;
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Pairs a domain field with the message field it is stored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResolver {
    /// Field name on the domain side.
    pub domain_field: FieldName,
    /// Field name on the message side.
    pub message_field: String,
}

/// Copies field values between a domain field map and a message field map.
pub trait Mapper: Send + Sync {
    /// Produces message fields from domain fields.
    fn map_to_message(&self, resolvers: &[FieldResolver], domain: &Fields) -> Fields;

    /// Produces domain fields from message fields.
    fn map_to_domain(&self, resolvers: &[FieldResolver], message: &Fields) -> Fields;
}

/// Creates a [`FieldResolver`] for each mapped field of a domain type.
pub trait FieldResolverFactory: Send + Sync {
    fn create_resolver(&self, field: &FieldMetadata) -> FieldResolver;
}

/// Converts a single field value between its domain and message forms.
pub trait TypeConverter: Send + Sync {
    /// Message value → domain value.
    fn to_domain_value(&self, message_value: &Value) -> Value;

    /// Domain value → message value.
    fn to_message_value(&self, domain_value: &Value) -> Value;
}

/// Decides whether a field value counts as "not set".
pub trait NullValueInspector: Send + Sync {
    fn is_null(&self, value: &Value) -> bool;
}

/// Supplies the value used when a field is not set.
pub trait DefaultValue: Send + Sync {
    fn generate_value(&self, field_type: &TypeName) -> Value;
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

/// Copies every resolved field that is present, renaming as the resolvers say.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMapper;

impl Mapper for DefaultMapper {
    fn map_to_message(&self, resolvers: &[FieldResolver], domain: &Fields) -> Fields {
        resolvers
            .iter()
            .filter_map(|r| {
                domain
                    .get(r.domain_field.as_str())
                    .map(|v| (r.message_field.clone(), v.clone()))
            })
            .collect()
    }

    fn map_to_domain(&self, resolvers: &[FieldResolver], message: &Fields) -> Fields {
        resolvers
            .iter()
            .filter_map(|r| {
                message
                    .get(&r.message_field)
                    .map(|v| (r.domain_field.as_str().to_owned(), v.clone()))
            })
            .collect()
    }
}

/// Uses the explicit message field name when declared, else the domain field name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFieldResolverFactory;

impl FieldResolverFactory for DefaultFieldResolverFactory {
    fn create_resolver(&self, field: &FieldMetadata) -> FieldResolver {
        let message_field = field
            .association
            .message_field
            .clone()
            .unwrap_or_else(|| field.name.as_str().to_owned());
        FieldResolver {
            domain_field: field.name.clone(),
            message_field,
        }
    }
}

/// Identity conversion in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl TypeConverter for DefaultConverter {
    fn to_domain_value(&self, message_value: &Value) -> Value {
        message_value.clone()
    }

    fn to_message_value(&self, domain_value: &Value) -> Value {
        domain_value.clone()
    }
}

/// Treats only JSON `null` as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNullValueInspector;

impl NullValueInspector for DefaultNullValueInspector {
    fn is_null(&self, value: &Value) -> bool {
        value.is_null()
    }
}

/// Zero values for well-known scalar type names, `null` for anything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueProvider;

impl DefaultValue for DefaultValueProvider {
    fn generate_value(&self, field_type: &TypeName) -> Value {
        match field_type.as_str() {
            "bool" => Value::Bool(false),
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "int32" | "int64"
            | "uint32" | "uint64" => Value::from(0),
            "f32" | "f64" | "float" | "double" => Value::from(0.0),
            "String" | "string" => Value::String(String::new()),
            _ => Value::Null,
        }
    }
}
