//! Strategy resolution for binding domain objects to structured messages.
//!
//! Given declarative metadata on a domain type and its fields, this crate
//! decides which pluggable strategies (mapper, field-resolver factory, type
//! converter, null-value inspector, default-value provider) govern a
//! conversion, and constructs fresh instances of them from registered
//! factory tables.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no I/O and owns
//! no conversion engine. It defines the strategy traits the engine calls and
//! answers "which strategy, built how" for each binding and field.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype names (`TypeName`, `ClassName`, `FieldName`) |
//! | [`hierarchy`] | Declared supertype relationships and assignability |
//! | [`metadata`] | Type and field associations, the metadata catalog |
//! | [`strategies`] | Strategy traits and the built-in implementations |
//! | [`registry`] | Class descriptors, constructors, and per-capability tables |
//! | [`resolver`] | Association lookup and strategy instantiation |
//! | [`errors`] | Instantiation causes, binding/field failures, catalog errors |
//!
//! ## Example
//!
//! ```
//! use binding::{
//!     MetadataCatalog, StrategyRegistry, StrategyResolver, TypeAssociation, TypeMetadata,
//!     TypeName,
//! };
//!
//! let order = TypeName::new("Order").unwrap();
//! let order_msg = TypeName::new("OrderMsg").unwrap();
//!
//! let catalog = MetadataCatalog::builder()
//!     .domain_type(order.clone(), TypeMetadata::single(TypeAssociation::new(order_msg.clone())))
//!     .build()
//!     .unwrap();
//! let registry = StrategyRegistry::with_defaults();
//! let resolver = StrategyResolver::new(&catalog, &registry);
//!
//! let binding = resolver.resolve_binding(&order, &order_msg).unwrap().unwrap();
//! assert_eq!(binding.association.message_type, order_msg);
//! ```

pub mod errors;
pub mod hierarchy;
pub mod identifiers;
pub mod metadata;
pub mod registry;
pub mod resolver;
pub mod strategies;

// Re-export everything at the crate root for ergonomic usage by the engine.
pub use errors::{
    BindingFailure, CatalogError, FailureKind, FieldResolutionFailure, InstantiationError,
};
pub use hierarchy::TypeHierarchy;
pub use identifiers::{ClassName, FieldName, TypeName};
pub use metadata::{
    Associations, FieldAssociation, FieldMetadata, MetadataCatalog, MetadataCatalogBuilder,
    TypeAssociation, TypeMetadata,
};
pub use registry::{
    ClassDescriptor, ClassTable, Constructor, ConstructorShape, DefaultValueClass,
    FieldResolverFactoryClass, MapperClass, NullValueInspectorClass, StrategyRegistry,
    TypeConverterClass, Visibility,
};
pub use resolver::{FieldStrategies, StrategyResolver, TypeBinding};
pub use strategies::{
    builtin, DefaultConverter, DefaultFieldResolverFactory, DefaultMapper,
    DefaultNullValueInspector, DefaultValue, DefaultValueProvider, DomainObject, FieldResolver,
    FieldResolverFactory, Fields, Mapper, NullValueInspector, TypeConverter,
};
