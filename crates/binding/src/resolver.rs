//! Turns binding metadata into live strategy instances.
//!
//! The conversion engine calls [`StrategyResolver::resolve_binding`] once per
//! domain-type/message-type pair and [`StrategyResolver::resolve_field`] once
//! per field while traversing an object. The finer-grained `create_*`
//! operations are exposed for engines that resolve strategies lazily.
//!
//! Every call constructs new instances; nothing is cached between calls.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::errors::{BindingFailure, FieldResolutionFailure, InstantiationError};
use crate::metadata::{Associations, FieldAssociation, FieldMetadata, TypeAssociation};
use crate::{
    ClassName, ClassTable, DefaultValue, DomainObject, FieldResolver, FieldResolverFactory, Mapper,
    MetadataCatalog, NullValueInspector, StrategyRegistry, TypeConverter, TypeName,
};

/// Strategies governing one domain-type/message-type binding.
pub struct TypeBinding<'a> {
    /// The association the binding was resolved from.
    pub association: &'a TypeAssociation,
    /// Fresh instance of the association's mapper.
    pub mapper: Box<dyn Mapper>,
    /// Fresh instance of the association's field-resolver factory.
    pub field_factory: Box<dyn FieldResolverFactory>,
}

impl TypeBinding<'_> {
    /// Creates a resolver for each of `fields` with this binding's factory.
    pub fn field_resolvers(&self, fields: &[FieldMetadata]) -> Vec<FieldResolver> {
        fields
            .iter()
            .map(|f| self.field_factory.create_resolver(f))
            .collect()
    }
}

impl std::fmt::Debug for TypeBinding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeBinding")
            .field("association", self.association)
            .finish_non_exhaustive()
    }
}

/// Strategies governing one field.
pub struct FieldStrategies {
    /// Converter, built with the domain instance when the field opts in.
    pub converter: Box<dyn TypeConverter>,
    /// Decides whether the field value is unset.
    pub null_value: Box<dyn NullValueInspector>,
    /// Supplies the value for an unset field.
    pub default_value: Box<dyn DefaultValue>,
}

impl std::fmt::Debug for FieldStrategies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStrategies").finish_non_exhaustive()
    }
}

/// Resolves associations and instantiates strategies from a catalog and a
/// registry.
#[derive(Debug, Clone, Copy)]
pub struct StrategyResolver<'a> {
    catalog: &'a MetadataCatalog,
    registry: &'a StrategyRegistry,
}

impl<'a> StrategyResolver<'a> {
    pub fn new(catalog: &'a MetadataCatalog, registry: &'a StrategyRegistry) -> Self {
        Self { catalog, registry }
    }

    pub fn catalog(&self) -> &'a MetadataCatalog {
        self.catalog
    }

    pub fn registry(&self) -> &'a StrategyRegistry {
        self.registry
    }

    // -----------------------------------------------------------------------
    // Association lookup
    // -----------------------------------------------------------------------

    /// Finds the association of `domain_type` that applies to `message_type`.
    ///
    /// A lone association is returned whatever `message_type` is. Among
    /// several, the first (in declaration order) whose message type is
    /// `message_type` or one of its supertypes wins. `None` means the domain
    /// type is not bound to `message_type`; it is not an error.
    pub fn find_association(
        &self,
        domain_type: &TypeName,
        message_type: &TypeName,
    ) -> Option<&'a TypeAssociation> {
        let found = match self.catalog.associations(domain_type) {
            Associations::Single(association) => Some(association),
            Associations::Multiple(list) => list.iter().find(|a| {
                self.registry
                    .hierarchy()
                    .is_assignable_from(&a.message_type, message_type)
            }),
            Associations::None => None,
        };
        trace!(
            %domain_type,
            %message_type,
            matched = found.map(|a| a.message_type.as_str()),
            "Association lookup"
        );
        found
    }

    // -----------------------------------------------------------------------
    // Type-level strategies
    // -----------------------------------------------------------------------

    /// Instantiates the mapper designated by `association`.
    pub fn create_mapper(
        &self,
        association: &TypeAssociation,
    ) -> Result<Box<dyn Mapper>, BindingFailure> {
        instantiate_default(self.registry.mappers(), &association.mapper)
            .map_err(BindingFailure::from)
    }

    /// Instantiates the field-resolver factory designated by `association`.
    pub fn create_field_factory(
        &self,
        association: &TypeAssociation,
    ) -> Result<Box<dyn FieldResolverFactory>, BindingFailure> {
        instantiate_default(self.registry.field_factories(), &association.field_factory)
            .map_err(BindingFailure::from)
    }

    /// Finds the association for the pair and instantiates its mapper and
    /// field-resolver factory.
    ///
    /// `Ok(None)` when no association applies.
    pub fn resolve_binding(
        &self,
        domain_type: &TypeName,
        message_type: &TypeName,
    ) -> Result<Option<TypeBinding<'a>>, BindingFailure> {
        let Some(association) = self.find_association(domain_type, message_type) else {
            debug!(%domain_type, %message_type, "No association applies");
            return Ok(None);
        };

        let mapper = self.create_mapper(association)?;
        let field_factory = self.create_field_factory(association)?;
        debug!(
            %domain_type,
            %message_type,
            mapper = %association.mapper,
            field_factory = %association.field_factory,
            "Binding resolved"
        );
        Ok(Some(TypeBinding {
            association,
            mapper,
            field_factory,
        }))
    }

    // -----------------------------------------------------------------------
    // Field-level strategies
    // -----------------------------------------------------------------------

    /// Instantiates the converter designated by `field`.
    ///
    /// With `use_domain_constructor` set, the first one-argument constructor
    /// accepting `domain` is invoked with it; otherwise, or when none accepts
    /// it, the zero-argument constructor is used. A selected constructor that
    /// is restricted is an access failure, not a reason to fall back.
    pub fn create_type_converter(
        &self,
        field: &FieldAssociation,
        domain: Option<Arc<dyn DomainObject>>,
    ) -> Result<Box<dyn TypeConverter>, FieldResolutionFailure> {
        let class = self
            .registry
            .converters()
            .get(&field.converter)
            .map_err(field_failure)?;

        if field.use_domain_constructor {
            if let Some(constructor) =
                class.find_domain_constructor(domain.as_deref(), self.registry.hierarchy())
            {
                trace!(
                    class = %field.converter,
                    parameter = constructor.parameter().map(TypeName::as_str),
                    "Using domain-aware converter constructor"
                );
                return class
                    .invoke(constructor, domain)
                    .map_err(field_failure);
            }
        }

        class.instantiate().map_err(field_failure)
    }

    /// Instantiates the null-value inspector designated by `field`.
    pub fn create_null_value_inspector(
        &self,
        field: &FieldAssociation,
    ) -> Result<Box<dyn NullValueInspector>, FieldResolutionFailure> {
        instantiate_default(self.registry.null_value_inspectors(), &field.null_value)
            .map_err(FieldResolutionFailure::from)
    }

    /// Instantiates the default-value provider designated by `field`.
    pub fn create_default_value(
        &self,
        field: &FieldAssociation,
    ) -> Result<Box<dyn DefaultValue>, FieldResolutionFailure> {
        instantiate_default(self.registry.default_values(), &field.default_value)
            .map_err(FieldResolutionFailure::from)
    }

    /// Instantiates all strategies of one field. Failures name the field.
    pub fn resolve_field(
        &self,
        field: &FieldMetadata,
        domain: Option<Arc<dyn DomainObject>>,
    ) -> Result<FieldStrategies, FieldResolutionFailure> {
        let named = |e: FieldResolutionFailure| e.for_field(field.name.clone());

        let converter = self
            .create_type_converter(&field.association, domain)
            .map_err(named)?;
        let null_value = self
            .create_null_value_inspector(&field.association)
            .map_err(named)?;
        let default_value = self
            .create_default_value(&field.association)
            .map_err(named)?;

        trace!(field = %field.name, "Field strategies resolved");
        Ok(FieldStrategies {
            converter,
            null_value,
            default_value,
        })
    }
}

fn instantiate_default<S: ?Sized>(
    table: &ClassTable<S>,
    class: &ClassName,
) -> Result<Box<S>, InstantiationError> {
    table
        .get(class)
        .and_then(|c| c.instantiate())
        .inspect_err(|e| warn!(%class, error = %e, "Strategy instantiation failed"))
}

fn field_failure(cause: InstantiationError) -> FieldResolutionFailure {
    warn!(class = %cause.class(), error = %cause, "Converter instantiation failed");
    FieldResolutionFailure::from(cause)
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use serde_json::{json, Value};

    use super::*;
    use crate::metadata::TypeMetadata;
    use crate::registry::{FieldResolverFactoryClass, MapperClass, TypeConverterClass};
    use crate::{DefaultMapper, FailureKind, FieldName, TypeHierarchy};

    fn ty(name: &str) -> TypeName {
        TypeName::new(name).unwrap()
    }

    fn class(name: &str) -> ClassName {
        ClassName::new(name).unwrap()
    }

    #[derive(Debug)]
    struct Invoice {
        number: u32,
    }

    impl DomainObject for Invoice {
        fn domain_type(&self) -> TypeName {
            ty("Invoice")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Converter that reports which constructor built it.
    struct Labelled(String);

    impl TypeConverter for Labelled {
        fn to_domain_value(&self, _: &Value) -> Value {
            json!(self.0)
        }

        fn to_message_value(&self, _: &Value) -> Value {
            json!(self.0)
        }
    }

    fn label(converter: &dyn TypeConverter) -> Value {
        converter.to_message_value(&Value::Null)
    }

    fn invoice_number(domain: Option<Arc<dyn DomainObject>>) -> String {
        domain
            .as_ref()
            .and_then(|d| d.as_any().downcast_ref::<Invoice>())
            .map(|i| format!("invoice #{}", i.number))
            .unwrap_or_else(|| "no invoice".to_owned())
    }

    fn registry() -> StrategyRegistry {
        StrategyRegistry::with_defaults()
            .with_hierarchy(TypeHierarchy::new().with_supertype(ty("Invoice"), ty("Document")))
            .with_converter(
                TypeConverterClass::concrete(class("InvoiceAware"))
                    .with_default_constructor(|| Box::new(Labelled("default".into())))
                    .with_domain_constructor(ty("Document"), |d| {
                        Box::new(Labelled(invoice_number(d)))
                    }),
            )
            .with_converter(
                TypeConverterClass::concrete(class("RestrictedDomain"))
                    .with_default_constructor(|| Box::new(Labelled("default".into())))
                    .with_restricted_domain_constructor(ty("Invoice"), |_| {
                        Box::new(Labelled("hidden".into()))
                    }),
            )
            .with_converter(
                TypeConverterClass::concrete(class("Exploding"))
                    .with_default_constructor(|| panic!("converter bug")),
            )
            .with_mapper(MapperClass::abstract_class(class("AbstractMapper")))
            .with_mapper(
                MapperClass::concrete(class("HiddenMapper"))
                    .with_restricted_default_constructor(|| Box::new(DefaultMapper)),
            )
            .with_field_factory(FieldResolverFactoryClass::abstract_class(class(
                "AbstractFieldFactory",
            )))
    }

    fn catalog() -> MetadataCatalog {
        MetadataCatalog::builder()
            .domain_type(
                ty("Invoice"),
                TypeMetadata::single(TypeAssociation::new(ty("InvoiceMsg"))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn domain_constructor_receives_the_instance() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let field = FieldAssociation::default()
            .with_converter(class("InvoiceAware"))
            .using_domain_constructor();

        let converter = resolver
            .create_type_converter(&field, Some(Arc::new(Invoice { number: 42 })))
            .unwrap();
        assert_eq!(label(converter.as_ref()), json!("invoice #42"));
    }

    #[test]
    fn flag_unset_always_uses_default_constructor() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let field = FieldAssociation::default().with_converter(class("InvoiceAware"));

        let converter = resolver
            .create_type_converter(&field, Some(Arc::new(Invoice { number: 42 })))
            .unwrap();
        assert_eq!(label(converter.as_ref()), json!("default"));
    }

    #[test]
    fn absent_instance_selects_first_unary_constructor() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let field = FieldAssociation::default()
            .with_converter(class("InvoiceAware"))
            .using_domain_constructor();

        let converter = resolver.create_type_converter(&field, None).unwrap();
        assert_eq!(label(converter.as_ref()), json!("no invoice"));
    }

    #[test]
    fn restricted_domain_constructor_is_an_access_failure() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let field = FieldAssociation::default()
            .with_converter(class("RestrictedDomain"))
            .using_domain_constructor();

        let err = resolver
            .create_type_converter(&field, Some(Arc::new(Invoice { number: 1 })))
            .err()
            .unwrap();
        assert_eq!(err.kind(), FailureKind::Access);
        assert_eq!(err.to_string(), "Make default constructor public for RestrictedDomain");
    }

    #[test]
    #[should_panic(expected = "converter bug")]
    fn panics_inside_constructors_are_not_converted() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let field = FieldAssociation::default().with_converter(class("Exploding"));

        let _ = resolver.create_type_converter(&field, None);
    }

    #[test]
    fn mapper_failures_are_binding_failures() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let association =
            TypeAssociation::new(ty("InvoiceMsg")).with_mapper(class("AbstractMapper"));

        let err = resolver.create_mapper(&association).err().unwrap();
        assert_eq!(err.kind(), FailureKind::Instantiation);
        assert_eq!(err.to_string(), "Default constructor not found.");
    }

    #[test]
    fn restricted_mapper_constructor_is_a_binding_access_failure() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let association =
            TypeAssociation::new(ty("InvoiceMsg")).with_mapper(class("HiddenMapper"));

        let err = resolver.create_mapper(&association).err().unwrap();
        assert_eq!(err.kind(), FailureKind::Access);
        assert_eq!(err.to_string(), "Make default constructor public for HiddenMapper");
    }

    #[test]
    fn field_factory_failures_are_binding_failures() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);

        let abstract_factory = TypeAssociation::new(ty("InvoiceMsg"))
            .with_field_factory(class("AbstractFieldFactory"));
        let err = resolver.create_field_factory(&abstract_factory).err().unwrap();
        assert_eq!(err.kind(), FailureKind::Instantiation);
        assert_eq!(err.to_string(), "Default constructor not found.");

        let unknown_factory =
            TypeAssociation::new(ty("InvoiceMsg")).with_field_factory(class("NoSuchFactory"));
        let err = resolver.create_field_factory(&unknown_factory).err().unwrap();
        assert_eq!(err.kind(), FailureKind::Instantiation);
        assert_eq!(
            err.cause(),
            &InstantiationError::UnknownClass { class: class("NoSuchFactory") }
        );
    }

    #[test]
    fn unregistered_default_value_provider_fails_the_field() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let field = FieldMetadata::new(FieldName::new("due_date").unwrap(), ty("Date"))
            .with_association(
                FieldAssociation::default().with_default_value(class("NoSuchDefault")),
            );

        let direct = resolver
            .create_default_value(&field.association)
            .err()
            .unwrap();
        assert_eq!(direct.kind(), FailureKind::Instantiation);
        assert!(direct.field().is_none());

        let err = resolver.resolve_field(&field, None).err().unwrap();
        assert_eq!(err.field().map(FieldName::as_str), Some("due_date"));
        assert_eq!(
            err.cause(),
            &InstantiationError::UnknownClass { class: class("NoSuchDefault") }
        );
    }

    #[test]
    fn resolve_field_names_the_failing_field() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);
        let field = FieldMetadata::new(FieldName::new("total").unwrap(), ty("f64"))
            .with_association(FieldAssociation::default().with_null_value(class("Missing")));

        let err = resolver.resolve_field(&field, None).err().unwrap();
        assert_eq!(err.field().map(FieldName::as_str), Some("total"));
        assert_eq!(
            err.cause(),
            &InstantiationError::UnknownClass { class: class("Missing") }
        );
    }

    #[test]
    fn resolve_binding_with_builtins() {
        let (catalog, registry) = (catalog(), registry());
        let resolver = StrategyResolver::new(&catalog, &registry);

        let binding = resolver
            .resolve_binding(&ty("Invoice"), &ty("InvoiceMsg"))
            .unwrap()
            .unwrap();
        assert_eq!(binding.association.message_type, ty("InvoiceMsg"));

        assert!(resolver
            .resolve_binding(&ty("Unmapped"), &ty("InvoiceMsg"))
            .unwrap()
            .is_none());
    }
}
