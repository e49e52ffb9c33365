//! Factory tables that stand in for runtime reflection.
//!
//! Every strategy class a metadata record may designate is registered up front
//! as a [`ClassDescriptor`]: its name, whether it is abstract, and its
//! constructors in declaration order. A constructor is either nullary or takes
//! the owning domain instance, and is either public or restricted.
//!
//! Constructor functions are infallible. A panic inside one is a defect in the
//! strategy implementation and propagates to the caller unchanged; only the
//! inability to *invoke* a constructor is reported as an
//! [`InstantiationError`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::InstantiationError;
use crate::strategies::{
    builtin, DefaultConverter, DefaultFieldResolverFactory, DefaultMapper,
    DefaultNullValueInspector, DefaultValueProvider,
};
use crate::{
    ClassName, DefaultValue, DomainObject, FieldResolverFactory, Mapper, NullValueInspector,
    TypeConverter, TypeHierarchy, TypeName,
};

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// Whether a constructor may be invoked by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Callable by the resolver.
    #[default]
    Public,
    /// Declared but not callable from outside the class.
    Restricted,
}

type NullaryFn<S> = Arc<dyn Fn() -> Box<S> + Send + Sync>;
type UnaryFn<S> = Arc<dyn Fn(Option<Arc<dyn DomainObject>>) -> Box<S> + Send + Sync>;

/// Parameter shape of a [`Constructor`].
pub enum ConstructorShape<S: ?Sized> {
    /// Zero-argument constructor.
    Nullary(NullaryFn<S>),
    /// One-argument constructor taking a domain instance of `parameter` type.
    ///
    /// The argument is `None` when the caller had no domain instance.
    Unary {
        parameter: TypeName,
        build: UnaryFn<S>,
    },
}

/// One declared constructor of a strategy class.
pub struct Constructor<S: ?Sized> {
    visibility: Visibility,
    shape: ConstructorShape<S>,
}

impl<S: ?Sized> Constructor<S> {
    /// A public zero-argument constructor.
    pub fn nullary<F>(build: F) -> Self
    where
        F: Fn() -> Box<S> + Send + Sync + 'static,
    {
        Self {
            visibility: Visibility::Public,
            shape: ConstructorShape::Nullary(Arc::new(build)),
        }
    }

    /// A public one-argument constructor accepting a domain instance of type
    /// `parameter` (or any of its subtypes).
    pub fn unary<F>(parameter: TypeName, build: F) -> Self
    where
        F: Fn(Option<Arc<dyn DomainObject>>) -> Box<S> + Send + Sync + 'static,
    {
        Self {
            visibility: Visibility::Public,
            shape: ConstructorShape::Unary {
                parameter,
                build: Arc::new(build),
            },
        }
    }

    /// Marks the constructor as restricted.
    pub fn restricted(mut self) -> Self {
        self.visibility = Visibility::Restricted;
        self
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn shape(&self) -> &ConstructorShape<S> {
        &self.shape
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        match self.shape {
            ConstructorShape::Nullary(_) => 0,
            ConstructorShape::Unary { .. } => 1,
        }
    }

    /// Returns the parameter type when this is a one-argument constructor.
    pub fn parameter(&self) -> Option<&TypeName> {
        match &self.shape {
            ConstructorShape::Nullary(_) => None,
            ConstructorShape::Unary { parameter, .. } => Some(parameter),
        }
    }
}

impl<S: ?Sized> fmt::Debug for Constructor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("visibility", &self.visibility)
            .field("parameter", &self.parameter())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Class descriptors
// ---------------------------------------------------------------------------

/// A registered strategy class implementing capability `S`.
pub struct ClassDescriptor<S: ?Sized> {
    name: ClassName,
    is_abstract: bool,
    constructors: Vec<Constructor<S>>,
}

/// Descriptor of a [`Mapper`] class.
pub type MapperClass = ClassDescriptor<dyn Mapper>;
/// Descriptor of a [`FieldResolverFactory`] class.
pub type FieldResolverFactoryClass = ClassDescriptor<dyn FieldResolverFactory>;
/// Descriptor of a [`TypeConverter`] class.
pub type TypeConverterClass = ClassDescriptor<dyn TypeConverter>;
/// Descriptor of a [`NullValueInspector`] class.
pub type NullValueInspectorClass = ClassDescriptor<dyn NullValueInspector>;
/// Descriptor of a [`DefaultValue`] class.
pub type DefaultValueClass = ClassDescriptor<dyn DefaultValue>;

impl<S: ?Sized> ClassDescriptor<S> {
    /// A concrete class with no constructors yet.
    pub fn concrete(name: ClassName) -> Self {
        Self {
            name,
            is_abstract: false,
            constructors: Vec::new(),
        }
    }

    /// An abstract class or trait: designating it always fails to instantiate.
    pub fn abstract_class(name: ClassName) -> Self {
        Self {
            name,
            is_abstract: true,
            constructors: Vec::new(),
        }
    }

    /// Appends a constructor; declaration order is lookup order.
    pub fn with_constructor(mut self, constructor: Constructor<S>) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Shorthand for a public [`Constructor::nullary`].
    pub fn with_default_constructor<F>(self, build: F) -> Self
    where
        F: Fn() -> Box<S> + Send + Sync + 'static,
    {
        self.with_constructor(Constructor::nullary(build))
    }

    /// Shorthand for a public [`Constructor::unary`].
    pub fn with_domain_constructor<F>(self, parameter: TypeName, build: F) -> Self
    where
        F: Fn(Option<Arc<dyn DomainObject>>) -> Box<S> + Send + Sync + 'static,
    {
        self.with_constructor(Constructor::unary(parameter, build))
    }

    /// Shorthand for a restricted [`Constructor::nullary`].
    pub fn with_restricted_default_constructor<F>(self, build: F) -> Self
    where
        F: Fn() -> Box<S> + Send + Sync + 'static,
    {
        self.with_constructor(Constructor::nullary(build).restricted())
    }

    /// Shorthand for a restricted [`Constructor::unary`].
    pub fn with_restricted_domain_constructor<F>(self, parameter: TypeName, build: F) -> Self
    where
        F: Fn(Option<Arc<dyn DomainObject>>) -> Box<S> + Send + Sync + 'static,
    {
        self.with_constructor(Constructor::unary(parameter, build).restricted())
    }

    pub fn name(&self) -> &ClassName {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Declared constructors in declaration order.
    pub fn constructors(&self) -> &[Constructor<S>] {
        &self.constructors
    }

    /// Constructs an instance through the zero-argument constructor.
    pub fn instantiate(&self) -> Result<Box<S>, InstantiationError> {
        if self.is_abstract {
            return Err(self.not_found());
        }
        let constructor = self
            .constructors
            .iter()
            .find(|c| c.arity() == 0)
            .ok_or_else(|| self.not_found())?;
        self.invoke(constructor, None)
    }

    /// Returns the first one-argument constructor able to accept `domain`.
    ///
    /// A constructor is eligible when `domain` is `None`, or when its parameter
    /// type is assignable from the instance's runtime type. No ranking beyond
    /// declaration order is applied.
    pub fn find_domain_constructor(
        &self,
        domain: Option<&dyn DomainObject>,
        hierarchy: &TypeHierarchy,
    ) -> Option<&Constructor<S>> {
        let runtime_type = domain.map(|d| d.domain_type());
        self.constructors.iter().find(|c| match c.parameter() {
            Some(parameter) => match &runtime_type {
                None => true,
                Some(actual) => hierarchy.is_assignable_from(parameter, actual),
            },
            None => false,
        })
    }

    /// Invokes `constructor`, which must belong to this class.
    ///
    /// `domain` is passed to one-argument constructors and ignored otherwise.
    pub fn invoke(
        &self,
        constructor: &Constructor<S>,
        domain: Option<Arc<dyn DomainObject>>,
    ) -> Result<Box<S>, InstantiationError> {
        if self.is_abstract {
            return Err(self.not_found());
        }
        if constructor.visibility == Visibility::Restricted {
            return Err(InstantiationError::ConstructorNotAccessible {
                class: self.name.clone(),
            });
        }
        Ok(match &constructor.shape {
            ConstructorShape::Nullary(build) => build(),
            ConstructorShape::Unary { build, .. } => build(domain),
        })
    }

    fn not_found(&self) -> InstantiationError {
        InstantiationError::ConstructorNotFound {
            class: self.name.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for ClassDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("is_abstract", &self.is_abstract)
            .field("constructors", &self.constructors)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Class tables
// ---------------------------------------------------------------------------

/// All registered classes for one capability, keyed by designator.
pub struct ClassTable<S: ?Sized> {
    classes: HashMap<ClassName, ClassDescriptor<S>>,
}

impl<S: ?Sized> Default for ClassTable<S> {
    fn default() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }
}

impl<S: ?Sized> ClassTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class`, returning the descriptor it replaced, if any.
    pub fn register(&mut self, class: ClassDescriptor<S>) -> Option<ClassDescriptor<S>> {
        self.classes.insert(class.name.clone(), class)
    }

    /// Looks up a class by designator.
    pub fn get(&self, name: &ClassName) -> Result<&ClassDescriptor<S>, InstantiationError> {
        self.classes
            .get(name)
            .ok_or_else(|| InstantiationError::UnknownClass { class: name.clone() })
    }

    pub fn contains(&self, name: &ClassName) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<S: ?Sized> fmt::Debug for ClassTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.classes.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// Strategy registry
// ---------------------------------------------------------------------------

/// Class tables for every strategy capability plus the type hierarchy used
/// for assignability checks.
///
/// Immutable once handed to a [`crate::StrategyResolver`]; share it behind an
/// `Arc` to resolve from several threads.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    mappers: ClassTable<dyn Mapper>,
    field_factories: ClassTable<dyn FieldResolverFactory>,
    converters: ClassTable<dyn TypeConverter>,
    null_value_inspectors: ClassTable<dyn NullValueInspector>,
    default_values: ClassTable<dyn DefaultValue>,
    hierarchy: TypeHierarchy,
}

impl StrategyRegistry {
    /// An empty registry: every designator is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the [`builtin`] strategies.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_mapper(
                MapperClass::concrete(ClassName::from_static(builtin::MAPPER))
                    .with_default_constructor(|| Box::new(DefaultMapper)),
            )
            .with_field_factory(
                FieldResolverFactoryClass::concrete(ClassName::from_static(
                    builtin::FIELD_RESOLVER_FACTORY,
                ))
                .with_default_constructor(|| Box::new(DefaultFieldResolverFactory)),
            )
            .with_converter(
                TypeConverterClass::concrete(ClassName::from_static(builtin::CONVERTER))
                    .with_default_constructor(|| Box::new(DefaultConverter)),
            )
            .with_null_value_inspector(
                NullValueInspectorClass::concrete(ClassName::from_static(
                    builtin::NULL_VALUE_INSPECTOR,
                ))
                .with_default_constructor(|| Box::new(DefaultNullValueInspector)),
            )
            .with_default_value(
                DefaultValueClass::concrete(ClassName::from_static(builtin::DEFAULT_VALUE))
                    .with_default_constructor(|| Box::new(DefaultValueProvider)),
            )
    }

    pub fn with_mapper(mut self, class: MapperClass) -> Self {
        self.mappers.register(class);
        self
    }

    pub fn with_field_factory(mut self, class: FieldResolverFactoryClass) -> Self {
        self.field_factories.register(class);
        self
    }

    pub fn with_converter(mut self, class: TypeConverterClass) -> Self {
        self.converters.register(class);
        self
    }

    pub fn with_null_value_inspector(mut self, class: NullValueInspectorClass) -> Self {
        self.null_value_inspectors.register(class);
        self
    }

    pub fn with_default_value(mut self, class: DefaultValueClass) -> Self {
        self.default_values.register(class);
        self
    }

    /// Replaces the type hierarchy.
    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    pub fn mappers(&self) -> &ClassTable<dyn Mapper> {
        &self.mappers
    }

    pub fn field_factories(&self) -> &ClassTable<dyn FieldResolverFactory> {
        &self.field_factories
    }

    pub fn converters(&self) -> &ClassTable<dyn TypeConverter> {
        &self.converters
    }

    pub fn null_value_inspectors(&self) -> &ClassTable<dyn NullValueInspector> {
        &self.null_value_inspectors
    }

    pub fn default_values(&self) -> &ClassTable<dyn DefaultValue> {
        &self.default_values
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }
}
