//! Class descriptors: the runtime stand-in for constructor reflection.
//!
//! A [`Class`] tells a strategy how to construct a named concrete type, which
//! interfaces it may be bound to, how to set its properties and call its
//! methods. Classes live in a [`ClassMap`] that strategies consult while
//! building.

use crate::core::{Instance, Object, TypeInfo};
use crate::error::{Error, Result};
use crate::provider::ServiceProvider;
use crate::value::{Argument, Slot};
use dashmap::DashMap;
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

type ConstructorFn = dyn Fn(Arguments) -> Result<Object> + Send + Sync;
type SetterFn = dyn Fn(&mut Object, Instance) -> Result<()> + Send + Sync;
type MethodFn = dyn Fn(&mut Object, Arguments) -> Result<()> + Send + Sync;

/// A resolved argument handed to a constructor or method.
#[derive(Clone)]
pub struct Resolved {
  pub name: Option<String>,
  pub position: Option<usize>,
  pub value: Instance,
}

/// The resolved arguments of one constructor or method invocation.
#[derive(Clone, Default)]
pub struct Arguments {
  entries: Vec<Resolved>,
}

impl Arguments {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, name: Option<String>, position: Option<usize>, value: Instance) {
    self.entries.push(Resolved {
      name,
      position,
      value,
    });
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Resolved> {
    self.entries.iter()
  }

  /// Finds the argument bound to `slot`. A positional slot falls back to the
  /// argument at that index when no argument carries the position itself.
  pub fn instance(&self, slot: impl Into<Slot>) -> Option<&Instance> {
    match slot.into() {
      Slot::Named(name) => self
        .entries
        .iter()
        .find(|entry| entry.name.as_deref() == Some(name.as_str()))
        .map(|entry| &entry.value),
      Slot::Positional(position) => self
        .entries
        .iter()
        .find(|entry| entry.position == Some(position))
        .or_else(|| self.entries.get(position))
        .map(|entry| &entry.value),
    }
  }

  /// Fetches the argument bound to `slot` as a `T`.
  pub fn get<T: Any + Send + Sync>(&self, slot: impl Into<Slot>) -> Result<Arc<T>> {
    let slot = slot.into();
    let instance = self
      .instance(slot.clone())
      .ok_or_else(|| Error::incompatible(format!("argument `{}` was not supplied", slot)))?;

    instance.clone().downcast::<T>().map_err(|_| {
      Error::incompatible(format!(
        "argument `{}` is not a `{}`",
        slot,
        std::any::type_name::<T>()
      ))
    })
  }

  pub fn cloned<T: Any + Send + Sync + Clone>(&self, slot: impl Into<Slot>) -> Result<T> {
    self.get::<T>(slot).map(|value| (*value).clone())
  }
}

/// Downcasts a single resolved value, as received by property setters.
pub fn downcast<T: Any + Send + Sync>(value: Instance) -> Result<Arc<T>> {
  value.downcast::<T>().map_err(|_| {
    Error::incompatible(format!("value is not a `{}`", std::any::type_name::<T>()))
  })
}

/// One declared constructor parameter.
#[derive(Clone)]
pub struct ParameterSpec {
  pub name: String,
  /// The interface the parameter expects, used to infer omitted bindings.
  pub interface: Option<String>,
  pub default: Option<Instance>,
}

impl fmt::Debug for ParameterSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ParameterSpec")
      .field("name", &self.name)
      .field("interface", &self.interface)
      .field("has_default", &self.default.is_some())
      .finish()
  }
}

/// Declarative wiring a class carries for strategies that aggregate
/// definitions from class metadata.
#[derive(Clone, Debug, Default)]
pub struct Attributes {
  pub parameters: Vec<(Slot, Argument)>,
  pub properties: Vec<(String, Argument)>,
  pub method_calls: Vec<(String, Vec<(Slot, Argument)>)>,
  pub shared: Option<bool>,
}

impl Attributes {
  pub fn is_empty(&self) -> bool {
    self.parameters.is_empty()
      && self.properties.is_empty()
      && self.method_calls.is_empty()
      && self.shared.is_none()
  }
}

/// Describes how to construct and configure one concrete type.
#[derive(Clone)]
pub struct Class {
  name: String,
  type_info: TypeInfo,
  implements: BTreeSet<String>,
  signature: Vec<ParameterSpec>,
  constructor: Option<Arc<ConstructorFn>>,
  properties: HashMap<String, (Option<String>, Arc<SetterFn>)>,
  methods: HashMap<String, Arc<MethodFn>>,
  attributes: Attributes,
}

impl Class {
  /// Starts describing the class `name` whose objects are `T`s.
  pub fn new<T: Any + Send + Sync>(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      type_info: TypeInfo::of::<T>(),
      implements: BTreeSet::new(),
      signature: Vec::new(),
      constructor: None,
      properties: HashMap::new(),
      methods: HashMap::new(),
      attributes: Attributes::default(),
    }
  }

  /// Describes a service provider class. Building it yields an
  /// `Arc<dyn ServiceProvider>`, which is what `Container::register` expects.
  pub fn provider<P, F>(name: impl Into<String>, constructor: F) -> Self
  where
    P: ServiceProvider + 'static,
    F: Fn() -> P + Send + Sync + 'static,
  {
    Class::new::<Arc<dyn ServiceProvider>>(name)
      .constructor(move |_| Ok(Arc::new(constructor()) as Arc<dyn ServiceProvider>))
  }

  // --- Description ---

  /// Declares the class assignable to `interface`.
  pub fn implements(mut self, interface: impl Into<String>) -> Self {
    self.implements.insert(interface.into());
    self
  }

  /// Declares the next constructor parameter.
  pub fn parameter(mut self, name: impl Into<String>, interface: Option<&str>) -> Self {
    self.signature.push(ParameterSpec {
      name: name.into(),
      interface: interface.map(str::to_owned),
      default: None,
    });
    self
  }

  /// Declares the next constructor parameter with a default used when the
  /// parameter is neither bound nor inferable.
  pub fn parameter_with_default<V: Any + Send + Sync>(mut self, name: impl Into<String>, default: V) -> Self {
    self.signature.push(ParameterSpec {
      name: name.into(),
      interface: None,
      default: Some(Arc::new(default)),
    });
    self
  }

  pub fn constructor<T, F>(mut self, constructor: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(Arguments) -> Result<T> + Send + Sync + 'static,
  {
    self.type_info = TypeInfo::of::<T>();
    self.constructor = Some(Arc::new(move |arguments: Arguments| {
      Ok(Box::new(constructor(arguments)?) as Object)
    }));
    self
  }

  pub fn property<T, F>(self, name: impl Into<String>, setter: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut T, Instance) -> Result<()> + Send + Sync + 'static,
  {
    self.insert_property(name.into(), None, setter)
  }

  /// A property whose value can be inferred by resolving `interface`.
  pub fn property_of<T, F>(self, name: impl Into<String>, interface: &str, setter: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut T, Instance) -> Result<()> + Send + Sync + 'static,
  {
    self.insert_property(name.into(), Some(interface.to_owned()), setter)
  }

  fn insert_property<T, F>(mut self, name: String, interface: Option<String>, setter: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut T, Instance) -> Result<()> + Send + Sync + 'static,
  {
    let class = self.name.clone();
    let property = name.clone();
    let setter: Arc<SetterFn> = Arc::new(move |object: &mut Object, value: Instance| {
      let target = object.downcast_mut::<T>().ok_or_else(|| {
        Error::incompatible(format!("`{}` can not set property `{}`", class, property))
      })?;
      setter(target, value)
    });
    self.properties.insert(name, (interface, setter));
    self
  }

  pub fn method<T, F>(mut self, name: impl Into<String>, method: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut T, Arguments) -> Result<()> + Send + Sync + 'static,
  {
    let name = name.into();
    let class = self.name.clone();
    let called = name.clone();
    let method: Arc<MethodFn> = Arc::new(move |object: &mut Object, arguments: Arguments| {
      let target = object.downcast_mut::<T>().ok_or_else(|| {
        Error::incompatible(format!("`{}` can not call method `{}`", class, called))
      })?;
      method(target, arguments)
    });
    self.methods.insert(name, method);
    self
  }

  // --- Wiring attributes ---

  pub fn wire_parameter(mut self, slot: impl Into<Slot>, argument: impl Into<Argument>) -> Self {
    self.attributes.parameters.push((slot.into(), argument.into()));
    self
  }

  pub fn wire_property(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
    self.attributes.properties.push((name.into(), argument.into()));
    self
  }

  pub fn wire_method_call(mut self, method: impl Into<String>, arguments: Vec<(Slot, Argument)>) -> Self {
    self.attributes.method_calls.push((method.into(), arguments));
    self
  }

  pub fn wire_shared(mut self, shared: bool) -> Self {
    self.attributes.shared = Some(shared);
    self
  }

  // --- Queries ---

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn type_info(&self) -> TypeInfo {
    self.type_info
  }

  pub fn signature(&self) -> &[ParameterSpec] {
    &self.signature
  }

  pub fn attributes(&self) -> &Attributes {
    &self.attributes
  }

  /// Whether objects of this class may be serviced as `interface`.
  pub fn is_a(&self, interface: &str) -> bool {
    self.name == interface || self.implements.contains(interface)
  }

  pub fn property_interface(&self, name: &str) -> Option<&str> {
    self
      .properties
      .get(name)
      .and_then(|(interface, _)| interface.as_deref())
  }

  pub(crate) fn construct(&self, arguments: Arguments) -> Result<Object> {
    let constructor = self.constructor.as_ref().ok_or_else(|| {
      Error::incompatible(format!("class `{}` has no constructor", self.name))
    })?;
    constructor(arguments)
  }

  pub(crate) fn set_property(&self, object: &mut Object, name: &str, value: Instance) -> Result<()> {
    let (_, setter) = self.properties.get(name).ok_or_else(|| {
      Error::incompatible(format!("class `{}` has no property `{}`", self.name, name))
    })?;
    setter(object, value)
  }

  pub(crate) fn call_method(&self, object: &mut Object, name: &str, arguments: Arguments) -> Result<()> {
    let method = self.methods.get(name).ok_or_else(|| {
      Error::incompatible(format!("class `{}` has no method `{}`", self.name, name))
    })?;
    method(object, arguments)
  }
}

impl fmt::Debug for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Class")
      .field("name", &self.name)
      .field("type", &self.type_info)
      .field("implements", &self.implements)
      .field("signature", &self.signature)
      .field("properties", &self.properties.keys().collect::<Vec<_>>())
      .field("methods", &self.methods.keys().collect::<Vec<_>>())
      .finish()
  }
}

/// The registry of known classes, keyed by class name.
///
/// Classes may be added at any time, also while containers built on this map
/// are in use.
#[derive(Default)]
pub struct ClassMap {
  classes: DashMap<String, Arc<Class>>,
}

impl ClassMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `class`, replacing a previous class of the same name.
  pub fn insert(&self, class: Class) -> &Self {
    tracing::trace!(class = class.name(), "class registered");
    self.classes.insert(class.name.clone(), Arc::new(class));
    self
  }

  pub fn get(&self, name: &str) -> Option<Arc<Class>> {
    self.classes.get(name).map(|class| Arc::clone(class.value()))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.classes.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.classes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.classes.is_empty()
  }

  /// Whether `class` is known and assignable to `interface`.
  pub fn is_a(&self, class: &str, interface: &str) -> bool {
    self
      .get(class)
      .map(|class| class.is_a(interface))
      .unwrap_or(false)
  }

  pub(crate) fn require(&self, name: &str) -> Result<Arc<Class>> {
    self.get(name).ok_or_else(|| Error::UnknownClass {
      class: name.to_owned(),
    })
  }
}

impl fmt::Debug for ClassMap {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<String> = self.classes.iter().map(|entry| entry.key().clone()).collect();
    names.sort();
    f.debug_struct("ClassMap").field("classes", &names).finish()
  }
}
