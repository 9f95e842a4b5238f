//! The fluent handle returned when a service is added.

use crate::callback::{Callback, Extension, Factory};
use crate::definition::{Definition, DefinitionRef};
use crate::error::{Error, Result};
use crate::strategy::ContainerStrategy;
use crate::value::{Argument, Slot, Value};
use std::fmt;
use std::sync::Arc;

/// Configures the definition of one service.
///
/// Every mutation is validated against the container's strategy before it is
/// written. The handle shares the definition with its container, so changes
/// are visible immediately.
///
/// ```
/// use fibre_wire::{bindings, literal, Class, ClassMap, Container, ManualWiringStrategy};
/// use std::sync::Arc;
///
/// struct Greeter {
///   greeting: String,
/// }
///
/// let classes = Arc::new(ClassMap::new());
/// classes.insert(Class::new::<Greeter>("Greeter").constructor(|args| {
///   Ok(Greeter {
///     greeting: args.cloned::<String>("greeting")?,
///   })
/// }));
///
/// let container = Container::with_strategy(ManualWiringStrategy::new(classes));
/// container
///   .add("Greeter")?
///   .with_parameters(bindings!["greeting" => literal(String::from("hello"))])?
///   .shared(true);
///
/// let greeter = container.get_as::<Greeter>("Greeter")?;
/// assert_eq!(greeter.greeting, "hello");
/// # Ok::<(), fibre_wire::Error>(())
/// ```
pub struct Concrete {
  definition: DefinitionRef,
  strategy: Arc<dyn ContainerStrategy>,
}

impl Concrete {
  pub(crate) fn new(definition: DefinitionRef, strategy: Arc<dyn ContainerStrategy>) -> Self {
    Self { definition, strategy }
  }

  pub fn interface(&self) -> String {
    self.definition.read().interface().to_owned()
  }

  /// A snapshot of the current definition.
  pub fn definition(&self) -> Definition {
    self.definition.read().clone()
  }

  // --- Method calls ---

  /// Registers a call of `method` after construction.
  ///
  /// Strategies without coordinated entities only take positional arguments
  /// numbered `0..n`.
  pub fn with_method_call<I>(self, method: &str, parameters: I) -> Result<Self>
  where
    I: IntoIterator<Item = (Slot, Argument)>,
  {
    if method.trim().is_empty() {
      return Err(Error::incompatible("method names can not be empty"));
    }

    let parameters: Vec<(Slot, Argument)> = parameters.into_iter().collect();
    if !self.strategy.supports_coordinated_entities() {
      if parameters.iter().any(|(slot, _)| matches!(slot, Slot::Named(_))) {
        return Err(Error::incompatible(format!(
          "named arguments of `{}` are not supported by this container",
          method
        )));
      }
      let mut positions: Vec<usize> = parameters.iter().filter_map(|(slot, _)| slot.position()).collect();
      positions.sort_unstable();
      if positions.iter().enumerate().any(|(index, position)| index != *position) {
        return Err(Error::incompatible(format!(
          "arguments of `{}` must be numbered from 0 without gaps",
          method
        )));
      }
    }

    let values = parameters
      .into_iter()
      .map(|(slot, argument)| {
        if matches!(argument, Argument::Inferred) {
          return Err(Error::incompatible(format!(
            "argument `{}` of `{}` needs a concrete",
            slot, method
          )));
        }
        Value::from_argument(&slot, argument)
      })
      .collect::<Result<Vec<_>>>()?;

    self.definition.write().set_method_call(method, values);
    Ok(self)
  }

  /// Registers several method calls. Stops at the first invalid call; calls
  /// registered before it stay registered.
  pub fn with_method_calls<I, M, P>(self, calls: I) -> Result<Self>
  where
    I: IntoIterator<Item = (M, P)>,
    M: AsRef<str>,
    P: IntoIterator<Item = (Slot, Argument)>,
  {
    calls
      .into_iter()
      .try_fold(self, |concrete, (method, parameters)| {
        concrete.with_method_call(method.as_ref(), parameters)
      })
  }

  // --- Parameters and properties ---

  pub fn with_parameter(self, name: &str, concrete: impl Into<Argument>) -> Result<Self> {
    self.bind_parameter(Slot::Named(name.to_owned()), concrete.into())
  }

  /// Binds constructor parameters by name or by position.
  pub fn with_parameters<I, K>(self, parameters: I) -> Result<Self>
  where
    I: IntoIterator<Item = (K, Argument)>,
    K: Into<Slot>,
  {
    parameters
      .into_iter()
      .try_fold(self, |concrete, (slot, argument)| {
        concrete.bind_parameter(slot.into(), argument)
      })
  }

  pub fn with_property(self, name: &str, concrete: impl Into<Argument>) -> Result<Self> {
    let argument = concrete.into();
    let slot = Slot::Named(name.to_owned());
    self.ensure_resolvable(&slot, &argument, "property")?;

    let value = Value::from_argument(&slot, argument)?;
    self.definition.write().set_property(name, value);
    Ok(self)
  }

  /// Binds properties. Properties only have names, so positional slots are
  /// rejected.
  pub fn with_properties<I, K>(self, properties: I) -> Result<Self>
  where
    I: IntoIterator<Item = (K, Argument)>,
    K: Into<Slot>,
  {
    properties
      .into_iter()
      .try_fold(self, |concrete, (slot, argument)| match slot.into() {
        Slot::Named(name) => concrete.with_property(&name, argument),
        Slot::Positional(position) => Err(Error::incompatible(format!(
          "property #{} needs a name",
          position
        ))),
      })
  }

  fn bind_parameter(self, slot: Slot, argument: Argument) -> Result<Self> {
    self.ensure_resolvable(&slot, &argument, "parameter")?;

    let value = Value::from_argument(&slot, argument)?;
    self.definition.write().set_parameter(slot, value);
    Ok(self)
  }

  fn ensure_resolvable(&self, slot: &Slot, argument: &Argument, what: &str) -> Result<()> {
    if matches!(argument, Argument::Inferred) && !self.strategy.can_automatically_resolve_entities() {
      return Err(Error::incompatible(format!(
        "{} `{}` needs a concrete, this container can not resolve it automatically",
        what, slot
      )));
    }
    Ok(())
  }

  // --- Class, factory and extensions ---

  pub fn with_concrete_class(self, class: &str) -> Result<Self> {
    let interface = self.interface();
    if !self.strategy.conforms(class, &interface) {
      return Err(Error::incompatible(format!(
        "class `{}` can not service interface `{}`",
        class, interface
      )));
    }

    self.definition.write().set_concrete_class(class);
    Ok(self)
  }

  pub fn with_factory(self, factory: Factory) -> Result<Self> {
    let (interface, concrete_class) = self.targets();
    let factory = self
      .strategy
      .sanitize_callback(Callback::Factory(factory), &interface, &concrete_class)?
      .into_factory()?;

    self.definition.write().set_factory(factory);
    Ok(self)
  }

  /// Appends an extension to the post-construction pipeline.
  pub fn extend(self, extension: Extension) -> Result<Self> {
    let (interface, concrete_class) = self.targets();
    let extension = self
      .strategy
      .sanitize_callback(Callback::Extension(extension), &interface, &concrete_class)?
      .into_extension()?;

    self.definition.write().add_extension(extension);
    Ok(self)
  }

  fn targets(&self) -> (String, String) {
    let definition = self.definition.read();
    (
      definition.interface().to_owned(),
      definition.concrete_class().to_owned(),
    )
  }

  // --- Sharing ---

  /// Drops the cached shared instance so the next resolution builds anew.
  pub fn forget_instance(self) -> Self {
    self.definition.write().clear_instance();
    self
  }

  /// Switches sharing. Switching it off also forgets the cached instance.
  pub fn shared(self, shared: bool) -> Self {
    self.definition.write().set_shared(shared);
    self
  }
}

impl fmt::Debug for Concrete {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Concrete")
      .field("definition", &*self.definition.read())
      .finish_non_exhaustive()
  }
}
