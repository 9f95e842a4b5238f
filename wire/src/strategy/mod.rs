//! Container strategies: which bindings a container accepts and how it turns
//! a definition into an object.

mod autowire;
mod manual;

pub use autowire::AutowiringStrategy;
pub use manual::ManualWiringStrategy;

use crate::callback::Callback;
use crate::class::{Arguments, Class, ClassMap, ParameterSpec};
use crate::container::Container;
use crate::core::{Instance, Object};
use crate::definition::{Definition, DefinitionRef};
use crate::error::{Error, Result};
use crate::value::{Slot, Value, ValueKind};
use std::sync::Arc;
use tracing::{debug, trace};

/// The policy a container delegates to.
///
/// Capability queries decide what [`Concrete`](crate::Concrete) lets callers
/// bind, `build` does the actual instantiation.
pub trait ContainerStrategy: Send + Sync {
  /// Whether named method arguments and freely positioned ones may be bound.
  fn supports_coordinated_entities(&self) -> bool;

  /// Whether a parameter or property may be bound without a concrete.
  fn can_automatically_resolve_entities(&self) -> bool;

  /// Whether definitions for class bindings are derived from class metadata.
  fn can_aggregate_entities(&self) -> bool;

  /// Whether `class` may be bound to `interface`.
  fn conforms(&self, class: &str, interface: &str) -> bool;

  /// Assembles a definition from the wiring attributes of `concrete_class`.
  fn create_from_attributes(&self, interface: &str, concrete_class: &str) -> Result<Definition>;

  /// Validates a factory or extension for the serviced interface and class,
  /// returning the callback to store. The returned callback may wrap the
  /// given one.
  fn sanitize_callback(&self, callback: Callback, interface: &str, concrete_class: &str) -> Result<Callback>;

  /// Builds the service described by `definition`, resolving dependencies
  /// through `scope`. Unless `ignore_sharing` is set, the result is cached on
  /// shared definitions.
  fn build(&self, definition: &DefinitionRef, scope: &Container, ignore_sharing: bool) -> Result<Instance>;
}

/// Checks a callback against the class the definition services.
pub(crate) fn check_callback(
  classes: &ClassMap,
  callback: Callback,
  interface: &str,
  concrete_class: &str,
) -> Result<Callback> {
  let expected = classes
    .get(concrete_class)
    .or_else(|| classes.get(interface))
    .map(|class| class.type_info());

  match (expected, callback.declared_type()) {
    (Some(expected), Some(declared)) if expected != declared => Err(Error::incompatible(format!(
      "callback works on `{}` but `{}` is serviced by `{}`",
      declared.name(),
      interface,
      expected.name()
    ))),
    (Some(expected), None) => Ok(callback.guarded(interface, expected)),
    _ => Ok(callback),
  }
}

/// Converts a class's wiring attributes into a definition.
pub(crate) fn definition_from_attributes(
  classes: &ClassMap,
  interface: &str,
  concrete_class: &str,
) -> Result<Definition> {
  let mut definition = Definition::with_concrete(interface, concrete_class);
  let Some(class) = classes.get(concrete_class) else {
    return Ok(definition);
  };

  let attributes = class.attributes();
  for (slot, argument) in &attributes.parameters {
    definition.set_parameter(slot.clone(), Value::from_argument(slot, argument.clone())?);
  }
  for (name, argument) in &attributes.properties {
    let slot = Slot::Named(name.clone());
    definition.set_property(name.clone(), Value::from_argument(&slot, argument.clone())?);
  }
  for (method, arguments) in &attributes.method_calls {
    let values = arguments
      .iter()
      .map(|(slot, argument)| Value::from_argument(slot, argument.clone()))
      .collect::<Result<Vec<_>>>()?;
    definition.set_method_call(method.clone(), values);
  }
  if let Some(shared) = attributes.shared {
    definition.set_shared(shared);
  }

  trace!(interface, class = concrete_class, "definition aggregated from attributes");
  Ok(definition)
}

/// One run of the build pipeline: construct, set properties, call methods,
/// extend, then cache.
pub(crate) struct Assembly<'a> {
  pub(crate) classes: &'a ClassMap,
  pub(crate) scope: &'a Container,
  /// Whether omitted bindings may be inferred from class metadata.
  pub(crate) infer: bool,
}

impl<'a> Assembly<'a> {
  pub(crate) fn run(&self, definition: &DefinitionRef, ignore_sharing: bool) -> Result<Instance> {
    // Work from a snapshot so no lock is held while dependencies resolve.
    let recipe = definition.read().clone();
    let interface = recipe.interface();
    let class = self.classes.get(recipe.concrete_class());

    debug!(
      interface,
      class = recipe.concrete_class(),
      factory = recipe.has_factory(),
      ignore_sharing,
      "building service"
    );

    let mut object = match recipe.factory() {
      Some(factory) => factory.invoke(self.scope)?,
      None => {
        let class = match &class {
          Some(class) => Arc::clone(class),
          None => self.classes.require(recipe.concrete_class())?,
        };
        let arguments = self.constructor_arguments(&recipe, &class)?;
        class.construct(arguments)?
      }
    };

    if recipe.has_properties() || recipe.has_method_calls() {
      let class = match &class {
        Some(class) => Arc::clone(class),
        None => self.classes.require(recipe.concrete_class())?,
      };
      self.configure(&recipe, &class, &mut object)?;
    }

    for extension in recipe.extensions() {
      object = extension.apply(object, self.scope)?;
    }

    let instance: Instance = Arc::from(object);

    if !ignore_sharing {
      let mut current = definition.write();
      if current.set_instance(Arc::clone(&instance)) {
        trace!(interface, "shared instance cached");
      }
    }

    Ok(instance)
  }

  fn configure(&self, recipe: &Definition, class: &Class, object: &mut Object) -> Result<()> {
    for (name, value) in recipe.properties() {
      let instance = match self.resolve(value)? {
        Some(instance) => instance,
        None => self.infer_property(class, name)?,
      };
      class.set_property(object, name, instance)?;
    }

    for (method, values) in recipe.method_calls() {
      let mut arguments = Arguments::new();
      for (index, value) in values.enumerate() {
        let instance = self.resolve(value)?.ok_or_else(|| {
          Error::incompatible(format!("arguments of method `{}` can not be inferred", method))
        })?;
        arguments.push(
          value.name().map(str::to_owned),
          value.position().or(Some(index)),
          instance,
        );
      }
      class.call_method(object, method, arguments)?;
    }

    Ok(())
  }

  fn constructor_arguments(&self, recipe: &Definition, class: &Class) -> Result<Arguments> {
    let mut arguments = Arguments::new();

    if !self.infer || class.signature().is_empty() {
      for (slot, value) in recipe.parameters() {
        let instance = self.resolve(value)?.ok_or_else(|| {
          Error::incompatible(format!(
            "parameter `{}` of `{}` has no concrete and can not be inferred",
            slot,
            class.name()
          ))
        })?;
        arguments.push(value.name().map(str::to_owned), value.position(), instance);
      }
      return Ok(arguments);
    }

    let mut consumed: Vec<Slot> = Vec::new();
    for (index, spec) in class.signature().iter().enumerate() {
      let named = Slot::Named(spec.name.clone());
      let positional = Slot::Positional(index);
      let bound = recipe
        .parameter(&named)
        .map(|value| (named, value))
        .or_else(|| recipe.parameter(&positional).map(|value| (positional, value)));

      let resolved = match bound {
        Some((slot, value)) => {
          consumed.push(slot);
          self.resolve(value)?
        }
        None => None,
      };
      let instance = match resolved {
        Some(instance) => instance,
        None => self.infer_parameter(class, spec)?,
      };
      arguments.push(Some(spec.name.clone()), Some(index), instance);
    }

    // Bindings the signature does not declare are handed on as given.
    for (slot, value) in recipe.parameters() {
      if consumed.contains(slot) {
        continue;
      }
      let instance = self.resolve(value)?.ok_or_else(|| {
        Error::incompatible(format!(
          "parameter `{}` is not declared by `{}` and can not be inferred",
          slot,
          class.name()
        ))
      })?;
      arguments.push(value.name().map(str::to_owned), value.position(), instance);
    }

    Ok(arguments)
  }

  /// Resolves a bound value. `None` means the value was omitted and has to be
  /// inferred by the caller.
  fn resolve(&self, value: &Value) -> Result<Option<Instance>> {
    match value.kind() {
      ValueKind::Resolve(interface) if self.infer && !self.scope.has(interface) => {
        self.infer_interface(interface).map(Some)
      }
      ValueKind::Resolve(interface) => self.scope.get(interface).map(Some),
      ValueKind::Literal { payload, .. } => Ok(Some(Arc::clone(payload))),
      ValueKind::Inferred if self.infer => Ok(None),
      ValueKind::Inferred => Err(Error::incompatible(format!(
        "`{}` has no concrete and this container can not resolve it automatically",
        value.name().unwrap_or("argument")
      ))),
    }
  }

  fn infer_parameter(&self, class: &Class, spec: &ParameterSpec) -> Result<Instance> {
    if let Some(interface) = &spec.interface {
      if self.scope.has(interface) {
        return self.scope.get(interface);
      }
      // Ignored hints go to the peers. The default only covers a miss there.
      if self.scope.is_ignored(interface) {
        match self.scope.get(interface) {
          Err(error) if error.is_not_found() && spec.default.is_some() => {}
          resolved => return resolved,
        }
      }
    }
    if let Some(default) = &spec.default {
      return Ok(Arc::clone(default));
    }
    match &spec.interface {
      Some(interface) => self.infer_interface(interface),
      None => Err(Error::incompatible(format!(
        "unable to infer parameter `{}` of `{}`",
        spec.name,
        class.name()
      ))),
    }
  }

  fn infer_property(&self, class: &Class, name: &str) -> Result<Instance> {
    match class.property_interface(name) {
      Some(interface) if self.scope.has(interface) => self.scope.get(interface),
      Some(interface) => self.infer_interface(interface),
      None => Err(Error::incompatible(format!(
        "unable to infer property `{}` of `{}`",
        name,
        class.name()
      ))),
    }
  }

  /// Unregistered interfaces that name a known class are built on the spot.
  /// Ignored interfaces never are; they are delegated like any other lookup.
  fn infer_interface(&self, interface: &str) -> Result<Instance> {
    if !self.scope.is_ignored(interface) && self.classes.contains(interface) {
      return self.scope.make(interface);
    }
    self.scope.get(interface)
  }
}
