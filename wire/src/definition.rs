//! The stored construction recipe of one service.

use crate::callback::{Extension, Factory};
use crate::core::Instance;
use crate::value::{Slot, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A definition shared between its container and the [`Concrete`](crate::Concrete)
/// handles mutating it.
pub type DefinitionRef = Arc<RwLock<Definition>>;

/// How to build the service registered for one interface.
///
/// A definition is plain data. Validation happens in
/// [`Concrete`](crate::Concrete) before anything is written here, and building
/// is left to the container's strategy.
#[derive(Clone)]
pub struct Definition {
  interface: String,
  concrete_class: String,
  factory: Option<Factory>,
  extensions: Vec<Extension>,
  parameters: Vec<(Slot, Value)>,
  properties: Vec<(String, Value)>,
  method_calls: Vec<(String, Vec<Value>)>,
  shared: bool,
  instance: Option<Instance>,
}

impl Definition {
  /// A definition for `interface`, bound to itself.
  pub fn new(interface: impl Into<String>) -> Self {
    let interface = interface.into();
    Self {
      concrete_class: interface.clone(),
      interface,
      factory: None,
      extensions: Vec::new(),
      parameters: Vec::new(),
      properties: Vec::new(),
      method_calls: Vec::new(),
      shared: false,
      instance: None,
    }
  }

  pub fn with_concrete(interface: impl Into<String>, concrete_class: impl Into<String>) -> Self {
    let mut definition = Self::new(interface);
    definition.concrete_class = concrete_class.into();
    definition
  }

  pub(crate) fn into_shared(self) -> DefinitionRef {
    Arc::new(RwLock::new(self))
  }

  pub fn interface(&self) -> &str {
    &self.interface
  }

  // --- Concrete class and factory ---

  /// Sets the concrete class without checking it against the interface.
  pub fn set_concrete_class(&mut self, concrete_class: impl Into<String>) {
    self.concrete_class = concrete_class.into();
  }

  pub fn concrete_class(&self) -> &str {
    &self.concrete_class
  }

  /// Sets the factory. A factory takes precedence over the concrete class.
  pub fn set_factory(&mut self, factory: Factory) {
    self.factory = Some(factory);
  }

  pub fn factory(&self) -> Option<&Factory> {
    self.factory.as_ref()
  }

  pub fn has_factory(&self) -> bool {
    self.factory.is_some()
  }

  // --- Extensions ---

  pub fn add_extension(&mut self, extension: Extension) {
    self.extensions.push(extension);
  }

  /// The extensions in registration order.
  pub fn extensions(&self) -> impl Iterator<Item = &Extension> {
    self.extensions.iter()
  }

  pub fn has_extensions(&self) -> bool {
    !self.extensions.is_empty()
  }

  // --- Parameters ---

  /// Binds a constructor parameter. Binding a slot again replaces the earlier
  /// value in place.
  pub fn set_parameter(&mut self, slot: Slot, value: Value) {
    match self.parameters.iter_mut().find(|(key, _)| *key == slot) {
      Some((_, existing)) => *existing = value,
      None => self.parameters.push((slot, value)),
    }
  }

  pub fn has_parameter(&self, slot: &Slot) -> bool {
    self.parameters.iter().any(|(key, _)| key == slot)
  }

  pub fn parameter(&self, slot: &Slot) -> Option<&Value> {
    self
      .parameters
      .iter()
      .find(|(key, _)| key == slot)
      .map(|(_, value)| value)
  }

  pub fn has_parameters(&self) -> bool {
    !self.parameters.is_empty()
  }

  /// The bound parameters in binding order.
  pub fn parameters(&self) -> impl Iterator<Item = (&Slot, &Value)> {
    self.parameters.iter().map(|(slot, value)| (slot, value))
  }

  // --- Properties ---

  pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
    let name = name.into();
    match self.properties.iter_mut().find(|(key, _)| *key == name) {
      Some((_, existing)) => *existing = value,
      None => self.properties.push((name, value)),
    }
  }

  pub fn has_property(&self, name: &str) -> bool {
    self.properties.iter().any(|(key, _)| key == name)
  }

  pub fn has_properties(&self) -> bool {
    !self.properties.is_empty()
  }

  pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
    self
      .properties
      .iter()
      .map(|(name, value)| (name.as_str(), value))
  }

  // --- Method calls ---

  /// Registers a call of `method`. Registering the same method again replaces
  /// its arguments but keeps its place in the call order.
  pub fn set_method_call(&mut self, method: impl Into<String>, arguments: Vec<Value>) {
    let method = method.into();
    match self.method_calls.iter_mut().find(|(key, _)| *key == method) {
      Some((_, existing)) => *existing = arguments,
      None => self.method_calls.push((method, arguments)),
    }
  }

  pub fn has_method_call(&self, method: &str) -> bool {
    self.method_calls.iter().any(|(key, _)| key == method)
  }

  pub fn has_method_calls(&self) -> bool {
    !self.method_calls.is_empty()
  }

  /// The method calls in call order, each with its arguments in binding order.
  pub fn method_calls(&self) -> impl Iterator<Item = (&str, impl Iterator<Item = &Value>)> {
    self
      .method_calls
      .iter()
      .map(|(method, arguments)| (method.as_str(), arguments.iter()))
  }

  // --- Sharing ---

  /// Switching sharing off also drops the cached instance.
  pub fn set_shared(&mut self, shared: bool) {
    self.shared = shared;
    if !shared {
      self.instance = None;
    }
  }

  pub fn is_shared(&self) -> bool {
    self.shared
  }

  /// Caches `instance`. Only shared definitions keep an instance, so this
  /// returns `false` and stores nothing otherwise.
  pub fn set_instance(&mut self, instance: Instance) -> bool {
    if !self.shared {
      return false;
    }
    self.instance = Some(instance);
    true
  }

  pub fn has_instance(&self) -> bool {
    self.instance.is_some()
  }

  pub fn instance(&self) -> Option<&Instance> {
    self.instance.as_ref()
  }

  pub fn clear_instance(&mut self) {
    self.instance = None;
  }
}

impl fmt::Debug for Definition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Definition")
      .field("interface", &self.interface)
      .field("concrete_class", &self.concrete_class)
      .field("factory", &self.factory)
      .field("extensions", &self.extensions.len())
      .field("parameters", &self.parameters)
      .field("properties", &self.properties)
      .field("method_calls", &self.method_calls)
      .field("shared", &self.shared)
      .field("has_instance", &self.instance.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::value::ValueKind;
  use pretty_assertions::assert_eq;

  fn resolver(name: &str, interface: &str) -> Value {
    Value::resolver(Some(name.to_owned()), None, interface).unwrap()
  }

  #[test]
  fn new_definition_is_self_bound_and_not_shared() {
    let definition = Definition::new("Logger");
    assert_eq!(definition.interface(), "Logger");
    assert_eq!(definition.concrete_class(), "Logger");
    assert!(!definition.is_shared());
    assert!(!definition.has_factory());
  }

  #[test]
  fn rebinding_a_parameter_replaces_it_in_place() {
    let mut definition = Definition::new("Mailer");
    definition.set_parameter("transport".into(), resolver("transport", "SmtpTransport"));
    definition.set_parameter("logger".into(), resolver("logger", "Logger"));
    definition.set_parameter("transport".into(), resolver("transport", "NullTransport"));

    let bound: Vec<_> = definition
      .parameters()
      .map(|(slot, value)| (slot.to_string(), label(value)))
      .collect();
    assert_eq!(
      bound,
      vec![
        ("transport".to_string(), "NullTransport".to_string()),
        ("logger".to_string(), "Logger".to_string()),
      ]
    );
  }

  #[test]
  fn method_calls_keep_call_order_across_replacement() {
    let mut definition = Definition::new("Router");
    definition.set_method_call("mount", vec![resolver("a", "Api")]);
    definition.set_method_call("listen", vec![]);
    definition.set_method_call("mount", vec![resolver("a", "Admin"), resolver("b", "Api")]);

    let calls: Vec<(String, usize)> = definition
      .method_calls()
      .map(|(method, arguments)| (method.to_owned(), arguments.count()))
      .collect();
    assert_eq!(calls, vec![("mount".to_string(), 2), ("listen".to_string(), 0)]);
  }

  #[test]
  fn instance_is_only_kept_while_shared() {
    let mut definition = Definition::new("Cache");
    assert!(!definition.set_instance(Arc::new(1_u8)));
    assert!(!definition.has_instance());

    definition.set_shared(true);
    assert!(definition.set_instance(Arc::new(1_u8)));
    assert!(definition.has_instance());

    definition.set_shared(false);
    assert!(!definition.has_instance());
  }

  fn label(value: &Value) -> String {
    match value.kind() {
      ValueKind::Resolve(interface) => interface.clone(),
      _ => value.type_name().to_owned(),
    }
  }
}
