//! Bound arguments: what a parameter, property or method argument resolves to.

use crate::core::Instance;
use crate::error::{Error, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The origin key of a binding: a name or a zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
  Named(String),
  Positional(usize),
}

impl Slot {
  pub fn name(&self) -> Option<&str> {
    match self {
      Slot::Named(name) => Some(name),
      Slot::Positional(_) => None,
    }
  }

  pub fn position(&self) -> Option<usize> {
    match self {
      Slot::Named(_) => None,
      Slot::Positional(position) => Some(*position),
    }
  }
}

impl fmt::Display for Slot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Slot::Named(name) => f.write_str(name),
      Slot::Positional(position) => write!(f, "#{}", position),
    }
  }
}

impl From<&str> for Slot {
  fn from(name: &str) -> Self {
    Slot::Named(name.to_owned())
  }
}

impl From<String> for Slot {
  fn from(name: String) -> Self {
    Slot::Named(name)
  }
}

impl From<usize> for Slot {
  fn from(position: usize) -> Self {
    Slot::Positional(position)
  }
}

/// What a caller binds to a slot.
///
/// Strings name a service to resolve at build time. Anything that must be
/// passed verbatim, strings included, goes through [`literal`].
#[derive(Clone)]
pub enum Argument {
  Service(String),
  Literal {
    type_name: &'static str,
    payload: Instance,
  },
  /// No concrete given; the strategy supplies one while building.
  Inferred,
}

impl Argument {
  pub fn service(interface: impl Into<String>) -> Self {
    Argument::Service(interface.into())
  }

  pub fn literal<T: Any + Send + Sync>(value: T) -> Self {
    Argument::Literal {
      type_name: std::any::type_name::<T>(),
      payload: Arc::new(value),
    }
  }
}

/// Wraps `value` so it is used verbatim instead of being resolved.
pub fn literal<T: Any + Send + Sync>(value: T) -> Argument {
  Argument::literal(value)
}

impl From<&str> for Argument {
  fn from(interface: &str) -> Self {
    Argument::Service(interface.to_owned())
  }
}

impl From<String> for Argument {
  fn from(interface: String) -> Self {
    Argument::Service(interface)
  }
}

impl fmt::Debug for Argument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Argument::Service(interface) => f.debug_tuple("Service").field(interface).finish(),
      Argument::Literal { type_name, .. } => write!(f, "Literal({})", type_name),
      Argument::Inferred => f.write_str("Inferred"),
    }
  }
}

/// How a stored [`Value`] turns into an object at build time.
#[derive(Clone)]
pub enum ValueKind {
  /// Resolve the named interface through the building container.
  Resolve(String),
  /// Use the payload as is.
  Literal {
    type_name: &'static str,
    payload: Instance,
  },
  /// Let the strategy work it out from the class signature.
  Inferred,
}

/// One bound parameter, property or method argument of a definition.
#[derive(Clone)]
pub struct Value {
  name: Option<String>,
  position: Option<usize>,
  kind: ValueKind,
}

impl Value {
  /// Creates a value resolving `interface`. Blank interface names can not name
  /// a service and are rejected.
  pub fn resolver(
    name: Option<String>,
    position: Option<usize>,
    interface: impl Into<String>,
  ) -> Result<Self> {
    let interface = interface.into();
    if interface.trim().is_empty() {
      return Err(Error::incompatible("provided resolver value can not be empty"));
    }

    Ok(Self {
      name,
      position,
      kind: ValueKind::Resolve(interface),
    })
  }

  pub fn literal<T: Any + Send + Sync>(name: Option<String>, position: Option<usize>, payload: T) -> Self {
    Self {
      name,
      position,
      kind: ValueKind::Literal {
        type_name: std::any::type_name::<T>(),
        payload: Arc::new(payload),
      },
    }
  }

  pub fn inferred(name: Option<String>, position: Option<usize>) -> Self {
    Self {
      name,
      position,
      kind: ValueKind::Inferred,
    }
  }

  /// Lifts a caller argument bound at `slot` into a stored value.
  pub fn from_argument(slot: &Slot, argument: Argument) -> Result<Self> {
    let name = slot.name().map(str::to_owned);
    let position = slot.position();

    match argument {
      Argument::Service(interface) => Self::resolver(name, position, interface),
      Argument::Literal { type_name, payload } => Ok(Self {
        name,
        position,
        kind: ValueKind::Literal { type_name, payload },
      }),
      Argument::Inferred => Ok(Self::inferred(name, position)),
    }
  }

  pub fn kind(&self) -> &ValueKind {
    &self.kind
  }

  /// `"resolver"` for values resolved as services, `"inferred"` for omitted
  /// concretes, otherwise the Rust type name of the literal.
  pub fn type_name(&self) -> &'static str {
    match &self.kind {
      ValueKind::Resolve(_) => "resolver",
      ValueKind::Literal { type_name, .. } => type_name,
      ValueKind::Inferred => "inferred",
    }
  }

  pub fn is_resolver(&self) -> bool {
    matches!(self.kind, ValueKind::Resolve(_))
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn set_name(&mut self, name: impl Into<String>) {
    self.name = Some(name.into());
  }

  pub fn position(&self) -> Option<usize> {
    self.position
  }

  pub fn set_position(&mut self, position: usize) {
    self.position = Some(position);
  }

  /// Forgets the name and position this value was bound with.
  pub fn clear_origin(&mut self) {
    self.name = None;
    self.position = None;
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut out = f.debug_struct("Value");
    out.field("name", &self.name).field("position", &self.position);
    match &self.kind {
      ValueKind::Resolve(interface) => out.field("resolve", interface),
      ValueKind::Literal { type_name, .. } => out.field("literal", type_name),
      ValueKind::Inferred => out.field("inferred", &true),
    };
    out.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolver_rejects_blank_interfaces() {
    assert!(Value::resolver(None, None, "").unwrap_err().is_incompatibility());
    assert!(Value::resolver(Some("x".into()), None, "  ").is_err());
    assert!(Value::resolver(None, Some(0), "Logger").unwrap().is_resolver());
  }

  #[test]
  fn literal_keeps_payload_and_type_name() {
    let value = Value::literal(Some("port".into()), None, 8080_u16);
    assert_eq!(value.type_name(), "u16");
    match value.kind() {
      ValueKind::Literal { payload, .. } => {
        assert_eq!(*payload.clone().downcast::<u16>().unwrap(), 8080);
      }
      _ => panic!("expected a literal value"),
    }
  }

  #[test]
  fn clear_origin_drops_name_and_position() {
    let mut value = Value::from_argument(&Slot::Positional(2), "Logger".into()).unwrap();
    value.set_name("logger");
    assert_eq!(value.name(), Some("logger"));
    assert_eq!(value.position(), Some(2));

    value.clear_origin();
    assert_eq!(value.name(), None);
    assert_eq!(value.position(), None);
  }

  #[test]
  fn string_arguments_resolve_and_literals_do_not() {
    let resolved = Value::from_argument(&"logger".into(), Argument::from("Logger")).unwrap();
    assert_eq!(resolved.type_name(), "resolver");

    let verbatim = Value::from_argument(&"path".into(), literal(String::from("Logger"))).unwrap();
    assert!(!verbatim.is_resolver());
    assert_eq!(verbatim.type_name(), "alloc::string::String");
  }
}
