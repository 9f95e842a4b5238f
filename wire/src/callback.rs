//! Factories and extensions attached to a definition.

use crate::container::Container;
use crate::core::{Object, TypeInfo};
use crate::error::{Error, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type FactoryFn = dyn Fn(&Container) -> Result<Object> + Send + Sync;
type ExtensionFn = dyn Fn(Object, &Container) -> Result<Object> + Send + Sync;

/// Produces the object for a definition instead of its concrete class.
#[derive(Clone)]
pub struct Factory {
  produces: Option<TypeInfo>,
  func: Arc<FactoryFn>,
}

impl Factory {
  /// A factory producing `T`. The type is known up front, so strategies can
  /// reject it when it does not match the serviced class.
  pub fn new<T, F>(factory: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
  {
    Self {
      produces: Some(TypeInfo::of::<T>()),
      func: Arc::new(move |container: &Container| {
        Ok(Box::new(factory(container)?) as Object)
      }),
    }
  }

  /// A factory whose product type is only known once it runs.
  pub fn erased<F>(factory: F) -> Self
  where
    F: Fn(&Container) -> Result<Object> + Send + Sync + 'static,
  {
    Self {
      produces: None,
      func: Arc::new(factory),
    }
  }

  pub fn produces(&self) -> Option<TypeInfo> {
    self.produces
  }

  pub(crate) fn invoke(&self, container: &Container) -> Result<Object> {
    (self.func)(container)
  }

  /// Wraps the factory so its product is checked against `expected`.
  pub(crate) fn guarded(self, interface: &str, expected: TypeInfo) -> Self {
    let interface = interface.to_owned();
    let inner = self.func;
    Self {
      produces: Some(expected),
      func: Arc::new(move |container: &Container| {
        let object = inner(container)?;
        if !expected.matches(&object) {
          return Err(Error::incompatible(format!(
            "factory for `{}` did not produce a `{}`",
            interface,
            expected.name()
          )));
        }
        Ok(object)
      }),
    }
  }
}

impl fmt::Debug for Factory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Factory")
      .field("produces", &self.produces)
      .finish_non_exhaustive()
  }
}

/// A step of the post-construction pipeline. Each extension receives the
/// object built so far and hands on the object the next step works with.
#[derive(Clone)]
pub struct Extension {
  target: Option<TypeInfo>,
  func: Arc<ExtensionFn>,
}

impl Extension {
  /// Augments the built `T` in place.
  pub fn new<T, F>(extension: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(&mut T, &Container) -> Result<()> + Send + Sync + 'static,
  {
    Self {
      target: Some(TypeInfo::of::<T>()),
      func: Arc::new(move |mut object: Object, container: &Container| {
        let target = object.downcast_mut::<T>().ok_or_else(|| {
          Error::incompatible(format!(
            "extension expected a `{}`",
            std::any::type_name::<T>()
          ))
        })?;
        extension(target, container)?;
        Ok(object)
      }),
    }
  }

  /// Replaces the built `T` with the returned one.
  pub fn replace<T, F>(extension: F) -> Self
  where
    T: Any + Send + Sync,
    F: Fn(T, &Container) -> Result<T> + Send + Sync + 'static,
  {
    Self {
      target: Some(TypeInfo::of::<T>()),
      func: Arc::new(move |object: Object, container: &Container| {
        let current = object.downcast::<T>().map_err(|_| {
          Error::incompatible(format!(
            "extension expected a `{}`",
            std::any::type_name::<T>()
          ))
        })?;
        Ok(Box::new(extension(*current, container)?) as Object)
      }),
    }
  }

  pub fn erased<F>(extension: F) -> Self
  where
    F: Fn(Object, &Container) -> Result<Object> + Send + Sync + 'static,
  {
    Self {
      target: None,
      func: Arc::new(extension),
    }
  }

  pub fn target(&self) -> Option<TypeInfo> {
    self.target
  }

  pub(crate) fn apply(&self, object: Object, container: &Container) -> Result<Object> {
    (self.func)(object, container)
  }

  /// Wraps the extension so both what it receives and what it returns are
  /// checked against `expected`.
  pub(crate) fn guarded(self, interface: &str, expected: TypeInfo) -> Self {
    let interface = interface.to_owned();
    let inner = self.func;
    Self {
      target: Some(expected),
      func: Arc::new(move |object: Object, container: &Container| {
        let object = inner(object, container)?;
        if !expected.matches(&object) {
          return Err(Error::incompatible(format!(
            "extension of `{}` did not return a `{}`",
            interface,
            expected.name()
          )));
        }
        Ok(object)
      }),
    }
  }
}

impl fmt::Debug for Extension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Extension")
      .field("target", &self.target)
      .finish_non_exhaustive()
  }
}

/// A callback on its way through `ContainerStrategy::sanitize_callback`.
#[derive(Debug, Clone)]
pub enum Callback {
  Factory(Factory),
  Extension(Extension),
}

impl Callback {
  /// The type the callback declares to produce or extend, if known.
  pub fn declared_type(&self) -> Option<TypeInfo> {
    match self {
      Callback::Factory(factory) => factory.produces(),
      Callback::Extension(extension) => extension.target(),
    }
  }

  pub(crate) fn guarded(self, interface: &str, expected: TypeInfo) -> Self {
    match self {
      Callback::Factory(factory) => Callback::Factory(factory.guarded(interface, expected)),
      Callback::Extension(extension) => Callback::Extension(extension.guarded(interface, expected)),
    }
  }

  pub(crate) fn into_factory(self) -> Result<Factory> {
    match self {
      Callback::Factory(factory) => Ok(factory),
      Callback::Extension(_) => Err(Error::incompatible("expected a factory callback")),
    }
  }

  pub(crate) fn into_extension(self) -> Result<Extension> {
    match self {
      Callback::Extension(extension) => Ok(extension),
      Callback::Factory(_) => Err(Error::incompatible("expected an extension callback")),
    }
  }
}
