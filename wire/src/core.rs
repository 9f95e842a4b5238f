//! Core runtime types shared by every part of the container.

use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// A resolved service, shared between the container cache and its consumers.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// An object while it is still being assembled. Properties, method calls and
/// extensions operate on it before it is frozen into an [`Instance`].
pub type Object = Box<dyn Any + Send + Sync>;

/// The runtime type tag of a built object.
#[derive(Clone, Copy)]
pub struct TypeInfo {
  id: TypeId,
  name: &'static str,
}

impl TypeInfo {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Checks whether the assembled object is of this type.
  pub fn matches(&self, object: &Object) -> bool {
    Any::type_id(&**object) == self.id
  }
}

impl PartialEq for TypeInfo {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeInfo({})", self.name)
  }
}

thread_local! {
  // The interfaces currently being built on this thread, in resolution order.
  // A key showing up twice means the dependency graph loops.
  static RESOLVING_STACK: RefCell<Vec<ResolutionKey>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct ResolutionKey {
  pub(crate) container: u64,
  pub(crate) interface: String,
}

impl fmt::Debug for ResolutionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{}", self.interface, self.container)
  }
}

/// An RAII guard that detects circular dependencies.
///
/// Entering pushes the key onto the thread-local resolution stack and fails if
/// the key is already present. Dropping the guard pops the key again.
pub(crate) struct ResolutionGuard {
  key: ResolutionKey,
}

impl ResolutionGuard {
  pub(crate) fn enter(container: u64, interface: &str) -> Result<Self> {
    let key = ResolutionKey {
      container,
      interface: interface.to_owned(),
    };

    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(start) = stack.iter().position(|k| *k == key) {
        let chain = stack[start..]
          .iter()
          .map(|k| k.interface.as_str())
          .chain(std::iter::once(key.interface.as_str()))
          .collect::<Vec<_>>()
          .join(" -> ");
        return Err(Error::CircularDependency { chain });
      }
      stack.push(key.clone());
      Ok(())
    })?;

    Ok(Self { key })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(index) = stack.iter().rposition(|k| *k == self.key) {
        stack.remove(index);
      }
    });
  }
}
