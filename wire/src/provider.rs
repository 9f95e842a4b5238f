//! Service providers: reusable bundles of registrations.

use crate::container::Container;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Registers a group of services with a container.
///
/// A container runs each provider at most once, keyed by [`identity`].
///
/// [`identity`]: ServiceProvider::identity
pub trait ServiceProvider: Send + Sync {
  fn register(&self, container: &Container) -> Result<()>;

  /// The key the container remembers this provider by. Defaults to the type
  /// name, so two instances of one provider type count as the same provider.
  fn identity(&self) -> String {
    std::any::type_name::<Self>().to_owned()
  }
}

/// A provider handed to [`Container::register`]: either ready to use or the
/// name of a class the container builds first.
#[derive(Clone)]
pub enum ProviderRef {
  Instance(Arc<dyn ServiceProvider>),
  Class(String),
}

impl ProviderRef {
  pub fn instance<P: ServiceProvider + 'static>(provider: P) -> Self {
    ProviderRef::Instance(Arc::new(provider))
  }

  pub fn class(name: impl Into<String>) -> Self {
    ProviderRef::Class(name.into())
  }

  pub fn identity(&self) -> String {
    match self {
      ProviderRef::Instance(provider) => provider.identity(),
      ProviderRef::Class(name) => name.clone(),
    }
  }
}

impl fmt::Debug for ProviderRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProviderRef::Instance(provider) => f.debug_tuple("Instance").field(&provider.identity()).finish(),
      ProviderRef::Class(name) => f.debug_tuple("Class").field(name).finish(),
    }
  }
}

impl From<&str> for ProviderRef {
  fn from(name: &str) -> Self {
    ProviderRef::Class(name.to_owned())
  }
}

impl From<String> for ProviderRef {
  fn from(name: String) -> Self {
    ProviderRef::Class(name)
  }
}

impl From<Arc<dyn ServiceProvider>> for ProviderRef {
  fn from(provider: Arc<dyn ServiceProvider>) -> Self {
    ProviderRef::Instance(provider)
  }
}
