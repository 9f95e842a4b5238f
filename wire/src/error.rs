//! Error types reported by the container, its strategies and the configuration loader.

use thiserror::Error;

/// The result type used throughout `fibre_wire`.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the container can report.
///
/// All errors are raised synchronously at the call that detects them. None of
/// them are transient: they describe programming or configuration mistakes.
#[derive(Debug, Error)]
pub enum Error {
  /// A binding, callback or class the active strategy or definition cannot accept.
  #[error("incompatible binding: {0}")]
  Incompatibility(String),

  /// The interface could not be serviced, locally or through connected containers.
  #[error("unable to resolve interface `{interface}`: {reason}")]
  InterfaceNotFound { interface: String, reason: String },

  /// The operation targets an interface this container ignores.
  #[error("can not {operation} `{interface}`, interface is blocked by this container")]
  BlockedInterface {
    interface: String,
    operation: &'static str,
  },

  /// Resolving the interface requires resolving itself.
  #[error("circular dependency detected: {chain}")]
  CircularDependency { chain: String },

  /// A build needs a class that was never registered with the class map.
  #[error("class `{class}` is not known to the class map")]
  UnknownClass { class: String },

  /// A constructor, factory, method or extension failed while building.
  #[error("failed to build `{interface}`: {reason}")]
  Build { interface: String, reason: String },

  /// The wiring configuration is well formed but unusable.
  #[cfg(feature = "config")]
  #[error("invalid wiring configuration: {0}")]
  Config(String),

  #[cfg(feature = "config")]
  #[error("failed to parse yaml wiring configuration: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[cfg(feature = "config")]
  #[error("failed to parse json wiring configuration: {0}")]
  Json(#[from] serde_json::Error),

  #[cfg(feature = "config")]
  #[error("failed to read wiring configuration: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  pub(crate) fn incompatible(message: impl Into<String>) -> Self {
    Error::Incompatibility(message.into())
  }

  pub(crate) fn not_found(interface: &str, reason: impl Into<String>) -> Self {
    Error::InterfaceNotFound {
      interface: interface.to_owned(),
      reason: reason.into(),
    }
  }

  pub(crate) fn blocked(interface: &str, operation: &'static str) -> Self {
    Error::BlockedInterface {
      interface: interface.to_owned(),
      operation,
    }
  }

  /// Creates a build failure. Constructors and factories use this to report
  /// their own errors.
  pub fn build(interface: impl Into<String>, reason: impl Into<String>) -> Self {
    Error::Build {
      interface: interface.into(),
      reason: reason.into(),
    }
  }

  pub fn is_incompatibility(&self) -> bool {
    matches!(self, Error::Incompatibility(_))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::InterfaceNotFound { .. })
  }

  pub fn is_blocked(&self) -> bool {
    matches!(self, Error::BlockedInterface { .. })
  }
}
