//! Declarative wiring loaded from YAML or JSON.
//!
//! A [`WiringConfig`] describes services the way the fluent API does and is
//! applied with [`Container::configure`], so every binding goes through the
//! same validation as hand-written wiring.
//!
//! ```yaml
//! share_by_default: false
//! ignore: [Clock]
//! services:
//!   - interface: Mailer
//!     class: SmtpMailer
//!     shared: true
//!     parameters:
//!       transport: Transport
//!       port: { literal: 25 }
//!     calls:
//!       - method: use_logger
//!         arguments:
//!           "0": Logger
//! ```

use crate::container::{Binding, Container};
use crate::error::{Error, Result};
use crate::value::{literal, Argument, Slot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// The root of a wiring file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiringConfig {
  /// Applied before any service is added.
  pub share_by_default: bool,
  /// Applied after all services are added.
  pub ignore: Vec<String>,
  pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
  pub interface: String,
  /// Defaults to the interface itself.
  #[serde(default)]
  pub class: Option<String>,
  #[serde(default)]
  pub shared: Option<bool>,
  /// Keys made of digits are positions, anything else is a name.
  #[serde(default)]
  pub parameters: BTreeMap<String, ArgumentConfig>,
  #[serde(default)]
  pub properties: BTreeMap<String, ArgumentConfig>,
  #[serde(default)]
  pub calls: Vec<CallConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallConfig {
  pub method: String,
  #[serde(default)]
  pub arguments: BTreeMap<String, ArgumentConfig>,
}

/// One bound argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentConfig {
  /// The interface to resolve.
  Service(String),
  /// A verbatim value. Strings, booleans, integers and floats become
  /// `String`, `bool`, `i64` and `f64`; anything else stays a
  /// `serde_json::Value`.
  Literal { literal: serde_json::Value },
  /// `{ infer: true }` leaves the concrete to the strategy.
  Infer { infer: bool },
}

impl ArgumentConfig {
  fn to_argument(&self) -> Result<Argument> {
    match self {
      ArgumentConfig::Service(interface) => Ok(Argument::service(interface.clone())),
      ArgumentConfig::Literal { literal: value } => Ok(literal_from_json(value)),
      ArgumentConfig::Infer { infer: true } => Ok(Argument::Inferred),
      ArgumentConfig::Infer { infer: false } => Err(Error::Config(
        "`infer: false` does not bind anything, give a service or a literal".to_owned(),
      )),
    }
  }
}

fn literal_from_json(value: &serde_json::Value) -> Argument {
  match value {
    serde_json::Value::String(text) => literal(text.clone()),
    serde_json::Value::Bool(flag) => literal(*flag),
    serde_json::Value::Number(number) => match number.as_i64() {
      Some(integer) => literal(integer),
      None => literal(number.as_f64().unwrap_or(f64::NAN)),
    },
    other => literal(other.clone()),
  }
}

fn slot_for(key: &str) -> Slot {
  match key.parse::<usize>() {
    Ok(position) => Slot::Positional(position),
    Err(_) => Slot::Named(key.to_owned()),
  }
}

fn arguments(entries: &BTreeMap<String, ArgumentConfig>) -> Result<Vec<(Slot, Argument)>> {
  entries
    .iter()
    .map(|(key, argument)| Ok((slot_for(key), argument.to_argument()?)))
    .collect()
}

impl WiringConfig {
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(source)?)
  }

  pub fn from_json_str(source: &str) -> Result<Self> {
    Ok(serde_json::from_str(source)?)
  }

  /// Loads a `.yaml`, `.yml` or `.json` file.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    match path.extension().and_then(|extension| extension.to_str()) {
      Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
      Some("json") => Self::from_json_str(&source),
      _ => Err(Error::Config(format!(
        "unsupported wiring file `{}`, expected .yaml, .yml or .json",
        path.display()
      ))),
    }
  }
}

impl Container {
  /// Applies a wiring configuration. Services are added in file order; the
  /// first invalid entry stops the run and leaves earlier entries applied.
  ///
  /// `share_by_default` covers the configured services only. The container's
  /// own default is restored afterwards, whether or not the run succeeds.
  pub fn configure(&self, config: &WiringConfig) -> Result<&Self> {
    let previous = self.shares_by_default();
    if config.share_by_default {
      self.default_to_share(true);
    }
    let applied = self.apply_services(&config.services);
    self.default_to_share(previous);
    applied?;

    self.ignore(&config.ignore);
    Ok(self)
  }

  fn apply_services(&self, services: &[ServiceConfig]) -> Result<()> {
    for service in services {
      if service.interface.trim().is_empty() {
        return Err(Error::Config("a service entry has an empty interface".to_owned()));
      }

      let binding = match &service.class {
        Some(class) => Binding::Class(class.clone()),
        None => Binding::Class(service.interface.clone()),
      };
      let mut concrete = self
        .add_with(&service.interface, binding)?
        .with_parameters(arguments(&service.parameters)?)?
        .with_properties(arguments(&service.properties)?)?;

      for call in &service.calls {
        concrete = concrete.with_method_call(&call.method, arguments(&call.arguments)?)?;
      }
      if let Some(shared) = service.shared {
        concrete = concrete.shared(shared);
      }

      debug!(interface = %service.interface, "service configured");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn digit_keys_are_positions() {
    assert_eq!(slot_for("0"), Slot::Positional(0));
    assert_eq!(slot_for("12"), Slot::Positional(12));
    assert_eq!(slot_for("port"), Slot::Named("port".to_owned()));
  }

  #[test]
  fn untagged_arguments_pick_their_shape() {
    let parsed: BTreeMap<String, ArgumentConfig> =
      serde_json::from_str(r#"{ "a": "Logger", "b": { "literal": 3 }, "c": { "infer": true } }"#).unwrap();

    assert_eq!(parsed["a"], ArgumentConfig::Service("Logger".to_owned()));
    assert_eq!(parsed["b"], ArgumentConfig::Literal { literal: serde_json::json!(3) });
    assert_eq!(parsed["c"], ArgumentConfig::Infer { infer: true });
  }

  #[test]
  fn literal_numbers_keep_their_kind() {
    let integer = literal_from_json(&serde_json::json!(25));
    let float = literal_from_json(&serde_json::json!(0.5));
    match (integer, float) {
      (Argument::Literal { type_name: a, .. }, Argument::Literal { type_name: b, .. }) => {
        assert_eq!(a, "i64");
        assert_eq!(b, "f64");
      }
      _ => panic!("expected literals"),
    }
  }
}
