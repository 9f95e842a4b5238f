use super::{check_callback, Assembly, ContainerStrategy};
use crate::callback::Callback;
use crate::class::ClassMap;
use crate::container::Container;
use crate::core::Instance;
use crate::definition::{Definition, DefinitionRef};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Builds exactly what was wired: every parameter and property needs a bound
/// concrete, method arguments are positional only and nothing is derived from
/// class metadata.
#[derive(Debug, Default, Clone)]
pub struct ManualWiringStrategy {
  classes: Arc<ClassMap>,
}

impl ManualWiringStrategy {
  pub fn new(classes: Arc<ClassMap>) -> Self {
    Self { classes }
  }

  pub fn classes(&self) -> &Arc<ClassMap> {
    &self.classes
  }
}

impl ContainerStrategy for ManualWiringStrategy {
  fn supports_coordinated_entities(&self) -> bool {
    false
  }

  fn can_automatically_resolve_entities(&self) -> bool {
    false
  }

  fn can_aggregate_entities(&self) -> bool {
    false
  }

  fn conforms(&self, class: &str, interface: &str) -> bool {
    class == interface || self.classes.is_a(class, interface)
  }

  fn create_from_attributes(&self, interface: &str, concrete_class: &str) -> Result<Definition> {
    Err(Error::incompatible(format!(
      "manual wiring does not derive definitions from attributes (`{}` for `{}`)",
      concrete_class, interface
    )))
  }

  fn sanitize_callback(&self, callback: Callback, interface: &str, concrete_class: &str) -> Result<Callback> {
    check_callback(&self.classes, callback, interface, concrete_class)
  }

  fn build(&self, definition: &DefinitionRef, scope: &Container, ignore_sharing: bool) -> Result<Instance> {
    Assembly {
      classes: &self.classes,
      scope,
      infer: false,
    }
    .run(definition, ignore_sharing)
  }
}
