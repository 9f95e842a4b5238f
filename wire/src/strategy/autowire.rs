use super::{check_callback, definition_from_attributes, Assembly, ContainerStrategy};
use crate::callback::Callback;
use crate::class::ClassMap;
use crate::container::Container;
use crate::core::Instance;
use crate::definition::{Definition, DefinitionRef};
use crate::error::Result;
use std::sync::Arc;

/// Builds from class metadata.
///
/// Class bindings pick up the wiring attributes of their class, named method
/// arguments are allowed, and constructor parameters or properties left
/// unbound are inferred from their declared interface or default.
#[derive(Debug, Default, Clone)]
pub struct AutowiringStrategy {
  classes: Arc<ClassMap>,
}

impl AutowiringStrategy {
  pub fn new(classes: Arc<ClassMap>) -> Self {
    Self { classes }
  }

  pub fn classes(&self) -> &Arc<ClassMap> {
    &self.classes
  }
}

impl ContainerStrategy for AutowiringStrategy {
  fn supports_coordinated_entities(&self) -> bool {
    true
  }

  fn can_automatically_resolve_entities(&self) -> bool {
    true
  }

  fn can_aggregate_entities(&self) -> bool {
    true
  }

  fn conforms(&self, class: &str, interface: &str) -> bool {
    class == interface || self.classes.is_a(class, interface)
  }

  fn create_from_attributes(&self, interface: &str, concrete_class: &str) -> Result<Definition> {
    definition_from_attributes(&self.classes, interface, concrete_class)
  }

  fn sanitize_callback(&self, callback: Callback, interface: &str, concrete_class: &str) -> Result<Callback> {
    check_callback(&self.classes, callback, interface, concrete_class)
  }

  fn build(&self, definition: &DefinitionRef, scope: &Container, ignore_sharing: bool) -> Result<Instance> {
    Assembly {
      classes: &self.classes,
      scope,
      infer: true,
    }
    .run(definition, ignore_sharing)
  }
}
