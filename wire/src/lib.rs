//! # Fibre Wire
//!
//! A string-keyed dependency injection container with pluggable build
//! strategies.
//!
//! Services are registered under interface names and bound to a class, a
//! factory or a ready instance. Each registration returns a [`Concrete`]
//! handle for fluent configuration: constructor parameters, properties,
//! method calls, extensions and sharing. How a definition turns into an
//! object is decided by the container's [`ContainerStrategy`].
//!
//! ## Core Concepts
//!
//! - **Classes**: Rust has no runtime reflection, so every buildable type is
//!   described once by a [`Class`] in a [`ClassMap`]: its constructor, the
//!   interfaces it may service, its properties and methods.
//! - **Strategies**: [`ManualWiringStrategy`] builds exactly what was bound.
//!   [`AutowiringStrategy`] also reads wiring attributes off classes and
//!   infers unbound constructor parameters.
//! - **Sharing**: shared services are built once and cached; `make` always
//!   builds a fresh instance.
//! - **Delegation**: a container may ignore interfaces and connect to peers
//!   that service them instead.
//! - **Providers**: a [`ServiceProvider`] bundles registrations and runs at
//!   most once per container.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_wire::{bindings, literal, resolve, Class, ClassMap, Container, ManualWiringStrategy};
//! use std::sync::Arc;
//!
//! struct Transport {
//!   host: String,
//! }
//!
//! struct Mailer {
//!   transport: Arc<Transport>,
//! }
//!
//! let classes = Arc::new(ClassMap::new());
//! classes
//!   .insert(Class::new::<Transport>("Transport").constructor(|args| {
//!     Ok(Transport {
//!       host: args.cloned::<String>("host")?,
//!     })
//!   }))
//!   .insert(Class::new::<Mailer>("Mailer").constructor(|args| {
//!     Ok(Mailer {
//!       transport: args.get::<Transport>("transport")?,
//!     })
//!   }));
//!
//! let container = Container::with_strategy(ManualWiringStrategy::new(classes));
//! container
//!   .singleton("Transport")?
//!   .with_parameters(bindings!["host" => literal(String::from("smtp.local"))])?;
//! container
//!   .add("Mailer")?
//!   .with_parameters(bindings!["transport" => "Transport"])?;
//!
//! let mailer = resolve!(container, "Mailer" as Mailer);
//! assert_eq!(mailer.transport.host, "smtp.local");
//! # Ok::<(), fibre_wire::Error>(())
//! ```

mod callback;
mod class;
mod concrete;
#[cfg(feature = "config")]
mod config;
mod container;
mod core;
mod definition;
mod error;
mod macros;
mod provider;
mod strategy;
mod value;

pub use callback::{Callback, Extension, Factory};
pub use class::{downcast, Arguments, Attributes, Class, ClassMap, ParameterSpec, Resolved};
pub use concrete::Concrete;
#[cfg(feature = "config")]
pub use config::{ArgumentConfig, CallConfig, ServiceConfig, WiringConfig};
pub use container::{Binding, Container};
pub use crate::core::{Instance, Object, TypeInfo};
pub use definition::{Definition, DefinitionRef};
pub use error::{Error, Result};
pub use provider::{ProviderRef, ServiceProvider};
pub use strategy::{AutowiringStrategy, ContainerStrategy, ManualWiringStrategy};
pub use value::{literal, Argument, Slot, Value, ValueKind};
