//! The container: registration, resolution, delegation and sharing.

use crate::callback::{Callback, Extension, Factory};
use crate::concrete::Concrete;
use crate::core::{Instance, ResolutionGuard};
use crate::definition::{Definition, DefinitionRef};
use crate::error::{Error, Result};
use crate::provider::{ProviderRef, ServiceProvider};
use crate::strategy::{ContainerStrategy, ManualWiringStrategy};
use crate::value::Slot;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// What an interface is bound to when it is added.
#[derive(Clone)]
pub enum Binding {
  /// A class name, resolved through the strategy's class map.
  Class(String),
  Factory(Factory),
  /// A ready instance. The definition becomes shared and serves it as is.
  ///
  /// There is nothing to rebuild it from: [`Container::make`], or `get` after
  /// the instance was forgotten or unshared, fails with an incompatibility.
  /// Bind a class or factory when fresh instances are needed.
  Instance(Instance),
}

impl Binding {
  pub fn class(name: impl Into<String>) -> Self {
    Binding::Class(name.into())
  }

  pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
    Binding::Instance(Arc::new(value))
  }

  fn kind(&self) -> &'static str {
    match self {
      Binding::Class(_) => "class",
      Binding::Factory(_) => "factory",
      Binding::Instance(_) => "instance",
    }
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Binding::Class(name) => f.debug_tuple("Class").field(name).finish(),
      Binding::Factory(factory) => f.debug_tuple("Factory").field(factory).finish(),
      Binding::Instance(_) => f.write_str("Instance(..)"),
    }
  }
}

impl From<&str> for Binding {
  fn from(name: &str) -> Self {
    Binding::Class(name.to_owned())
  }
}

impl From<String> for Binding {
  fn from(name: String) -> Self {
    Binding::Class(name)
  }
}

impl From<Factory> for Binding {
  fn from(factory: Factory) -> Self {
    Binding::Factory(factory)
  }
}

impl From<Instance> for Binding {
  fn from(instance: Instance) -> Self {
    Binding::Instance(instance)
  }
}

/// A dependency injection container.
///
/// Services are registered per interface name and built by the container's
/// [`ContainerStrategy`] on first resolution. Interfaces a container ignores
/// are delegated to its connected peers.
///
/// All operations take `&self`; a container can be shared across threads
/// behind an `Arc`.
pub struct Container {
  id: u64,
  strategy: Arc<dyn ContainerStrategy>,
  definitions: DashMap<String, DefinitionRef>,
  ignored: RwLock<Vec<String>>,
  peers: RwLock<Vec<Weak<Container>>>,
  providers: RwLock<Vec<String>>,
  defaults_to_share: AtomicBool,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// A container with manual wiring and an empty class map.
  pub fn new() -> Self {
    Self::with_strategy(ManualWiringStrategy::default())
  }

  pub fn with_strategy(strategy: impl ContainerStrategy + 'static) -> Self {
    Self::with_shared_strategy(Arc::new(strategy))
  }

  pub fn with_shared_strategy(strategy: Arc<dyn ContainerStrategy>) -> Self {
    let id = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);
    trace!(container = id, "container created");
    Self {
      id,
      strategy,
      definitions: DashMap::new(),
      ignored: RwLock::new(Vec::new()),
      peers: RwLock::new(Vec::new()),
      providers: RwLock::new(Vec::new()),
      defaults_to_share: AtomicBool::new(false),
    }
  }

  pub fn strategy(&self) -> &Arc<dyn ContainerStrategy> {
    &self.strategy
  }

  // --- Resolution ---

  /// Resolves `interface`.
  ///
  /// Ignored interfaces are delegated to the first connected container that
  /// has them. Shared definitions return their cached instance once built.
  pub fn get(&self, interface: &str) -> Result<Instance> {
    self.get_within(interface, &mut Vec::new())
  }

  /// Resolves `interface` and downcasts the instance to `T`.
  pub fn get_as<T: Any + Send + Sync>(&self, interface: &str) -> Result<Arc<T>> {
    self.get(interface)?.downcast::<T>().map_err(|_| {
      Error::incompatible(format!(
        "`{}` does not resolve to a `{}`",
        interface,
        std::any::type_name::<T>()
      ))
    })
  }

  fn get_within(&self, interface: &str, visited: &mut Vec<u64>) -> Result<Instance> {
    if self.is_ignored(interface) {
      return self.delegate(interface, visited);
    }

    let definition = self
      .local(interface)
      .ok_or_else(|| Error::not_found(interface, "no definition in this container"))?;

    if let Some(instance) = Self::cached(&definition) {
      trace!(interface, "serving shared instance");
      return Ok(instance);
    }

    let _guard = ResolutionGuard::enter(self.id, interface)?;
    self.strategy.build(&definition, self, false)
  }

  fn delegate(&self, interface: &str, visited: &mut Vec<u64>) -> Result<Instance> {
    let peers = self.connected();
    if peers.is_empty() {
      return Err(Error::not_found(
        interface,
        "interface is ignored and no containers are connected",
      ));
    }

    visited.push(self.id);
    for peer in peers {
      if visited.contains(&peer.id) {
        continue;
      }
      if peer.has_within(interface, &mut visited.clone()) {
        debug!(interface, from = self.id, to = peer.id, "delegating resolution");
        return peer.get_within(interface, visited);
      }
      if peer.is_ignored(interface) && peer.has_connections() {
        debug!(interface, from = self.id, to = peer.id, "delegating resolution onward");
        return peer.get_within(interface, visited);
      }
    }

    Err(Error::not_found(interface, "no connected container services it"))
  }

  fn cached(definition: &DefinitionRef) -> Option<Instance> {
    let definition = definition.read();
    if definition.is_shared() {
      definition.instance().cloned()
    } else {
      None
    }
  }

  /// Whether `interface` can be resolved here or through a connected container.
  pub fn has(&self, interface: &str) -> bool {
    self.has_within(interface, &mut Vec::new())
  }

  fn has_within(&self, interface: &str, visited: &mut Vec<u64>) -> bool {
    if self.is_ignored(interface) {
      return false;
    }
    if self.definitions.contains_key(interface) {
      return true;
    }
    if visited.contains(&self.id) {
      return false;
    }

    visited.push(self.id);
    self
      .connected()
      .iter()
      .any(|peer| !visited.contains(&peer.id) && peer.has_within(interface, visited))
  }

  /// Builds a fresh instance of `interface`, bypassing and leaving untouched
  /// any shared instance. Interfaces without a definition are built as their
  /// own class.
  pub fn make(&self, interface: &str) -> Result<Instance> {
    let definition = match self.local(interface) {
      Some(definition) => definition,
      None if self.strategy.can_aggregate_entities() => {
        self.strategy.create_from_attributes(interface, interface)?.into_shared()
      }
      None => Definition::new(interface).into_shared(),
    };

    let _guard = ResolutionGuard::enter(self.id, interface)?;
    debug!(interface, "making fresh instance");
    self.strategy.build(&definition, self, true)
  }

  pub fn make_as<T: Any + Send + Sync>(&self, interface: &str) -> Result<Arc<T>> {
    self.make(interface)?.downcast::<T>().map_err(|_| {
      Error::incompatible(format!(
        "`{}` does not make a `{}`",
        interface,
        std::any::type_name::<T>()
      ))
    })
  }

  // --- Registration ---

  /// Adds `interface` bound to itself.
  pub fn add(&self, interface: &str) -> Result<Concrete> {
    self.add_with(interface, Binding::Class(interface.to_owned()))
  }

  /// Adds `interface` bound to a class, factory or instance, replacing any
  /// previous definition.
  pub fn add_with(&self, interface: &str, concrete: impl Into<Binding>) -> Result<Concrete> {
    let mut definition = match concrete.into() {
      Binding::Class(class) if self.strategy.can_aggregate_entities() => {
        self.strategy.create_from_attributes(interface, &class)?
      }
      Binding::Class(class) => Definition::with_concrete(interface, class),
      Binding::Factory(factory) => {
        let factory = self
          .strategy
          .sanitize_callback(Callback::Factory(factory), interface, interface)?
          .into_factory()?;
        let mut definition = Definition::new(interface);
        definition.set_factory(factory);
        definition
      }
      Binding::Instance(instance) => {
        let mut definition = Definition::new(interface);
        let bound = interface.to_owned();
        definition.set_factory(Factory::erased(move |_: &Container| {
          Err(Error::incompatible(format!(
            "`{}` is bound to an instance and can not be rebuilt, bind a class or factory instead",
            bound
          )))
        }));
        definition.set_shared(true);
        definition.set_instance(instance);
        definition
      }
    };

    if self.defaults_to_share.load(Ordering::Acquire) {
      definition.set_shared(true);
    }

    debug!(
      interface,
      class = definition.concrete_class(),
      shared = definition.is_shared(),
      "service added"
    );

    let definition = definition.into_shared();
    self.definitions.insert(interface.to_owned(), Arc::clone(&definition));
    Ok(Concrete::new(definition, Arc::clone(&self.strategy)))
  }

  /// Adds several interfaces at once.
  ///
  /// Positional entries add the named interface bound to itself, named entries
  /// bind the key to the given class. Entries are applied in order and an
  /// invalid entry stops the batch.
  pub fn wire<I>(&self, bindings: I) -> Result<&Self>
  where
    I: IntoIterator<Item = (Slot, Binding)>,
  {
    for (key, binding) in bindings {
      let kind = binding.kind();
      match (key, binding) {
        (Slot::Positional(_), Binding::Class(interface)) => {
          if self.is_ignored(&interface) {
            return Err(Error::blocked(&interface, "add"));
          }
          self.add(&interface)?;
        }
        // Without a name there is nothing that could be blocked.
        (Slot::Positional(_), _) => {
          return Err(Error::incompatible(format!(
            "positional entries name an interface, {} given",
            kind
          )));
        }
        (Slot::Named(interface), binding) => {
          if self.is_ignored(&interface) {
            return Err(Error::blocked(&interface, "add"));
          }
          let Binding::Class(class) = binding else {
            return Err(Error::incompatible(format!(
              "`{}` must be bound to a class name, {} given",
              interface, kind
            )));
          };
          self.add_with(&interface, Binding::Class(class))?;
        }
      }
    }
    Ok(self)
  }

  /// Adds `interface` bound to itself and shared.
  pub fn singleton(&self, interface: &str) -> Result<Concrete> {
    if self.is_ignored(interface) {
      return Err(Error::blocked(interface, "add singleton"));
    }
    Ok(self.add(interface)?.shared(true))
  }

  pub fn singleton_with(&self, interface: &str, concrete: impl Into<Binding>) -> Result<Concrete> {
    if self.is_ignored(interface) {
      return Err(Error::blocked(interface, "add singleton"));
    }
    Ok(self.add_with(interface, concrete)?.shared(true))
  }

  /// Appends an extension to the definition of `interface`.
  pub fn extend(&self, interface: &str, extension: Extension) -> Result<&Self> {
    if self.is_ignored(interface) {
      return Err(Error::blocked(interface, "extend"));
    }
    self.concrete(interface)?.extend(extension)?;
    Ok(self)
  }

  /// Like [`extend`](Self::extend), but does nothing when `interface` has no
  /// local definition or is ignored.
  pub fn extend_if(&self, interface: &str, extension: Extension) -> Result<&Self> {
    if self.is_ignored(interface) || !self.definitions.contains_key(interface) {
      return Ok(self);
    }
    self.extend(interface, extension)
  }

  /// A handle on the existing definition of `interface`.
  pub fn concrete(&self, interface: &str) -> Result<Concrete> {
    if self.is_ignored(interface) {
      return Err(Error::blocked(interface, "fetch the concrete of"));
    }
    let definition = self
      .local(interface)
      .ok_or_else(|| Error::not_found(interface, "no definition in this container"))?;
    Ok(Concrete::new(definition, Arc::clone(&self.strategy)))
  }

  /// A snapshot of the definition of `interface`.
  pub fn definition(&self, interface: &str) -> Option<Definition> {
    self.local(interface).map(|definition| definition.read().clone())
  }

  /// Removes the definition of `interface`. Returns whether one existed.
  pub fn forget(&self, interface: &str) -> bool {
    let removed = self.definitions.remove(interface).is_some();
    if removed {
      debug!(interface, "service forgotten");
    }
    removed
  }

  // --- Connections ---

  /// Connects peers this container delegates ignored interfaces to. Peers are
  /// held weakly and consulted in connection order.
  pub fn connect_with<'a, I>(&self, peers: I) -> &Self
  where
    I: IntoIterator<Item = &'a Arc<Container>>,
  {
    let mut connected = self.peers.write();
    connected.retain(|peer| peer.strong_count() > 0);
    for peer in peers {
      if peer.id == self.id {
        continue;
      }
      let weak = Arc::downgrade(peer);
      if !connected.iter().any(|existing| existing.ptr_eq(&weak)) {
        trace!(container = self.id, peer = peer.id, "container connected");
        connected.push(weak);
      }
    }
    self
  }

  pub fn disconnect_from<'a, I>(&self, peers: I) -> &Self
  where
    I: IntoIterator<Item = &'a Arc<Container>>,
  {
    let mut connected = self.peers.write();
    for peer in peers {
      let weak = Arc::downgrade(peer);
      connected.retain(|existing| !existing.ptr_eq(&weak));
    }
    connected.retain(|peer| peer.strong_count() > 0);
    self
  }

  pub fn has_connections(&self) -> bool {
    self.peers.read().iter().any(|peer| peer.strong_count() > 0)
  }

  // --- Ignoring ---

  /// Blocks interfaces locally. Resolving them goes to connected containers;
  /// definitions stay stored.
  pub fn ignore<I, S>(&self, interfaces: I) -> &Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut ignored = self.ignored.write();
    for interface in interfaces {
      let interface = interface.as_ref();
      if !ignored.iter().any(|existing| existing == interface) {
        ignored.push(interface.to_owned());
      }
    }
    self
  }

  /// Stops ignoring the given interfaces. An empty list clears every ignore.
  pub fn unignore<I, S>(&self, interfaces: I) -> &Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut ignored = self.ignored.write();
    let mut interfaces = interfaces.into_iter().peekable();
    if interfaces.peek().is_none() {
      ignored.clear();
      return self;
    }
    for interface in interfaces {
      ignored.retain(|existing| existing != interface.as_ref());
    }
    self
  }

  pub fn unignore_all(&self) -> &Self {
    self.ignored.write().clear();
    self
  }

  /// Whether every given interface is ignored.
  pub fn does_ignore<I, S>(&self, interfaces: I) -> bool
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let ignored = self.ignored.read();
    interfaces
      .into_iter()
      .all(|interface| ignored.iter().any(|existing| existing == interface.as_ref()))
  }

  // --- Sharing ---

  /// Marks the local definitions of the given interfaces shared.
  pub fn share<I, S>(&self, interfaces: I) -> &Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.set_sharing(interfaces, true)
  }

  /// Marks the local definitions of the given interfaces not shared, dropping
  /// their cached instances.
  pub fn unshare<I, S>(&self, interfaces: I) -> &Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.set_sharing(interfaces, false)
  }

  fn set_sharing<I, S>(&self, interfaces: I, shared: bool) -> &Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    for interface in interfaces {
      let interface = interface.as_ref();
      if !self.has(interface) {
        continue;
      }
      if let Some(definition) = self.local(interface) {
        definition.write().set_shared(shared);
        trace!(interface, shared, "sharing switched");
      }
    }
    self
  }

  /// Whether every given interface is resolvable and locally shared.
  pub fn does_share<I, S>(&self, interfaces: I) -> bool
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    interfaces.into_iter().all(|interface| {
      let interface = interface.as_ref();
      self.has(interface)
        && self
          .local(interface)
          .map(|definition| definition.read().is_shared())
          .unwrap_or(false)
    })
  }

  /// Whether services added from now on start out shared.
  pub fn default_to_share(&self, share: bool) -> &Self {
    self.defaults_to_share.store(share, Ordering::Release);
    self
  }

  pub fn shares_by_default(&self) -> bool {
    self.defaults_to_share.load(Ordering::Acquire)
  }

  // --- Service providers ---

  /// Runs each provider's registration once. Providers already registered,
  /// by identity, are skipped. Class providers are built with [`make`](Self::make)
  /// and known under their class name and the identity of the built provider,
  /// so passing the same provider by class and by instance registers it once.
  pub fn register<I>(&self, providers: I) -> Result<&Self>
  where
    I: IntoIterator<Item = ProviderRef>,
  {
    for provider in providers {
      if self.supports(&provider) {
        trace!(provider = %provider.identity(), "provider already registered");
        continue;
      }

      let (service_provider, identities): (Arc<dyn ServiceProvider>, Vec<String>) = match provider {
        ProviderRef::Instance(service_provider) => {
          let identity = service_provider.identity();
          (service_provider, vec![identity])
        }
        ProviderRef::Class(class) => {
          let built = self
            .make(&class)?
            .downcast::<Arc<dyn ServiceProvider>>()
            .map(|built| Arc::clone(&*built))
            .map_err(|_| Error::incompatible(format!("`{}` does not build a service provider", class)))?;
          let identity = built.identity();
          if self.is_registered(&identity) {
            trace!(provider = %class, identity = %identity, "provider already registered");
            self.record_providers(vec![class]);
            continue;
          }
          (built, vec![class, identity])
        }
      };

      service_provider.register(self)?;
      debug!(provider = %identities.join(", "), "provider registered");
      self.record_providers(identities);
    }
    Ok(self)
  }

  /// Whether a provider with the same identity was registered.
  pub fn supports(&self, provider: &ProviderRef) -> bool {
    self.is_registered(&provider.identity())
  }

  // --- Private helpers ---

  fn is_registered(&self, identity: &str) -> bool {
    self.providers.read().iter().any(|known| known == identity)
  }

  fn record_providers(&self, identities: Vec<String>) {
    let mut providers = self.providers.write();
    for identity in identities {
      if !providers.contains(&identity) {
        providers.push(identity);
      }
    }
  }

  pub(crate) fn is_ignored(&self, interface: &str) -> bool {
    self.ignored.read().iter().any(|existing| existing == interface)
  }

  fn local(&self, interface: &str) -> Option<DefinitionRef> {
    self
      .definitions
      .get(interface)
      .map(|definition| Arc::clone(definition.value()))
  }

  fn connected(&self) -> Vec<Arc<Container>> {
    self.peers.read().iter().filter_map(Weak::upgrade).collect()
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut interfaces: Vec<String> = self.definitions.iter().map(|entry| entry.key().clone()).collect();
    interfaces.sort();
    f.debug_struct("Container")
      .field("id", &self.id)
      .field("interfaces", &interfaces)
      .field("ignored", &*self.ignored.read())
      .field("peers", &self.peers.read().len())
      .field("providers", &*self.providers.read())
      .finish()
  }
}
