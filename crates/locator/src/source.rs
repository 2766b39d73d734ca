//! Dynamic sources: one prototype, instantiated lazily on first use.
//!
//! # Role
//!
//! A [`DynamicSource`] answers "can you, and will you?" for a capability
//! request. It discovers the capabilities of its prototype, filters requests
//! by tag, instantiates the prototype at most once per instance epoch, and
//! caches one handle per capability.
//!
//! # Invariants
//!
//! - Must not construct more than one instance per instance epoch.
//! - Must not hand out a capability before every initializer of the instance
//!   has run, except to re-entrant calls made from those initializers.
//! - Must not instantiate to evaluate tags; tag providers come from the
//!   prototype templates.
//! - No instance loaded implies an empty handle cache.
//! - Failed requests have no side effects.
//!
//! # Concurrency
//!
//! State sits behind a per-source mutex that is never held while host code
//! runs (construction, initializers, projections, tag providers). The "not
//! loaded to loaded" transition is owned by one loader thread at a time:
//! other threads wait until the load settles, while the loader's own hooks
//! may call back into the source once the instance is stored. A wait that
//! would close a cycle between loader threads fails with
//! [`NotLoadable::WaitCycle`] instead of blocking. A panicking hook leaves the
//! source unloaded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, RwLock};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::capability::Capability;
use crate::construct::{Construct, ConstructContext, ConstructError, Share, Spawn};
use crate::loadability::{Loadability, NotLoadable};
use crate::matcher::{self, TagMatch};
use crate::prototype::{AnyArc, Instance, Prototype, ServiceHandle};
use crate::resolver::{CapabilityTypes, resolve_capabilities};
use crate::session::{Epoch, Session};
use crate::tag::Tag;

/// Category of a source, selecting its default construction strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceKind {
	/// Spawns fresh objects from a prototype template, placed under the
	/// owning set.
	#[default]
	Prototype,
	/// Uses the template objects themselves.
	Asset,
	/// Spawns a whole scene under the owning set.
	Scene,
}

impl SourceKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Prototype => "prototype",
			Self::Asset => "asset",
			Self::Scene => "scene",
		}
	}

	/// Returns true if construction receives the owning set as parent.
	pub const fn needs_parent(self) -> bool {
		matches!(self, Self::Prototype | Self::Scene)
	}

	/// Strategy used when the host does not inject one.
	pub fn default_constructor(self) -> Arc<dyn Construct> {
		match self {
			Self::Prototype | Self::Scene => Arc::new(Spawn),
			Self::Asset => Arc::new(Share),
		}
	}
}

impl std::fmt::Display for SourceKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Plain description of a source.
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
	pub name: String,
	pub kind: SourceKind,
	pub prototype: Option<Arc<Prototype>>,
	pub tags: Vec<Tag>,
}

impl SourceConfig {
	pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
		Self {
			name: name.into(),
			kind,
			..Self::default()
		}
	}

	pub fn with_prototype(mut self, prototype: impl Into<Arc<Prototype>>) -> Self {
		self.prototype = Some(prototype.into());
		self
	}

	/// Attaches a static tag. Duplicates are ignored.
	pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
		let tag = tag.into();
		if !self.tags.contains(&tag) {
			self.tags.push(tag);
		}
		self
	}
}

/// Successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
	pub service: ServiceHandle,
	/// True if this request instantiated the source.
	pub new_instance: bool,
}

/// Why a source did not answer a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unresolved {
	#[error(transparent)]
	NotLoadable(#[from] NotLoadable),
	/// The tag condition was not satisfied. `missing` is the first requested
	/// tag that was not found, or `None` if the provider exposes no tags.
	#[error("tag condition not satisfied")]
	Filtered { missing: Option<Tag> },
	#[error("capability `{0}` is not provided")]
	NotProvided(&'static str),
}

/// Snapshot of a source for reports.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStatus {
	pub name: String,
	pub kind: SourceKind,
	pub loadability: Loadability,
	pub loaded: bool,
	pub epoch: Epoch,
	pub capabilities: Vec<Capability>,
	pub tags: Vec<Tag>,
}

struct Loaded {
	epoch: Epoch,
	instance: Instance,
	handles: FxHashMap<Capability, ServiceHandle>,
}

#[derive(Default)]
struct SourceState {
	/// Discovered types, stamped with the type epoch they belong to.
	types: Option<(Epoch, Arc<CapabilityTypes>)>,
	type_epoch: Epoch,
	instance_epoch: Epoch,
	loaded: Option<Loaded>,
	/// Thread running construction or initializers.
	loader: Option<ThreadId>,
}

/// What a loaded source holds for one capability.
enum Entry {
	Cached(ServiceHandle),
	Object { epoch: Epoch, object: AnyArc },
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A source backed by one prototype, instantiated on first resolution.
pub struct DynamicSource {
	id: u64,
	name: String,
	kind: SourceKind,
	prototype: Option<Arc<Prototype>>,
	tags: RwLock<Vec<Tag>>,
	parent: Option<String>,
	constructor: Arc<dyn Construct>,
	session: Session,
	state: Mutex<SourceState>,
	settled: Condvar,
}

impl DynamicSource {
	/// Creates a source using its kind's default construction strategy.
	pub fn new(config: SourceConfig) -> Self {
		Self {
			id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
			constructor: config.kind.default_constructor(),
			name: config.name,
			kind: config.kind,
			prototype: config.prototype,
			tags: RwLock::new(config.tags),
			parent: None,
			session: Session::default(),
			state: Mutex::new(SourceState::default()),
			settled: Condvar::new(),
		}
	}

	/// Shares `session` with this source.
	pub fn with_session(mut self, session: Session) -> Self {
		self.session = session;
		self
	}

	/// Replaces the construction strategy.
	pub fn with_constructor(mut self, constructor: impl Construct + 'static) -> Self {
		self.constructor = Arc::new(constructor);
		self
	}

	/// Sets the parent handed to strategies of kinds that need one.
	pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
		self.parent = Some(parent.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> SourceKind {
		self.kind
	}

	pub fn prototype(&self) -> Option<&Arc<Prototype>> {
		self.prototype.as_ref()
	}

	pub fn loadability(&self) -> Loadability {
		match self.loadable_prototype() {
			Ok(_) => Loadability::Loadable,
			Err(reason) => Loadability::NotLoadable(reason),
		}
	}

	fn loadable_prototype(&self) -> Result<&Arc<Prototype>, NotLoadable> {
		let prototype = self.prototype.as_ref().ok_or(NotLoadable::MissingPrototype)?;
		if prototype.components().is_empty() {
			return Err(NotLoadable::NoComponents(prototype.name().to_owned()));
		}
		Ok(prototype)
	}

	/// Discovered capability data, computed once per type epoch.
	///
	/// A source without a prototype has no types.
	pub fn capability_types(&self) -> Arc<CapabilityTypes> {
		let type_epoch = {
			let state = self.state.lock();
			if let Some((epoch, types)) = &state.types
				&& *epoch == state.type_epoch
			{
				return Arc::clone(types);
			}
			state.type_epoch
		};

		let types = Arc::new(
			self.prototype
				.as_deref()
				.map(resolve_capabilities)
				.unwrap_or_default(),
		);

		let mut state = self.state.lock();
		if state.type_epoch != type_epoch {
			return types;
		}
		if let Some((epoch, cached)) = &state.types
			&& *epoch == type_epoch
		{
			return Arc::clone(cached);
		}
		tracing::debug!(
			source = %self.name,
			epoch = %type_epoch,
			capabilities = types.capabilities().len(),
			"Discovered source capabilities"
		);
		state.types = Some((type_epoch, Arc::clone(&types)));
		types
	}

	/// Concrete types backing this source.
	pub fn concrete_types(&self) -> Vec<Capability> {
		self.capability_types().concrete().to_vec()
	}

	/// Capabilities this source can be asked for.
	pub fn capabilities(&self) -> Vec<Capability> {
		self.capability_types().capabilities().to_vec()
	}

	/// Types listed for discovery.
	pub fn discovery_types(&self) -> Vec<Capability> {
		self.capability_types().discovery().to_vec()
	}

	pub fn provides(&self, capability: Capability) -> bool {
		self.capability_types().provides(capability)
	}

	/// Tags currently exposed by every tag provider of the prototype,
	/// deduplicated in provider order.
	pub fn dynamic_tags(&self) -> Vec<Tag> {
		let types = self.capability_types();
		let mut tags = Vec::new();
		for tag in types.tag_providers().flat_map(|provider| provider.tags()) {
			if !tags.contains(&tag) {
				tags.push(tag);
			}
		}
		tags
	}

	/// Tags attached to the source itself.
	pub fn static_tags(&self) -> Vec<Tag> {
		self.tags.read().clone()
	}

	/// Attaches a static tag. Returns false if it was already present.
	pub fn add_tag(&self, tag: impl Into<Tag>) -> bool {
		let tag = tag.into();
		let mut tags = self.tags.write();
		if tags.contains(&tag) {
			return false;
		}
		tags.push(tag);
		true
	}

	/// Detaches a static tag. Returns false if it was not present.
	pub fn remove_tag(&self, tag: &Tag) -> bool {
		let mut tags = self.tags.write();
		let before = tags.len();
		tags.retain(|t| t != tag);
		tags.len() != before
	}

	/// Resolves `capability` if this source provides it and satisfies every
	/// tag in `tags`.
	///
	/// Instantiates the prototype on the first successful request of the
	/// current instance epoch and caches one handle per capability.
	pub fn try_resolve(&self, capability: Capability, tags: &[Tag]) -> Result<Resolved, Unresolved> {
		let prototype = self.loadable_prototype()?;
		let types = self.capability_types();

		let Some(component) = types.provider_of(capability) else {
			return Err(Unresolved::NotProvided(capability.name()));
		};

		let static_tags = self.static_tags();
		match matcher::evaluate(tags, types.tag_provider_of(capability), &static_tags) {
			TagMatch::Unfiltered | TagMatch::Satisfied => {}
			TagMatch::Untagged => {
				tracing::debug!(source = %self.name, %capability, "Request filtered: source exposes no tags");
				return Err(Unresolved::Filtered { missing: None });
			}
			TagMatch::Missing(tag) => {
				tracing::debug!(source = %self.name, %capability, %tag, "Request filtered: tag missing");
				return Err(Unresolved::Filtered {
					missing: Some(tag.clone()),
				});
			}
		}

		let (new_instance, entry) = self.acquire(prototype, capability, component)?;
		let (epoch, object) = match entry {
			Entry::Cached(service) => {
				return Ok(Resolved {
					service,
					new_instance,
				});
			}
			Entry::Object { epoch, object } => (epoch, object),
		};

		let service = prototype.components()[component]
			.project(&object, capability)
			.ok_or(NotLoadable::InvalidInstance(capability.name()))?;

		let mut state = self.state.lock();
		let loaded = state
			.loaded
			.as_mut()
			.filter(|loaded| loaded.epoch == epoch)
			.ok_or(NotLoadable::Cleared)?;
		let service = loaded.handles.entry(capability).or_insert(service).clone();
		Ok(Resolved {
			service,
			new_instance,
		})
	}

	/// Returns the cached handle or the backing object for `capability`,
	/// loading the instance first if needed. The flag is true if this call
	/// created the instance.
	fn acquire(
		&self,
		prototype: &Prototype,
		capability: Capability,
		component: usize,
	) -> Result<(bool, Entry), NotLoadable> {
		let current = thread::current().id();
		let mut new_instance = false;
		loop {
			let mut state = self.state.lock();
			let loader = state.loader;
			match loader {
				Some(loader) if loader != current => {
					if !gate::enter(self.id, loader) {
						tracing::warn!(source = %self.name, %capability, "Refused to wait on a loader that waits on this thread");
						return Err(NotLoadable::WaitCycle(self.name.clone()));
					}
					self.settled.wait(&mut state);
					gate::leave();
					continue;
				}
				Some(_) if state.loaded.is_none() => {
					return Err(NotLoadable::ConstructionFailed(
						"source was requested while it was being constructed".into(),
					));
				}
				_ => {}
			}

			if let Some(loaded) = &state.loaded {
				if let Some(service) = loaded.handles.get(&capability) {
					return Ok((new_instance, Entry::Cached(service.clone())));
				}
				let object = loaded
					.instance
					.object(component)
					.cloned()
					.ok_or(NotLoadable::InvalidInstance(capability.name()))?;
				return Ok((
					new_instance,
					Entry::Object {
						epoch: loaded.epoch,
						object,
					},
				));
			}

			state.loader = Some(current);
			let epoch = state.instance_epoch;
			drop(state);
			self.instantiate(prototype, epoch)?;
			new_instance = true;
		}
	}

	/// Constructs and initializes an instance for `epoch`. The caller must
	/// have claimed the loader slot.
	fn instantiate(&self, prototype: &Prototype, epoch: Epoch) -> Result<(), NotLoadable> {
		let mut load = LoadGuard {
			source: self,
			epoch,
			committed: false,
		};

		let cx = ConstructContext {
			source: &self.name,
			parent: self.parent.as_deref().filter(|_| self.kind.needs_parent()),
			epoch,
		};
		let instance = self.constructor.construct(prototype, &cx).and_then(|instance| {
			let expected = prototype.components().len();
			if instance.len() == expected {
				Ok(instance)
			} else {
				Err(ConstructError::ComponentCount {
					expected,
					actual: instance.len(),
				})
			}
		});
		let instance = match instance {
			Ok(instance) => instance,
			Err(error) => {
				tracing::warn!(source = %self.name, kind = %self.kind, error = %error, "Source construction failed");
				return Err(NotLoadable::ConstructionFailed(error.to_string()));
			}
		};

		let initializers: Vec<_> = prototype
			.components()
			.iter()
			.zip(instance.objects())
			.filter_map(|(component, object)| component.initializer(object))
			.collect();

		tracing::info!(source = %self.name, kind = %self.kind, epoch = %epoch, "Instantiated source");
		self.state.lock().loaded = Some(Loaded {
			epoch,
			instance,
			handles: FxHashMap::default(),
		});

		for initializer in initializers {
			initializer.initialize();
		}
		load.committed = true;
		Ok(())
	}

	/// Resolves every capability of the source. Returns true if this call
	/// instantiated it.
	pub fn load(&self) -> Result<bool, Unresolved> {
		let mut new_instance = false;
		for capability in self.capabilities() {
			new_instance |= self.try_resolve(capability, &[])?.new_instance;
		}
		Ok(new_instance)
	}

	/// Drops the instance and every cached handle. Type data is kept.
	///
	/// Clearing an unloaded source does nothing; otherwise the instance epoch
	/// advances.
	pub fn clear_instances(&self) {
		let dropped = {
			let mut state = self.state.lock();
			let dropped = state.loaded.take();
			if dropped.is_some() {
				state.instance_epoch = state.instance_epoch.next();
			}
			dropped
		};
		if let Some(loaded) = dropped {
			tracing::debug!(
				source = %self.name,
				epoch = %loaded.epoch,
				handles = loaded.handles.len(),
				"Cleared source instance"
			);
		}
	}

	/// Forces capability discovery to run again.
	///
	/// Returns false without doing anything in a live session.
	pub fn clear_cached_types(&self) -> bool {
		if self.session.is_live() {
			tracing::debug!(source = %self.name, "Kept cached types in live session");
			return false;
		}
		let dropped = {
			let mut state = self.state.lock();
			state.type_epoch = state.type_epoch.next();
			state.types.take()
		};
		tracing::debug!(source = %self.name, had_types = dropped.is_some(), "Cleared cached types");
		true
	}

	pub fn clear_instances_and_cached_types(&self) {
		self.clear_instances();
		self.clear_cached_types();
	}

	pub fn is_loaded(&self) -> bool {
		self.state.lock().loaded.is_some()
	}

	/// Current instance epoch. Advances on every clear that drops an instance.
	pub fn epoch(&self) -> Epoch {
		self.state.lock().instance_epoch
	}

	pub fn status(&self) -> SourceStatus {
		let capabilities = self.capabilities();
		let (loaded, epoch) = {
			let state = self.state.lock();
			(state.loaded.is_some(), state.instance_epoch)
		};
		SourceStatus {
			name: self.name.clone(),
			kind: self.kind,
			loadability: self.loadability(),
			loaded,
			epoch,
			capabilities,
			tags: self.static_tags(),
		}
	}
}

impl std::fmt::Debug for DynamicSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DynamicSource")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("prototype", &self.prototype.as_ref().map(|p| p.name()))
			.finish_non_exhaustive()
	}
}

/// Releases the loader slot when a load ends, discarding an instance whose
/// initializers did not all complete.
struct LoadGuard<'a> {
	source: &'a DynamicSource,
	epoch: Epoch,
	committed: bool,
}

impl Drop for LoadGuard<'_> {
	fn drop(&mut self) {
		let source = self.source;
		let discarded = {
			let mut state = source.state.lock();
			state.loader = None;
			gate::release(source.id);
			let partial = !self.committed
				&& state
					.loaded
					.as_ref()
					.is_some_and(|loaded| loaded.epoch == self.epoch);
			if partial {
				state.instance_epoch = state.instance_epoch.next();
				state.loaded.take()
			} else {
				None
			}
		};
		source.settled.notify_all();
		if discarded.is_some() {
			tracing::warn!(source = %source.name, epoch = %self.epoch, "Discarded partially initialized instance");
		}
	}
}

mod gate;
