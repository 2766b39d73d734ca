//! The locator facade: named source sets searched in priority order.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::capability::Capability;
use crate::prototype::ServiceHandle;
use crate::session::Session;
use crate::source::{DynamicSource, SourceConfig, SourceStatus, Unresolved};
use crate::tag::Tag;

/// Named group of sources sharing a priority.
#[derive(Debug, Clone)]
pub struct SourceSet {
	name: String,
	priority: i32,
	sources: Vec<Arc<DynamicSource>>,
}

impl SourceSet {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn priority(&self) -> i32 {
		self.priority
	}

	pub fn sources(&self) -> &[Arc<DynamicSource>] {
		&self.sources
	}
}

/// A capability located by the facade.
#[derive(Debug, Clone)]
pub struct Located {
	pub service: ServiceHandle,
	pub source: Arc<DynamicSource>,
	pub new_instance: bool,
}

/// Why the facade found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
	#[error("no source provides `{0}`")]
	NotFound(&'static str),
	#[error("no source providing `{0}` satisfies the requested tags")]
	Filtered(&'static str),
}

/// Searches source sets for the first source able to resolve a request.
///
/// Sets are visited by descending priority; equal priorities keep
/// registration order, as do sources within a set.
#[derive(Debug, Default)]
pub struct Locator {
	session: Session,
	sets: RwLock<Vec<SourceSet>>,
}

impl Locator {
	pub fn new(session: Session) -> Self {
		Self {
			session,
			sets: RwLock::default(),
		}
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	/// Registers an empty set. Returns false if the name is taken.
	pub fn add_set(&self, name: impl Into<String>, priority: i32) -> bool {
		let name = name.into();
		let mut sets = self.sets.write();
		if sets.iter().any(|set| set.name == name) {
			return false;
		}
		let at = sets.partition_point(|set| set.priority >= priority);
		sets.insert(
			at,
			SourceSet {
				name,
				priority,
				sources: Vec::new(),
			},
		);
		true
	}

	/// Adds a source to `set`, creating the set at priority 0 if needed.
	///
	/// The source shares the locator's session and receives the set name as
	/// its construction parent.
	pub fn add_source(&self, set: &str, config: SourceConfig) -> Arc<DynamicSource> {
		self.add_set(set, 0);
		let source = Arc::new(
			DynamicSource::new(config)
				.with_session(self.session.clone())
				.with_parent(set),
		);
		self.insert(set, Arc::clone(&source));
		source
	}

	/// Adds an already built source to `set`, creating the set at priority 0
	/// if needed.
	pub fn insert(&self, set: &str, source: Arc<DynamicSource>) {
		self.add_set(set, 0);
		let mut sets = self.sets.write();
		if let Some(set) = sets.iter_mut().find(|s| s.name == set) {
			tracing::debug!(set = %set.name, source = %source.name(), "Registered source");
			set.sources.push(source);
		}
	}

	/// Snapshot of the sets in search order.
	pub fn sets(&self) -> Vec<SourceSet> {
		self.sets.read().clone()
	}

	/// All sources in search order.
	pub fn sources(&self) -> Vec<Arc<DynamicSource>> {
		self.sets
			.read()
			.iter()
			.flat_map(|set| set.sources.iter().cloned())
			.collect()
	}

	/// First source named `name`, in search order.
	pub fn find_source(&self, name: &str) -> Option<Arc<DynamicSource>> {
		self.sources().into_iter().find(|source| source.name() == name)
	}

	/// Resolves `capability` from the first source that provides it and
	/// satisfies `tags`.
	///
	/// Sources that fail for any reason are skipped. Not-loadable sources are
	/// logged.
	pub fn resolve(&self, capability: Capability, tags: &[Tag]) -> Result<Located, LocateError> {
		let mut filtered = false;
		for source in self.sources() {
			match source.try_resolve(capability, tags) {
				Ok(resolved) => {
					if resolved.new_instance {
						tracing::info!(source = %source.name(), %capability, "Located capability from new instance");
					}
					return Ok(Located {
						service: resolved.service,
						source,
						new_instance: resolved.new_instance,
					});
				}
				Err(Unresolved::NotProvided(_)) => {}
				Err(Unresolved::Filtered { .. }) => filtered = true,
				Err(Unresolved::NotLoadable(reason)) => {
					tracing::debug!(source = %source.name(), %capability, %reason, "Skipped source");
				}
			}
		}
		if filtered {
			Err(LocateError::Filtered(capability.name()))
		} else {
			Err(LocateError::NotFound(capability.name()))
		}
	}

	/// Returns the first provider of `C`, without tag filtering.
	pub fn get<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
		self.try_get::<C>(&[]).ok()
	}

	/// Returns the first provider of `C` that satisfies `tags`.
	pub fn try_get<C: ?Sized + Send + Sync + 'static>(&self, tags: &[Tag]) -> Result<Arc<C>, LocateError> {
		let capability = Capability::of::<C>();
		let located = self.resolve(capability, tags)?;
		located
			.service
			.downcast::<C>()
			.ok_or(LocateError::NotFound(capability.name()))
	}

	/// Drops every instance and, outside a live session, every type cache.
	pub fn clear_all(&self) {
		for source in self.sources() {
			source.clear_instances_and_cached_types();
		}
	}

	/// Status of every source in search order.
	pub fn statuses(&self) -> Vec<SourceStatus> {
		self.sources().iter().map(|source| source.status()).collect()
	}
}
