//! Construction strategies: how a source turns its prototype into an instance.
//!
//! The locator never builds objects itself. Each source holds a [`Construct`]
//! strategy, chosen by its [`crate::SourceKind`] unless the host injects one.

use thiserror::Error;

use crate::prototype::{Instance, Prototype};
use crate::session::Epoch;

/// Context handed to a construction strategy.
#[derive(Debug, Clone, Copy)]
pub struct ConstructContext<'a> {
	/// Name of the source being loaded.
	pub source: &'a str,
	/// Name of the set that owns the source, for kinds that are placed under
	/// a parent.
	pub parent: Option<&'a str>,
	/// Instance epoch the new instance will belong to.
	pub epoch: Epoch,
}

/// Errors a construction strategy may report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
	/// A component has no way to make a fresh object.
	#[error("component `{component}` cannot be spawned")]
	NotSpawnable { component: &'static str },
	/// The strategy produced the wrong number of objects.
	#[error("expected {expected} objects, constructed {actual}")]
	ComponentCount { expected: usize, actual: usize },
	/// Host-specific failure.
	#[error("{0}")]
	Failed(String),
}

/// Builds an [`Instance`] from a [`Prototype`].
///
/// Called at most once per source and instance epoch.
pub trait Construct: Send + Sync {
	fn construct(
		&self,
		prototype: &Prototype,
		cx: &ConstructContext<'_>,
	) -> Result<Instance, ConstructError>;
}

impl<F> Construct for F
where
	F: Fn(&Prototype, &ConstructContext<'_>) -> Result<Instance, ConstructError> + Send + Sync,
{
	fn construct(
		&self,
		prototype: &Prototype,
		cx: &ConstructContext<'_>,
	) -> Result<Instance, ConstructError> {
		self(prototype, cx)
	}
}

/// Makes a fresh object per component from its template.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spawn;

impl Construct for Spawn {
	fn construct(
		&self,
		prototype: &Prototype,
		_cx: &ConstructContext<'_>,
	) -> Result<Instance, ConstructError> {
		let objects = prototype
			.components()
			.iter()
			.map(|component| {
				component.spawn().ok_or_else(|| ConstructError::NotSpawnable {
					component: component.type_info().capability().name(),
				})
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Instance::new(objects))
	}
}

/// Uses the template objects themselves as the instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Share;

impl Construct for Share {
	fn construct(
		&self,
		prototype: &Prototype,
		_cx: &ConstructContext<'_>,
	) -> Result<Instance, ConstructError> {
		Ok(Instance::new(
			prototype.components().iter().map(|c| c.template()).collect(),
		))
	}
}
