//! Whether a source can produce an instance, and why not.

use thiserror::Error;

/// Result of a loadability query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadability {
	Loadable,
	NotLoadable(NotLoadable),
}

impl Loadability {
	pub fn is_loadable(&self) -> bool {
		matches!(self, Self::Loadable)
	}

	/// Returns the reason if the source is not loadable.
	pub fn reason(&self) -> Option<&NotLoadable> {
		match self {
			Self::Loadable => None,
			Self::NotLoadable(reason) => Some(reason),
		}
	}
}

impl std::fmt::Display for Loadability {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Loadable => f.write_str("loadable"),
			Self::NotLoadable(reason) => write!(f, "not loadable: {reason}"),
		}
	}
}

/// Configuration problems that keep a source from producing an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotLoadable {
	/// The source has no prototype assigned.
	#[error("no prototype assigned")]
	MissingPrototype,
	/// The prototype has nothing to instantiate.
	#[error("prototype `{0}` declares no components")]
	NoComponents(String),
	/// The construction strategy failed.
	#[error("construction failed: {0}")]
	ConstructionFailed(String),
	/// The constructed instance did not match the prototype's declarations.
	#[error("constructed instance cannot provide `{0}`")]
	InvalidInstance(&'static str),
	/// The source is being loaded by a thread that is waiting on the caller.
	#[error("source `{0}` is being loaded by a thread waiting on this one")]
	WaitCycle(String),
	/// The instance was cleared while it was being resolved.
	#[error("instance was cleared during resolution")]
	Cleared,
}
