//! Session mode and cache generations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Generation counter for cached data.
///
/// Every clear that drops cached data advances the generation; data stamped
/// with an older generation is never read again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
	pub const ZERO: Self = Self(0);

	pub const fn get(self) -> u64 {
		self.0
	}

	pub(crate) const fn next(self) -> Self {
		Self(self.0 + 1)
	}
}

impl std::fmt::Display for Epoch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Whether the hosting session is being authored or running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionMode {
	/// Offline: discovered type data may be refreshed.
	#[default]
	Design,
	/// Running: singletons are fixed and type caches are kept.
	Live,
}

impl SessionMode {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Design => "design",
			Self::Live => "live",
		}
	}
}

impl std::fmt::Display for SessionMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Shared session handle. Clones observe the same mode.
#[derive(Debug, Clone, Default)]
pub struct Session {
	live: Arc<AtomicBool>,
}

impl Session {
	pub fn new(mode: SessionMode) -> Self {
		let session = Self::default();
		session.set_mode(mode);
		session
	}

	pub fn mode(&self) -> SessionMode {
		if self.is_live() {
			SessionMode::Live
		} else {
			SessionMode::Design
		}
	}

	pub fn is_live(&self) -> bool {
		self.live.load(Ordering::Acquire)
	}

	pub fn set_mode(&self, mode: SessionMode) {
		self.live.store(mode == SessionMode::Live, Ordering::Release);
	}
}
