//! Named prototypes that configuration can refer to.

use std::sync::Arc;

use locus_locator::Prototype;
use rustc_hash::FxHashMap;

/// Prototypes known to the host, keyed by prototype name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	prototypes: FxHashMap<String, Arc<Prototype>>,
}

impl Catalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `prototype` under its own name, replacing any previous entry.
	pub fn insert(&mut self, prototype: impl Into<Arc<Prototype>>) {
		let prototype = prototype.into();
		self.prototypes.insert(prototype.name().to_owned(), prototype);
	}

	pub fn with(mut self, prototype: impl Into<Arc<Prototype>>) -> Self {
		self.insert(prototype);
		self
	}

	pub fn get(&self, name: &str) -> Option<&Arc<Prototype>> {
		self.prototypes.get(name)
	}

	/// Prototype names, sorted.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<_> = self.prototypes.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	pub fn len(&self) -> usize {
		self.prototypes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.prototypes.is_empty()
	}
}

impl FromIterator<Prototype> for Catalog {
	fn from_iter<I: IntoIterator<Item = Prototype>>(iter: I) -> Self {
		let mut catalog = Self::new();
		for prototype in iter {
			catalog.insert(prototype);
		}
		catalog
	}
}
