//! Capability identifiers and the declared type graph used for discovery.
//!
//! A [`Capability`] names something a consumer can ask for: usually a trait
//! object type such as `dyn Greeter`, or a concrete provider type. Providers
//! declare their position in a type graph through [`TypeInfo`] so discovery
//! never has to walk types at runtime.

use std::any::{TypeId, type_name};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::prototype::Initialize;
use crate::tag::TagProvider;

/// Identifier of a requestable capability.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// reports and search.
#[derive(Clone, Copy)]
pub struct Capability {
	id: TypeId,
	name: &'static str,
}

impl Capability {
	/// Returns the capability for `C`, which may be unsized (`dyn Trait`).
	pub fn of<C: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<C>(),
			name: type_name::<C>(),
		}
	}

	/// Returns the underlying type id.
	pub fn type_id(&self) -> TypeId {
		self.id
	}

	/// Returns the fully qualified type name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the type name without module paths on the outer type.
	///
	/// `dyn app::audio::Mixer` becomes `dyn Mixer`. Generic arguments keep
	/// their full paths.
	pub fn short_name(&self) -> String {
		let (prefix, path) = match self.name.strip_prefix("dyn ") {
			Some(rest) => ("dyn ", rest),
			None => ("", self.name),
		};
		let head = path.split('<').next().unwrap_or(path);
		let base = head.rsplit("::").next().unwrap_or(head);
		format!("{prefix}{base}{}", &path[head.len()..])
	}

	/// Returns true for framework marker capabilities.
	///
	/// Markers ([`TagProvider`] and [`Initialize`]) describe how the locator
	/// talks to a provider. They are never offered to consumers and never
	/// listed for discovery.
	pub fn is_marker(&self) -> bool {
		self.id == TypeId::of::<dyn TagProvider>() || self.id == TypeId::of::<dyn Initialize>()
	}
}

impl PartialEq for Capability {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for Capability {}

impl Hash for Capability {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl PartialOrd for Capability {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Capability {
	fn cmp(&self, other: &Self) -> Ordering {
		self.name.cmp(other.name).then_with(|| self.id.cmp(&other.id))
	}
}

impl std::fmt::Debug for Capability {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Capability({})", self.name)
	}
}

impl std::fmt::Display for Capability {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name)
	}
}

/// Declared position of a type in its type graph.
///
/// Interfaces are the capabilities the type implements directly. `base` links
/// to the parent type; a terminal type ends the chain and is not itself part
/// of discovery (framework base types).
#[derive(Debug, Clone)]
pub struct TypeInfo {
	capability: Capability,
	interfaces: Vec<Capability>,
	base: Option<Arc<TypeInfo>>,
	terminal: bool,
}

impl TypeInfo {
	/// Describes `T` with no interfaces and no base.
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self::from_capability(Capability::of::<T>())
	}

	/// Describes a terminal framework base type.
	pub fn terminal<T: ?Sized + 'static>() -> Self {
		Self {
			terminal: true,
			..Self::of::<T>()
		}
	}

	/// Describes a type from an already known capability.
	pub fn from_capability(capability: Capability) -> Self {
		Self {
			capability,
			interfaces: Vec::new(),
			base: None,
			terminal: false,
		}
	}

	/// Adds `I` as a directly implemented interface.
	pub fn with_interface<I: ?Sized + 'static>(self) -> Self {
		self.with_interface_capability(Capability::of::<I>())
	}

	/// Adds a directly implemented interface; duplicates are ignored.
	pub fn with_interface_capability(mut self, interface: Capability) -> Self {
		self.push_interface(interface);
		self
	}

	/// Sets the parent type.
	pub fn extends(mut self, base: Arc<TypeInfo>) -> Self {
		self.base = Some(base);
		self
	}

	pub(crate) fn push_interface(&mut self, interface: Capability) {
		if interface != self.capability && !self.interfaces.contains(&interface) {
			self.interfaces.push(interface);
		}
	}

	pub(crate) fn set_base(&mut self, base: Arc<TypeInfo>) {
		self.base = Some(base);
	}

	/// Returns the capability naming this type.
	pub fn capability(&self) -> Capability {
		self.capability
	}

	/// Returns the directly implemented interfaces in declaration order.
	pub fn interfaces(&self) -> &[Capability] {
		&self.interfaces
	}

	/// Returns the parent type, if any.
	pub fn base(&self) -> Option<&TypeInfo> {
		self.base.as_deref()
	}

	/// Returns true if discovery stops at this type.
	pub fn is_terminal(&self) -> bool {
		self.terminal
	}
}
