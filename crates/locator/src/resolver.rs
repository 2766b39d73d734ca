//! Capability discovery for a prototype.
//!
//! # Role
//!
//! Turns a prototype's declared capability tables and type graphs into the
//! lookup data a source needs: which capabilities it offers, which component
//! backs each one, which tag provider applies, and which types are worth
//! listing for discovery.
//!
//! # Invariants
//!
//! - Marker capabilities are never offered and never listed for discovery.
//! - When several components declare the same capability, the first
//!   component in prototype order backs it.
//! - Discovery walks each component's base chain up to, and excluding, the
//!   first terminal type. Interfaces are listed for the concrete type only.
//! - Output order is deterministic for a given prototype.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::capability::{Capability, TypeInfo};
use crate::prototype::{AnyArc, Prototype};
use crate::tag::TagProvider;

/// Discovered capability data for one prototype.
#[derive(Clone, Default)]
pub struct CapabilityTypes {
	concrete: Vec<Capability>,
	capabilities: Vec<Capability>,
	discovery: Vec<Capability>,
	representatives: Vec<AnyArc>,
	tag_providers: Vec<Option<Arc<dyn TagProvider>>>,
	by_capability: FxHashMap<Capability, usize>,
}

impl CapabilityTypes {
	/// Concrete types backing the prototype, one per component.
	pub fn concrete(&self) -> &[Capability] {
		&self.concrete
	}

	/// Capabilities consumers may request, in discovery order.
	pub fn capabilities(&self) -> &[Capability] {
		&self.capabilities
	}

	/// Types listed for discovery: concrete types, their interfaces, and
	/// their non-terminal ancestors.
	pub fn discovery(&self) -> &[Capability] {
		&self.discovery
	}

	pub fn provides(&self, capability: Capability) -> bool {
		self.by_capability.contains_key(&capability)
	}

	/// Index of the component backing `capability`.
	pub fn provider_of(&self, capability: Capability) -> Option<usize> {
		self.by_capability.get(&capability).copied()
	}

	/// Template object of the component backing `capability`.
	pub fn representative_of(&self, capability: Capability) -> Option<&AnyArc> {
		self.representatives.get(self.provider_of(capability)?)
	}

	/// Tag provider of the component backing `capability`, if it has one.
	pub fn tag_provider_of(&self, capability: Capability) -> Option<&dyn TagProvider> {
		self.tag_providers
			.get(self.provider_of(capability)?)?
			.as_deref()
	}

	/// All tag providers, in component order.
	pub fn tag_providers(&self) -> impl Iterator<Item = &dyn TagProvider> {
		self.tag_providers.iter().filter_map(|p| p.as_deref())
	}
}

impl std::fmt::Debug for CapabilityTypes {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CapabilityTypes")
			.field("concrete", &self.concrete)
			.field("capabilities", &self.capabilities)
			.field("discovery", &self.discovery)
			.finish_non_exhaustive()
	}
}

/// Discovers the capability data of `prototype`.
///
/// Tag providers are taken from the component templates, so evaluating tags
/// never requires an instance.
pub fn resolve_capabilities(prototype: &Prototype) -> CapabilityTypes {
	let mut types = CapabilityTypes::default();
	let mut listed = FxHashSet::default();

	for (index, component) in prototype.components().iter().enumerate() {
		let template = component.template();
		types.concrete.push(component.type_info().capability());
		types.tag_providers.push(component.tag_provider(&template));
		types.representatives.push(template);

		for capability in component.capabilities() {
			if capability.is_marker() || types.by_capability.contains_key(&capability) {
				continue;
			}
			types.by_capability.insert(capability, index);
			types.capabilities.push(capability);
		}

		for capability in discovery_chain(component.type_info()) {
			if listed.insert(capability) {
				types.discovery.push(capability);
			}
		}
	}

	types
}

/// Lists `info`, its non-marker interfaces, then each ancestor up to the
/// first terminal type.
fn discovery_chain(info: &TypeInfo) -> Vec<Capability> {
	let mut chain = vec![info.capability()];
	chain.extend(info.interfaces().iter().filter(|i| !i.is_marker()));

	let mut base = info.base();
	while let Some(ancestor) = base
		&& !ancestor.is_terminal()
	{
		chain.push(ancestor.capability());
		base = ancestor.base();
	}
	chain
}
