//! Provider prototypes and the capability table they declare.
//!
//! A [`Prototype`] is a template made of one or more [`Component`]s. Each
//! component owns a template object and an explicit table of the capabilities
//! it provides, with a projection from the concrete object to each capability.
//! Nothing is discovered by reflection: what a component does not declare, it
//! does not provide.

use std::any::Any;
use std::sync::Arc;

use crate::capability::{Capability, TypeInfo};
use crate::tag::TagProvider;

/// Type-erased shared object.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Optional capability of a provider: run once right after construction,
/// before any capability is handed out.
pub trait Initialize: Send + Sync {
	fn initialize(&self);
}

/// Type-erased handle to a resolved capability.
///
/// Clones share the same allocation; [`ServiceHandle::ptr_eq`] tells whether
/// two handles came from the same cache entry.
#[derive(Clone)]
pub struct ServiceHandle {
	capability: Capability,
	value: AnyArc,
}

impl ServiceHandle {
	/// Wraps a capability object.
	pub fn new<C: ?Sized + Send + Sync + 'static>(service: Arc<C>) -> Self {
		Self {
			capability: Capability::of::<C>(),
			value: Arc::new(service),
		}
	}

	/// Returns the capability this handle was resolved for.
	pub fn capability(&self) -> Capability {
		self.capability
	}

	/// Returns the service as `Arc<C>` if this handle holds capability `C`.
	pub fn downcast<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
		self.value.downcast_ref::<Arc<C>>().cloned()
	}

	/// Returns true if both handles share one allocation.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.value, &other.value)
	}
}

impl std::fmt::Debug for ServiceHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ServiceHandle")
			.field("capability", &self.capability)
			.finish_non_exhaustive()
	}
}

type Projection<T> = Arc<dyn Fn(Arc<T>) -> ServiceHandle + Send + Sync>;
type Spawner<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;

/// One concrete type inside a prototype, with its capability table.
///
/// The concrete type itself is always provided.
///
/// ```
/// use std::sync::Arc;
/// use locus_locator::{Component, Prototype};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Clone)]
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let prototype = Prototype::new("greeter")
///     .with(Component::cloneable(English).provides::<dyn Greeter>(|c| c));
/// assert_eq!(prototype.components().len(), 1);
/// ```
pub struct Component<T: Send + Sync + 'static> {
	info: TypeInfo,
	template: Arc<T>,
	spawn: Option<Spawner<T>>,
	bindings: Vec<(Capability, Projection<T>)>,
	tags: Option<Arc<dyn Fn(Arc<T>) -> Arc<dyn TagProvider> + Send + Sync>>,
	init: Option<Arc<dyn Fn(Arc<T>) -> Arc<dyn Initialize> + Send + Sync>>,
}

impl<T: Send + Sync + 'static> Component<T> {
	/// Creates a component whose template cannot be copied.
	///
	/// Such a component can only back sources that share their template.
	/// Use [`Component::spawn_with`] to make it spawnable.
	pub fn new(template: T) -> Self {
		let concrete: Projection<T> = Arc::new(|object: Arc<T>| ServiceHandle::new(object));
		Self {
			info: TypeInfo::of::<T>(),
			template: Arc::new(template),
			spawn: None,
			bindings: vec![(Capability::of::<T>(), concrete)],
			tags: None,
			init: None,
		}
	}

	/// Creates a component that spawns instances by cloning the template.
	pub fn cloneable(template: T) -> Self
	where
		T: Clone,
	{
		Self::new(template).spawn_with(T::clone)
	}

	/// Sets how a fresh object is made from the template.
	pub fn spawn_with(mut self, spawn: impl Fn(&T) -> T + Send + Sync + 'static) -> Self {
		self.spawn = Some(Arc::new(spawn));
		self
	}

	/// Declares that this component provides `C` through `project`.
	///
	/// A later declaration for the same capability is ignored.
	pub fn provides<C>(mut self, project: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static) -> Self
	where
		C: ?Sized + Send + Sync + 'static,
	{
		let capability = Capability::of::<C>();
		if self.bindings.iter().any(|(c, _)| *c == capability) {
			return self;
		}
		self.info.push_interface(capability);
		let projection: Projection<T> =
			Arc::new(move |object: Arc<T>| ServiceHandle::new(project(object)));
		self.bindings.push((capability, projection));
		self
	}

	/// Declares that this component exposes tags through `project`.
	pub fn tagged(
		mut self,
		project: impl Fn(Arc<T>) -> Arc<dyn TagProvider> + Send + Sync + 'static,
	) -> Self {
		self.info.push_interface(Capability::of::<dyn TagProvider>());
		self.tags = Some(Arc::new(project));
		self
	}

	/// Declares that instances of this component must be initialized.
	pub fn initialized(
		mut self,
		project: impl Fn(Arc<T>) -> Arc<dyn Initialize> + Send + Sync + 'static,
	) -> Self {
		self.info.push_interface(Capability::of::<dyn Initialize>());
		self.init = Some(Arc::new(project));
		self
	}

	/// Declares the parent type, used for discovery only.
	pub fn extends(mut self, base: Arc<TypeInfo>) -> Self {
		self.info.set_base(base);
		self
	}

	fn downcast(object: &AnyArc) -> Option<Arc<T>> {
		Arc::clone(object).downcast::<T>().ok()
	}
}

/// Type-erased view of a [`Component`], as seen by sources and construction
/// strategies.
pub trait ComponentDecl: Send + Sync {
	/// Declared type information for the concrete type.
	fn type_info(&self) -> &TypeInfo;

	/// Capabilities in declaration order, concrete type first.
	fn capabilities(&self) -> Vec<Capability>;

	/// The template object.
	fn template(&self) -> AnyArc;

	/// A fresh object made from the template, if the component can spawn.
	fn spawn(&self) -> Option<AnyArc>;

	/// Projects `object` to `capability`. `None` if the object is not of this
	/// component's type or the capability is not declared.
	fn project(&self, object: &AnyArc, capability: Capability) -> Option<ServiceHandle>;

	/// Tag capability of `object`, if declared.
	fn tag_provider(&self, object: &AnyArc) -> Option<Arc<dyn TagProvider>>;

	/// Initialization capability of `object`, if declared.
	fn initializer(&self, object: &AnyArc) -> Option<Arc<dyn Initialize>>;
}

impl<T: Send + Sync + 'static> ComponentDecl for Component<T> {
	fn type_info(&self) -> &TypeInfo {
		&self.info
	}

	fn capabilities(&self) -> Vec<Capability> {
		self.bindings.iter().map(|(c, _)| *c).collect()
	}

	fn template(&self) -> AnyArc {
		self.template.clone()
	}

	fn spawn(&self) -> Option<AnyArc> {
		let spawn = self.spawn.as_ref()?;
		let object: AnyArc = Arc::new(spawn(self.template.as_ref()));
		Some(object)
	}

	fn project(&self, object: &AnyArc, capability: Capability) -> Option<ServiceHandle> {
		let (_, project) = self.bindings.iter().find(|(c, _)| *c == capability)?;
		Some(project(Self::downcast(object)?))
	}

	fn tag_provider(&self, object: &AnyArc) -> Option<Arc<dyn TagProvider>> {
		let project = self.tags.as_ref()?;
		Some(project(Self::downcast(object)?))
	}

	fn initializer(&self, object: &AnyArc) -> Option<Arc<dyn Initialize>> {
		let project = self.init.as_ref()?;
		Some(project(Self::downcast(object)?))
	}
}

/// A named provider template: the components that make up one provider.
#[derive(Clone)]
pub struct Prototype {
	name: String,
	components: Vec<Arc<dyn ComponentDecl>>,
}

impl Prototype {
	/// Creates an empty prototype.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			components: Vec::new(),
		}
	}

	/// Appends a component. Order matters: on a shared capability the
	/// earlier component wins.
	pub fn with<T: Send + Sync + 'static>(self, component: Component<T>) -> Self {
		self.with_decl(Arc::new(component))
	}

	/// Appends an already erased component.
	pub fn with_decl(mut self, component: Arc<dyn ComponentDecl>) -> Self {
		self.components.push(component);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn components(&self) -> &[Arc<dyn ComponentDecl>] {
		&self.components
	}
}

impl std::fmt::Debug for Prototype {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Prototype")
			.field("name", &self.name)
			.field(
				"components",
				&self
					.components
					.iter()
					.map(|c| c.type_info().capability())
					.collect::<Vec<_>>(),
			)
			.finish()
	}
}

/// A constructed provider: one live object per prototype component, in
/// component order.
#[derive(Clone)]
pub struct Instance {
	objects: Vec<AnyArc>,
}

impl Instance {
	pub fn new(objects: Vec<AnyArc>) -> Self {
		Self { objects }
	}

	pub fn objects(&self) -> &[AnyArc] {
		&self.objects
	}

	pub fn object(&self, component: usize) -> Option<&AnyArc> {
		self.objects.get(component)
	}

	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}
}

impl std::fmt::Debug for Instance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Instance")
			.field("objects", &self.objects.len())
			.finish()
	}
}
