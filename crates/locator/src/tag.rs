//! Tag values used to filter which sources may answer a request.
//!
//! Tags carry no ordering, only equality. Each variant defines its own
//! equality: text and tokens compare by string, numbers and structured tags
//! compare by value, object tags compare by identity.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;

/// A condition value attached to a source or exposed by a provider.
#[derive(Debug, Clone)]
pub enum Tag {
	/// Free text.
	Text(Arc<str>),
	/// Integer value.
	Int(i64),
	/// Floating point value. `-0.0` equals `0.0` and all NaNs are equal.
	Float(f64),
	/// Boolean value.
	Bool(bool),
	/// Named token. Never equal to a [`Tag::Text`] with the same string.
	Token(Arc<str>),
	/// Ordered composite of tags, compared element-wise.
	Structured(Arc<[Tag]>),
	/// Reference to an external object, compared by identity.
	Object(ObjectRef),
}

impl Tag {
	/// Creates a named token tag.
	pub fn token(name: impl Into<Arc<str>>) -> Self {
		Self::Token(name.into())
	}

	/// Creates a structured tag from its parts.
	pub fn structured(parts: impl IntoIterator<Item = Tag>) -> Self {
		Self::Structured(parts.into_iter().collect())
	}

	/// Creates an object tag referring to `object`.
	pub fn object<T: Any + Send + Sync>(object: Arc<T>) -> Self {
		Self::Object(ObjectRef::new(object))
	}

	/// Returns the variant name, used in reports.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Text(_) => "text",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::Bool(_) => "bool",
			Self::Token(_) => "token",
			Self::Structured(_) => "structured",
			Self::Object(_) => "object",
		}
	}
}

/// Canonical bit pattern so that equality and hashing agree.
fn float_key(value: f64) -> u64 {
	if value == 0.0 {
		0
	} else if value.is_nan() {
		f64::NAN.to_bits()
	} else {
		value.to_bits()
	}
}

impl PartialEq for Tag {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Text(a), Self::Text(b)) | (Self::Token(a), Self::Token(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => float_key(*a) == float_key(*b),
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Structured(a), Self::Structured(b)) => a == b,
			(Self::Object(a), Self::Object(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Tag {}

impl Hash for Tag {
	fn hash<H: Hasher>(&self, state: &mut H) {
		std::mem::discriminant(self).hash(state);
		match self {
			Self::Text(s) | Self::Token(s) => s.hash(state),
			Self::Int(v) => v.hash(state),
			Self::Float(v) => float_key(*v).hash(state),
			Self::Bool(v) => v.hash(state),
			Self::Structured(parts) => parts.hash(state),
			Self::Object(object) => object.hash(state),
		}
	}
}

impl std::fmt::Display for Tag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Text(s) => f.write_str(s),
			Self::Int(v) => write!(f, "{v}"),
			Self::Float(v) => write!(f, "{v}"),
			Self::Bool(v) => write!(f, "{v}"),
			Self::Token(name) => write!(f, "#{name}"),
			Self::Structured(parts) => {
				f.write_str("(")?;
				for (i, part) in parts.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{part}")?;
				}
				f.write_str(")")
			}
			Self::Object(object) => write!(f, "{object:?}"),
		}
	}
}

impl From<&str> for Tag {
	fn from(value: &str) -> Self {
		Self::Text(value.into())
	}
}

impl From<String> for Tag {
	fn from(value: String) -> Self {
		Self::Text(value.into())
	}
}

impl From<i64> for Tag {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for Tag {
	fn from(value: i32) -> Self {
		Self::Int(value.into())
	}
}

impl From<f64> for Tag {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<bool> for Tag {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

/// Identity handle to an arbitrary shared object.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Any + Send + Sync>);

impl ObjectRef {
	/// Wraps `object`; equality follows the allocation, not the value.
	pub fn new<T: Any + Send + Sync>(object: Arc<T>) -> Self {
		Self(object)
	}

	fn addr(&self) -> *const () {
		Arc::as_ptr(&self.0) as *const ()
	}
}

impl PartialEq for ObjectRef {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(self.addr(), other.addr())
	}
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
	fn hash<H: Hasher>(&self, state: &mut H) {
		(self.addr() as usize).hash(state);
	}
}

impl std::fmt::Debug for ObjectRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "<object {:p}>", self.addr())
	}
}

/// Optional capability of a provider: tags it exposes at match time.
///
/// Tags are read on every tagged request, so a provider may change them at
/// any point.
pub trait TagProvider: Send + Sync {
	/// Returns the provider's current tags.
	fn tags(&self) -> Vec<Tag>;
}

/// Mutable tag set for providers that expose tags.
///
/// Embed it in a provider and forward [`TagProvider::tags`] to it.
#[derive(Debug, Default)]
pub struct DynamicTags {
	tags: RwLock<Vec<Tag>>,
}

impl DynamicTags {
	/// Creates a set holding `tags`, without duplicates.
	pub fn new(tags: impl IntoIterator<Item = Tag>) -> Self {
		let set = Self::default();
		for tag in tags {
			set.insert(tag);
		}
		set
	}

	/// Adds `tag`. Returns false if it was already present.
	pub fn insert(&self, tag: Tag) -> bool {
		let mut tags = self.tags.write();
		if tags.contains(&tag) {
			return false;
		}
		tags.push(tag);
		true
	}

	/// Removes `tag`. Returns false if it was absent.
	pub fn remove(&self, tag: &Tag) -> bool {
		let mut tags = self.tags.write();
		let before = tags.len();
		tags.retain(|t| t != tag);
		tags.len() != before
	}

	pub fn contains(&self, tag: &Tag) -> bool {
		self.tags.read().contains(tag)
	}

	pub fn is_empty(&self) -> bool {
		self.tags.read().is_empty()
	}
}

impl TagProvider for DynamicTags {
	fn tags(&self) -> Vec<Tag> {
		self.tags.read().clone()
	}
}

#[cfg(test)]
mod tests;
