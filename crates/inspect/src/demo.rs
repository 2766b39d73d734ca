//! Built-in prototypes used when no host catalog is available.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use locus_config::Catalog;
use locus_locator::{
	Component, DynamicTags, Initialize, Prototype, ServiceHandle, Tag, TagProvider, TypeInfo,
};

/// Configuration used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = r#"
session = "design"

[[set]]
name = "core"
priority = 10

[[set.source]]
name = "console"
prototype = "console-logger"

[[set.source]]
name = "store"
prototype = "memory-store"
kind = "asset"

[[set.source]]
name = "audio"
prototype = "audio-rig"
kind = "scene"

[[set]]
name = "fallback"

[[set.source]]
name = "file"
prototype = "file-logger"

[[set.source]]
name = "legacy"
prototype = "retired-logger"
"#;

pub trait Logger: Send + Sync {
	fn format(&self, message: &str) -> String;
}

pub trait Store: Send + Sync {
	fn put(&self, value: u64) -> u64;
	fn is_ready(&self) -> bool;
}

pub trait AudioOutput: Send + Sync {
	fn channel(&self) -> &'static str;
}

/// Framework root shared by demo services; discovery stops here.
pub trait Behaviour {}

/// Intermediate base listed for discovery.
pub trait Service: Behaviour {}

fn service_chain() -> Arc<TypeInfo> {
	let behaviour = Arc::new(TypeInfo::terminal::<dyn Behaviour>());
	Arc::new(TypeInfo::of::<dyn Service>().extends(behaviour))
}

pub struct TaggedLogger {
	prefix: &'static str,
	tags: DynamicTags,
}

impl TaggedLogger {
	fn new(prefix: &'static str) -> Self {
		Self {
			prefix,
			tags: DynamicTags::new([Tag::from(prefix)]),
		}
	}
}

impl Clone for TaggedLogger {
	fn clone(&self) -> Self {
		Self {
			prefix: self.prefix,
			tags: DynamicTags::new(self.tags.tags()),
		}
	}
}

impl Logger for TaggedLogger {
	fn format(&self, message: &str) -> String {
		format!("[{}] {message}", self.prefix)
	}
}

impl TagProvider for TaggedLogger {
	fn tags(&self) -> Vec<Tag> {
		self.tags.tags()
	}
}

#[derive(Default)]
pub struct MemoryStore {
	total: AtomicU64,
	ready: AtomicBool,
}

impl Store for MemoryStore {
	fn put(&self, value: u64) -> u64 {
		self.total.fetch_add(value, Ordering::SeqCst) + value
	}

	fn is_ready(&self) -> bool {
		self.ready.load(Ordering::SeqCst)
	}
}

impl Initialize for MemoryStore {
	fn initialize(&self) {
		self.ready.store(true, Ordering::SeqCst);
		tracing::debug!("Memory store ready");
	}
}

#[derive(Clone)]
pub struct Mixer;

impl AudioOutput for Mixer {
	fn channel(&self) -> &'static str {
		"mix"
	}
}

#[derive(Clone)]
pub struct Speaker;

impl AudioOutput for Speaker {
	fn channel(&self) -> &'static str {
		"speaker"
	}
}

fn logger(name: &str, prefix: &'static str) -> Prototype {
	Prototype::new(name).with(
		Component::cloneable(TaggedLogger::new(prefix))
			.provides::<dyn Logger>(|l| l)
			.tagged(|l| l)
			.extends(service_chain()),
	)
}

/// Catalog of demo prototypes.
///
/// `DEFAULT_CONFIG` also names `retired-logger`, which is deliberately
/// missing.
pub fn catalog() -> Catalog {
	Catalog::new()
		.with(logger("console-logger", "console"))
		.with(logger("file-logger", "file"))
		.with(
			Prototype::new("memory-store").with(
				Component::new(MemoryStore::default())
					.provides::<dyn Store>(|s| s)
					.initialized(|s| s)
					.extends(service_chain()),
			),
		)
		.with(
			Prototype::new("audio-rig")
				.with(Component::cloneable(Mixer).provides::<dyn AudioOutput>(|m| m))
				.with(Component::cloneable(Speaker).provides::<dyn AudioOutput>(|s| s)),
		)
}

/// Exercises a resolved demo service and describes the result.
pub fn describe(service: &ServiceHandle) -> Option<String> {
	if let Some(logger) = service.downcast::<dyn Logger>() {
		return Some(logger.format("hello"));
	}
	if let Some(store) = service.downcast::<dyn Store>() {
		return Some(format!("ready={} total={}", store.is_ready(), store.put(1)));
	}
	service
		.downcast::<dyn AudioOutput>()
		.map(|output| format!("channel {}", output.channel()))
}
