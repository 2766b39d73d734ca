//! End-to-end resolution through the public API.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, OnceLock, Weak, mpsc};
use std::thread;
use std::time::Duration;

use locus_locator::{
	Capability, Component, DynamicSource, DynamicTags, Initialize, LocateError, Locator, Prototype,
	Session, SessionMode, SourceConfig, SourceKind, Tag, TagProvider, Unresolved,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

trait Input: Send + Sync {
	fn device(&self) -> usize;
}

trait Output: Send + Sync {
	fn device(&self) -> usize;
}

struct Console {
	device: usize,
	tags: Arc<DynamicTags>,
	initialized: Arc<AtomicUsize>,
}

impl Input for Console {
	fn device(&self) -> usize {
		self.device
	}
}

impl Output for Console {
	fn device(&self) -> usize {
		self.device
	}
}

impl TagProvider for Console {
	fn tags(&self) -> Vec<Tag> {
		self.tags.tags()
	}
}

impl Initialize for Console {
	fn initialize(&self) {
		self.initialized.fetch_add(1, Ordering::SeqCst);
	}
}

struct Fixture {
	constructed: Arc<AtomicUsize>,
	initialized: Arc<AtomicUsize>,
	tags: Arc<DynamicTags>,
}

impl Fixture {
	fn new() -> Self {
		Self {
			constructed: Arc::default(),
			initialized: Arc::default(),
			tags: Arc::default(),
		}
	}

	fn console(&self, tagged: bool) -> Prototype {
		let constructed = Arc::clone(&self.constructed);
		let component = Component::new(Console {
			device: 0,
			tags: Arc::clone(&self.tags),
			initialized: Arc::clone(&self.initialized),
		})
		.spawn_with(move |template| Console {
			device: constructed.fetch_add(1, Ordering::SeqCst) + 1,
			tags: Arc::clone(&template.tags),
			initialized: Arc::clone(&template.initialized),
		})
		.provides::<dyn Input>(|c| c)
		.provides::<dyn Output>(|c| c)
		.initialized(|c| c);
		let component = if tagged { component.tagged(|c| c) } else { component };
		Prototype::new("console").with(component)
	}

	fn source(&self, tagged: bool) -> DynamicSource {
		DynamicSource::new(
			SourceConfig::new("console", SourceKind::Prototype)
				.with_prototype(self.console(tagged))
				.with_tag("red"),
		)
	}

	fn constructed(&self) -> usize {
		self.constructed.load(Ordering::SeqCst)
	}

	fn initialized(&self) -> usize {
		self.initialized.load(Ordering::SeqCst)
	}
}

fn input() -> Capability {
	Capability::of::<dyn Input>()
}

fn output() -> Capability {
	Capability::of::<dyn Output>()
}

#[test]
fn red_and_blue() {
	let fixture = Fixture::new();
	let source = fixture.source(false);

	let first = source.try_resolve(input(), &[]).unwrap();
	assert!(first.new_instance);
	let second = source.try_resolve(output(), &[]).unwrap();
	assert!(!second.new_instance);
	assert_eq!(
		first.service.downcast::<dyn Input>().unwrap().device(),
		second.service.downcast::<dyn Output>().unwrap().device()
	);

	let blue = [Tag::from("blue")];
	assert_eq!(
		source.try_resolve(input(), &blue).unwrap_err(),
		Unresolved::Filtered { missing: None }
	);

	// The same prototype with a tag capability, once "blue" is attached.
	let source = fixture.source(true);
	assert!(source.try_resolve(input(), &blue).is_err());
	fixture.tags.insert(Tag::from("blue"));
	assert!(source.try_resolve(input(), &blue).unwrap().new_instance);
	assert!(source.try_resolve(input(), &[Tag::from("red"), Tag::from("blue")]).is_ok());
}

#[rstest]
#[case::unfiltered(&[], true)]
#[case::dynamic(&["A"], true)]
#[case::dynamic_and_static(&["A", "C"], true)]
#[case::unknown(&["A", "D"], false)]
fn tag_conjunction(#[case] requested: &[&str], #[case] expected: bool) {
	let fixture = Fixture::new();
	fixture.tags.insert(Tag::from("A"));
	fixture.tags.insert(Tag::from("B"));
	let source = fixture.source(true);
	source.add_tag("C");

	let requested: Vec<Tag> = requested.iter().copied().map(Tag::from).collect();
	assert_eq!(source.try_resolve(input(), &requested).is_ok(), expected);
}

#[test]
fn concurrent_first_resolution_constructs_once() {
	let fixture = Fixture::new();
	let source = fixture.source(true);

	let services: Vec<_> = thread::scope(|scope| {
		let handles: Vec<_> = (0..8)
			.map(|i| {
				let source = &source;
				scope.spawn(move || {
					let capability = if i % 2 == 0 { input() } else { output() };
					source.try_resolve(capability, &[]).map(|r| r.new_instance)
				})
			})
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});

	assert_eq!(services.iter().filter(|r| matches!(r, Ok(true))).count(), 1);
	assert!(services.iter().all(Result::is_ok));
	assert_eq!(fixture.constructed(), 1);
	assert_eq!(fixture.initialized(), 1);
}

trait Gauge: Send + Sync {
	fn is_ready(&self) -> bool;
}

struct Calibrated {
	started: Arc<Barrier>,
	ready: AtomicBool,
}

impl Gauge for Calibrated {
	fn is_ready(&self) -> bool {
		self.ready.load(Ordering::SeqCst)
	}
}

impl Initialize for Calibrated {
	fn initialize(&self) {
		self.started.wait();
		thread::sleep(Duration::from_millis(50));
		self.ready.store(true, Ordering::SeqCst);
	}
}

#[test]
fn late_callers_wait_for_initializers() {
	let started = Arc::new(Barrier::new(2));
	let prototype = Prototype::new("gauge").with(
		Component::new(Calibrated {
			started: Arc::clone(&started),
			ready: AtomicBool::new(false),
		})
		.provides::<dyn Gauge>(|g| g)
		.initialized(|g| g),
	);
	let source = DynamicSource::new(SourceConfig::new("gauge", SourceKind::Asset).with_prototype(prototype));
	let gauge = Capability::of::<dyn Gauge>();

	thread::scope(|scope| {
		let loader = scope.spawn(|| source.try_resolve(gauge, &[]).map(|r| r.new_instance));
		started.wait();
		let late = source.try_resolve(gauge, &[]).unwrap();
		assert!(!late.new_instance);
		assert!(late.service.downcast::<dyn Gauge>().unwrap().is_ready());
		assert_eq!(loader.join().unwrap(), Ok(true));
	});
}

trait Left: Send + Sync {}

trait Right: Send + Sync {}

struct Peer {
	locator: Arc<OnceLock<Weak<Locator>>>,
	barrier: Arc<Barrier>,
	reach: fn(&Locator) -> bool,
	reached: Arc<AtomicUsize>,
}

impl Left for Peer {}

impl Right for Peer {}

impl Initialize for Peer {
	fn initialize(&self) {
		self.barrier.wait();
		if let Some(locator) = self.locator.get().and_then(Weak::upgrade)
			&& (self.reach)(&locator)
		{
			self.reached.fetch_add(1, Ordering::SeqCst);
		}
	}
}

#[test]
fn initializers_resolving_each_other_across_threads_settle() {
	let slot = Arc::new(OnceLock::new());
	let barrier = Arc::new(Barrier::new(2));
	let reached = Arc::new(AtomicUsize::new(0));
	let peer = |reach: fn(&Locator) -> bool| Peer {
		locator: Arc::clone(&slot),
		barrier: Arc::clone(&barrier),
		reach,
		reached: Arc::clone(&reached),
	};

	let locator = Arc::new(Locator::default());
	locator.add_source(
		"peers",
		SourceConfig::new("left", SourceKind::Asset).with_prototype(
			Prototype::new("left").with(
				Component::new(peer(|locator| locator.get::<dyn Right>().is_some()))
					.provides::<dyn Left>(|p| p)
					.initialized(|p| p),
			),
		),
	);
	locator.add_source(
		"peers",
		SourceConfig::new("right", SourceKind::Asset).with_prototype(
			Prototype::new("right").with(
				Component::new(peer(|locator| locator.get::<dyn Left>().is_some()))
					.provides::<dyn Right>(|p| p)
					.initialized(|p| p),
			),
		),
	);
	slot.set(Arc::downgrade(&locator)).unwrap();

	let (done, finished) = mpsc::channel();
	for left in [true, false] {
		let locator = Arc::clone(&locator);
		let done = done.clone();
		thread::spawn(move || {
			let found = if left {
				locator.get::<dyn Left>().is_some()
			} else {
				locator.get::<dyn Right>().is_some()
			};
			let _ = done.send(found);
		});
	}

	for _ in 0..2 {
		let found = finished
			.recv_timeout(Duration::from_secs(10))
			.expect("both loads settle");
		assert!(found);
	}
	assert_eq!(
		reached.load(Ordering::SeqCst),
		1,
		"the second waiter is refused instead of closing the cycle"
	);
}

#[test]
fn locator_clear_forces_new_instances() {
	let fixture = Fixture::new();
	let locator = Locator::new(Session::new(SessionMode::Live));
	locator.add_source(
		"io",
		SourceConfig::new("console", SourceKind::Prototype).with_prototype(fixture.console(false)),
	);

	assert_eq!(locator.get::<dyn Input>().unwrap().device(), 1);
	assert_eq!(locator.get::<dyn Output>().unwrap().device(), 1);
	locator.clear_all();
	assert_eq!(locator.get::<dyn Output>().unwrap().device(), 2);
	assert!(matches!(
		locator.try_get::<dyn Input>(&[Tag::from("red")]),
		Err(LocateError::Filtered(_))
	));
}

proptest! {
	#[test]
	fn any_request_sequence_instantiates_once(requests in prop::collection::vec(any::<bool>(), 1..40)) {
		let fixture = Fixture::new();
		let source = fixture.source(true);

		let mut handles = Vec::new();
		for (n, wants_input) in requests.iter().enumerate() {
			let capability = if *wants_input { input() } else { output() };
			let resolved = source.try_resolve(capability, &[]).unwrap();
			prop_assert_eq!(resolved.new_instance, n == 0);
			handles.push((capability, resolved.service));
		}

		prop_assert_eq!(fixture.constructed(), 1);
		prop_assert_eq!(fixture.initialized(), 1);
		for (capability, handle) in &handles {
			let again = source.try_resolve(*capability, &[]).unwrap().service;
			prop_assert!(again.ptr_eq(handle));
		}
	}

	#[test]
	fn clears_between_requests_bump_the_epoch(clears in 0usize..6) {
		let fixture = Fixture::new();
		let source = fixture.source(false);

		for _ in 0..clears {
			source.try_resolve(input(), &[]).unwrap();
			source.clear_instances();
			source.clear_instances();
		}
		prop_assert_eq!(source.epoch().get(), clears as u64);
		prop_assert_eq!(fixture.constructed(), clears);
		prop_assert_eq!(source.capabilities(), source.capabilities());
	}
}
