//! Wait-for records for threads blocked on another thread's source load.
//!
//! A thread that finds a source being loaded elsewhere waits for the load to
//! settle. The wait is refused when the loading thread is itself waiting,
//! directly or through other loads, on the caller.

use std::thread::{self, ThreadId};

use parking_lot::Mutex;

struct Wait {
	waiter: ThreadId,
	source: u64,
	owner: ThreadId,
}

static WAITS: Mutex<Vec<Wait>> = Mutex::new(Vec::new());

/// Records that the current thread waits on `owner`'s load of `source`.
///
/// Returns false without recording anything if the wait would close a cycle.
pub(super) fn enter(source: u64, owner: ThreadId) -> bool {
	let waiter = thread::current().id();
	let mut waits = WAITS.lock();
	let mut next = owner;
	for _ in 0..=waits.len() {
		if next == waiter {
			return false;
		}
		match waits.iter().find(|wait| wait.waiter == next) {
			Some(wait) => next = wait.owner,
			None => break,
		}
	}
	waits.retain(|wait| wait.waiter != waiter);
	waits.push(Wait { waiter, source, owner });
	true
}

/// Drops the current thread's record.
pub(super) fn leave() {
	let waiter = thread::current().id();
	WAITS.lock().retain(|wait| wait.waiter != waiter);
}

/// Drops every record waiting on `source`. Called with the source state
/// locked, when its load ends.
pub(super) fn release(source: u64) {
	WAITS.lock().retain(|wait| wait.source != source);
}
