//! Plain-text rendering of source state.

use std::fmt::Write as _;

use locus_locator::{Capability, Locator, SourceStatus, Tag, matches_type_search, search_words};

/// Renders one block per source, keeping sources whose discovery types match
/// `query`.
pub fn render(locator: &Locator, query: &str) -> String {
	let words = search_words(query);
	let mut out = String::new();

	for set in locator.sets() {
		let sources: Vec<_> = set
			.sources()
			.iter()
			.filter(|source| matches_type_search(&words, &source.discovery_types()))
			.collect();
		if sources.is_empty() {
			continue;
		}

		let _ = writeln!(out, "{} (priority {})", set.name(), set.priority());
		for source in sources {
			let status = source.status();
			let dynamic = source.dynamic_tags();
			render_status(&mut out, &status, &dynamic);
		}
	}

	if out.is_empty() {
		out.push_str("no matching sources\n");
	}
	out
}

fn render_status(out: &mut String, status: &SourceStatus, dynamic: &[Tag]) {
	let state = if status.loaded { "loaded" } else { "unloaded" };
	let reason = status.loadability.reason();
	let _ = writeln!(
		out,
		"  {} [{}] {} epoch={} {}",
		status.name,
		status.kind,
		state,
		status.epoch,
		if reason.is_some() { "not loadable" } else { "loadable" }
	);
	if let Some(reason) = reason {
		let _ = writeln!(out, "    reason: {reason}");
	}
	if !status.capabilities.is_empty() {
		let _ = writeln!(out, "    provides: {}", names(&status.capabilities));
	}
	if !status.tags.is_empty() {
		let _ = writeln!(out, "    tags: {}", join(&status.tags));
	}
	if !dynamic.is_empty() {
		let _ = writeln!(out, "    dynamic tags: {}", join(dynamic));
	}
}

fn names(capabilities: &[Capability]) -> String {
	capabilities
		.iter()
		.map(Capability::short_name)
		.collect::<Vec<_>>()
		.join(", ")
}

fn join(tags: &[Tag]) -> String {
	tags.iter().map(Tag::to_string).collect::<Vec<_>>().join(", ")
}
