//! Tag condition matching.
//!
//! A request's tags are a conjunction: every requested tag must be found
//! either among the tags the provider exposes when asked, or among the tags
//! statically attached to the source. A provider that cannot expose tags at
//! all never satisfies a tagged request, even if the static tags would.

use crate::tag::{Tag, TagProvider};

/// Outcome of evaluating a tag request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch<'a> {
	/// The request carried no tags.
	Unfiltered,
	/// Every requested tag was found.
	Satisfied,
	/// Tags were requested but the provider exposes no tag capability.
	Untagged,
	/// The first requested tag that was not found.
	Missing(&'a Tag),
}

impl TagMatch<'_> {
	/// Returns true if the source may answer the request.
	pub fn is_match(self) -> bool {
		matches!(self, Self::Unfiltered | Self::Satisfied)
	}
}

/// Evaluates `requested` against a provider's dynamic tags and a source's
/// static tags. Stops at the first unsatisfied tag.
///
/// The provider is asked for its tags once per evaluation.
pub fn evaluate<'a>(
	requested: &'a [Tag],
	provider: Option<&dyn TagProvider>,
	static_tags: &[Tag],
) -> TagMatch<'a> {
	if requested.is_empty() {
		return TagMatch::Unfiltered;
	}
	let Some(provider) = provider else {
		return TagMatch::Untagged;
	};

	let dynamic = provider.tags();
	requested
		.iter()
		.find(|tag| !dynamic.contains(tag) && !static_tags.contains(tag))
		.map_or(TagMatch::Satisfied, TagMatch::Missing)
}

/// Returns true if `requested` is satisfied; see [`evaluate`].
pub fn matches(requested: &[Tag], provider: Option<&dyn TagProvider>, static_tags: &[Tag]) -> bool {
	evaluate(requested, provider, static_tags).is_match()
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use rstest::rstest;

	use super::*;
	use crate::tag::DynamicTags;

	fn ab() -> DynamicTags {
		DynamicTags::new([Tag::from("A"), Tag::from("B")])
	}

	#[rstest]
	#[case(&[], true)]
	#[case(&["A"], true)]
	#[case(&["A", "B"], true)]
	#[case(&["A", "C"], true)]
	#[case(&["C"], true)]
	#[case(&["A", "D"], false)]
	#[case(&["D"], false)]
	fn conjunction_over_dynamic_and_static(#[case] requested: &[&str], #[case] expected: bool) {
		let requested: Vec<Tag> = requested.iter().copied().map(Tag::from).collect();
		let provider = ab();
		assert_eq!(
			matches(&requested, Some(&provider), &[Tag::from("C")]),
			expected
		);
	}

	#[test]
	fn untagged_provider_fails_any_tagged_request() {
		let statics = [Tag::from("C")];
		assert_eq!(evaluate(&[Tag::from("C")], None, &statics), TagMatch::Untagged);
		assert_eq!(evaluate(&[], None, &statics), TagMatch::Unfiltered);
	}

	#[test]
	fn reports_first_missing_tag() {
		let requested = [Tag::from("A"), Tag::from("X"), Tag::from("Y")];
		let provider = ab();
		assert_eq!(
			evaluate(&requested, Some(&provider), &[]),
			TagMatch::Missing(&requested[1])
		);
	}

	struct Counting(AtomicUsize);

	impl TagProvider for Counting {
		fn tags(&self) -> Vec<Tag> {
			self.0.fetch_add(1, Ordering::SeqCst);
			vec![Tag::from(1), Tag::from(2)]
		}
	}

	#[test]
	fn provider_is_queried_once_per_evaluation() {
		let provider = Counting(AtomicUsize::new(0));
		let requested = [Tag::from(1), Tag::from(2)];
		assert!(matches(&requested, Some(&provider), &[]));
		assert_eq!(provider.0.load(Ordering::SeqCst), 1);
	}
}
