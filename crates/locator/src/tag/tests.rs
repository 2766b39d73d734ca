use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use rstest::rstest;

use super::*;

#[rstest]
#[case(Tag::from("red"), Tag::from(String::from("red")), true)]
#[case(Tag::from("red"), Tag::from("blue"), false)]
#[case(Tag::from("red"), Tag::token("red"), false)]
#[case(Tag::from(789), Tag::from(789i64), true)]
#[case(Tag::from(789), Tag::from(790), false)]
#[case(Tag::from(789), Tag::from(789.0), false)]
#[case(Tag::from(0.0), Tag::from(-0.0), true)]
#[case(Tag::from(f64::NAN), Tag::from(f64::NAN), true)]
#[case(Tag::from(true), Tag::from(true), true)]
#[case(
	Tag::structured([Tag::from(22.0), Tag::from(33.0)]),
	Tag::structured([Tag::from(22.0), Tag::from(33.0)]),
	true
)]
#[case(
	Tag::structured([Tag::from(22.0), Tag::from(33.0)]),
	Tag::structured([Tag::from(33.0), Tag::from(22.0)]),
	false
)]
fn value_equality(#[case] a: Tag, #[case] b: Tag, #[case] equal: bool) {
	assert_eq!(a == b, equal, "{a} vs {b}");
}

#[test]
fn object_tags_compare_by_identity() {
	let first = Arc::new(String::from("shared"));
	let twin = Arc::new(String::from("shared"));

	assert_eq!(Tag::object(Arc::clone(&first)), Tag::object(Arc::clone(&first)));
	assert_ne!(Tag::object(first), Tag::object(twin));
}

#[test]
fn hash_agrees_with_equality() {
	let set: HashSet<Tag> = [
		Tag::from(0.0),
		Tag::from(-0.0),
		Tag::from("a"),
		Tag::from("a"),
		Tag::token("a"),
	]
	.into_iter()
	.collect();
	assert_eq!(set.len(), 3);
}

#[test]
fn display_forms() {
	assert_eq!(Tag::from("red").to_string(), "red");
	assert_eq!(Tag::token("boss").to_string(), "#boss");
	assert_eq!(
		Tag::structured([Tag::from(1), Tag::from("x")]).to_string(),
		"(1, x)"
	);
}

#[test]
fn dynamic_tags_insert_and_remove() {
	let tags = DynamicTags::new([Tag::from("a"), Tag::from("a"), Tag::from("b")]);
	assert_eq!(tags.tags(), vec![Tag::from("a"), Tag::from("b")]);

	assert!(!tags.insert(Tag::from("b")));
	assert!(tags.insert(Tag::from("c")));
	assert!(tags.contains(&Tag::from("c")));

	assert!(tags.remove(&Tag::from("a")));
	assert!(!tags.remove(&Tag::from("a")));
	assert_eq!(tags.tags(), vec![Tag::from("b"), Tag::from("c")]);
}

proptest! {
	#[test]
	fn int_tags_equal_iff_values_equal(a in any::<i64>(), b in any::<i64>()) {
		prop_assert_eq!(Tag::from(a) == Tag::from(b), a == b);
	}

	#[test]
	fn float_tags_are_reflexive(v in any::<f64>()) {
		prop_assert_eq!(Tag::from(v), Tag::from(v));
	}

	#[test]
	fn text_never_equals_token(name in "[a-z]{0,8}") {
		prop_assert_ne!(Tag::from(name.as_str()), Tag::token(name.as_str()));
	}
}
