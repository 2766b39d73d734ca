//! Free-text filtering of sources by the types they expose.

use crate::capability::Capability;

/// Splits a query into lowercase words.
pub fn search_words(query: &str) -> Vec<String> {
	query.split_whitespace().map(str::to_lowercase).collect()
}

/// Returns true if every word occurs in the name of at least one type.
///
/// An empty word list matches everything.
pub fn matches_type_search(words: &[String], types: &[Capability]) -> bool {
	let names: Vec<String> = types.iter().map(|t| t.name().to_lowercase()).collect();
	words
		.iter()
		.all(|word| names.iter().any(|name| name.contains(word.as_str())))
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	trait AudioMixer {}
	struct SceneGraph;

	fn types() -> Vec<Capability> {
		vec![Capability::of::<dyn AudioMixer>(), Capability::of::<SceneGraph>()]
	}

	#[test]
	fn words_are_lowercased_and_trimmed() {
		assert_eq!(search_words("  Audio\tMIXER  "), ["audio", "mixer"]);
		assert!(search_words("   ").is_empty());
	}

	#[rstest]
	#[case("", true)]
	#[case("mixer", true)]
	#[case("audio graph", true)]
	#[case("SCENE", true)]
	#[case("mixer radio", false)]
	#[case("radio", false)]
	fn every_word_must_match_some_type(#[case] query: &str, #[case] expected: bool) {
		assert_eq!(matches_type_search(&search_words(query), &types()), expected);
	}

	#[test]
	fn no_types_match_only_empty_query() {
		assert!(matches_type_search(&[], &[]));
		assert!(!matches_type_search(&search_words("x"), &[]));
	}
}
