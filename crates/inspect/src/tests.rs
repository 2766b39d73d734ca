use clap::CommandFactory;
use locus_locator::{LocateError, Tag};
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

fn demo_locator() -> Locator {
	let config = LocatorConfig::parse(demo::DEFAULT_CONFIG).expect("demo configuration parses");
	let Materialized { locator, warnings } = config.build(&demo::catalog());
	assert_eq!(warnings.len(), 1, "only the retired logger is missing");
	locator
}

#[test]
fn cli_definition_is_valid() {
	Args::command().debug_assert();
}

#[test]
fn resolve_arguments_collect_tags() {
	let args = Args::try_parse_from(["locus", "resolve", "Logger", "-t", "file", "--tag", "#boss"])
		.expect("arguments parse");
	match args.command {
		Command::Resolve { capability, tags } => {
			assert_eq!(capability, "Logger");
			assert_eq!(tags, vec![Tag::from("file"), Tag::token("boss")]);
		}
		other => panic!("unexpected command {other:?}"),
	}
}

#[rstest]
#[case("red", Tag::from("red"))]
#[case("#boss", Tag::token("boss"))]
#[case("true", Tag::from(true))]
#[case("42", Tag::from(42))]
#[case("-1.5", Tag::from(-1.5))]
#[case("1.2.3", Tag::from("1.2.3"))]
fn tags_parse_by_shape(#[case] raw: &str, #[case] expected: Tag) {
	assert_eq!(parse_tag(raw).unwrap(), expected);
}

#[rstest]
#[case("Logger")]
#[case("dyn Logger")]
fn capabilities_are_found_by_short_name(#[case] name: &str) {
	let locator = demo_locator();
	let capability = find_capability(&locator, name).expect("logger is offered");
	assert_eq!(capability, Capability::of::<dyn demo::Logger>());
}

#[test]
fn unknown_capability_is_not_found() {
	assert!(find_capability(&demo_locator(), "Telescope").is_none());
}

#[test]
fn tags_choose_between_loggers() {
	let locator = demo_locator();
	let capability = Capability::of::<dyn demo::Logger>();

	let console = locator.resolve(capability, &[]).unwrap();
	assert_eq!(console.source.name(), "console");
	assert_eq!(demo::describe(&console.service).as_deref(), Some("[console] hello"));

	let file = locator.resolve(capability, &[Tag::from("file")]).unwrap();
	assert_eq!(file.source.name(), "file");
	assert_eq!(
		locator.resolve(capability, &[Tag::from("syslog")]).unwrap_err(),
		LocateError::Filtered(capability.name())
	);
}

#[test]
fn store_is_initialized_before_use() {
	let locator = demo_locator();
	let store = locator.resolve(Capability::of::<dyn demo::Store>(), &[]).unwrap();
	assert_eq!(demo::describe(&store.service).as_deref(), Some("ready=true total=1"));
}

#[test]
fn first_audio_component_wins() {
	let locator = demo_locator();
	let output = locator
		.resolve(Capability::of::<dyn demo::AudioOutput>(), &[])
		.unwrap();
	assert_eq!(demo::describe(&output.service).as_deref(), Some("channel mix"));
}

#[test]
fn report_lists_sets_in_priority_order() {
	let locator = demo_locator();
	let text = report::render(&locator, "");
	let lines: Vec<_> = text.lines().filter(|l| !l.starts_with(' ')).collect();
	assert_eq!(lines, ["core (priority 10)", "fallback (priority 0)"]);
	assert!(text.contains("  legacy [prototype] unloaded epoch=0 not loadable\n    reason: no prototype assigned\n"));
	assert!(text.contains("    provides: TaggedLogger, dyn Logger"));
	assert!(text.contains("    dynamic tags: console"));
}

#[test]
fn report_filters_by_type_search() {
	let locator = demo_locator();
	let text = report::render(&locator, "service store");
	assert_eq!(
		text,
		"core (priority 10)\n  store [asset] unloaded epoch=0 loadable\n    provides: MemoryStore, dyn Store\n"
	);
	assert_eq!(report::render(&locator, "telescope"), "no matching sources\n");
}

#[test]
fn clear_after_load_advances_epochs() {
	let locator = demo_locator();
	for source in locator.sources() {
		let _ = source.load();
	}
	locator.clear_all();

	let console = locator.find_source("console").unwrap().status();
	assert!(!console.loaded);
	assert_eq!(console.epoch.get(), 1);
	let legacy = locator.find_source("legacy").unwrap().status();
	assert_eq!(legacy.epoch.get(), 0, "a source that never loaded keeps its epoch");
}
