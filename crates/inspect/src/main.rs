//! `locus` command line inspector.
//!
//! Builds a locator from configuration and the demo catalog, then reports
//! on its sources or resolves capabilities through it.

mod demo;
mod report;

use std::convert::Infallible;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use locus_config::{LocatorConfig, LogConfig, Materialized};
use locus_locator::{Capability, Locator, Tag};

/// Inspector command line arguments.
#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(about = "Inspect and exercise locus service sources")]
struct Args {
	/// Configuration file; the built-in demo configuration is used otherwise
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// List sources with their types, tags, and load state
	Report {
		/// Only show sources exposing types that match every word
		#[arg(long, value_name = "QUERY", default_value = "")]
		types: String,
	},
	/// Resolve a capability through the locator
	Resolve {
		/// Capability name, e.g. `Logger` or `dyn Logger`
		capability: String,
		/// Condition tag: `true`/`false`, a number, `#token`, or text
		#[arg(short, long = "tag", value_parser = parse_tag)]
		tags: Vec<Tag>,
	},
	/// Instantiate one source and resolve all of its capabilities
	Load {
		/// Source name
		source: String,
	},
	/// Load every source, clear all caches, and report the result
	Clear,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => LocatorConfig::load(path)
			.with_context(|| format!("loading configuration from {}", path.display()))?,
		None => LocatorConfig::parse(demo::DEFAULT_CONFIG).context("parsing demo configuration")?,
	};

	setup_tracing(args.verbose, &config.log)?;

	let Materialized { locator, warnings } = config.build(&demo::catalog());
	tracing::info!(
		session = %locator.session().mode(),
		sources = locator.sources().len(),
		warnings = warnings.len(),
		"Locator built"
	);

	match args.command {
		Command::Report { types } => print!("{}", report::render(&locator, &types)),
		Command::Resolve { capability, tags } => resolve(&locator, &capability, &tags)?,
		Command::Load { source } => {
			let Some(found) = locator.find_source(&source) else {
				bail!("no source named `{source}`");
			};
			let new_instance = found
				.load()
				.with_context(|| format!("loading source `{source}`"))?;
			println!(
				"{source}: {} (epoch {})",
				if new_instance { "instantiated" } else { "already loaded" },
				found.epoch()
			);
		}
		Command::Clear => {
			for source in locator.sources() {
				if let Err(error) = source.load() {
					tracing::debug!(source = %source.name(), %error, "Source did not load");
				}
			}
			locator.clear_all();
			print!("{}", report::render(&locator, ""));
		}
	}

	Ok(())
}

fn resolve(locator: &Locator, name: &str, tags: &[Tag]) -> anyhow::Result<()> {
	let Some(capability) = find_capability(locator, name) else {
		bail!("no source offers a capability named `{name}`");
	};
	let located = locator.resolve(capability, tags)?;
	println!(
		"{} from {}{}",
		capability.short_name(),
		located.source.name(),
		if located.new_instance { " (new instance)" } else { "" }
	);
	if let Some(description) = demo::describe(&located.service) {
		println!("  {description}");
	}
	Ok(())
}

/// Finds a capability offered by any source by full or short name. A leading
/// `dyn ` may be omitted.
fn find_capability(locator: &Locator, name: &str) -> Option<Capability> {
	let wanted = name.strip_prefix("dyn ").unwrap_or(name).trim();
	locator
		.sources()
		.iter()
		.flat_map(|source| source.capabilities())
		.find(|capability| {
			let short = capability.short_name();
			capability.name() == name
				|| short == name
				|| short.strip_prefix("dyn ").unwrap_or(&short) == wanted
		})
}

fn parse_tag(raw: &str) -> Result<Tag, Infallible> {
	if let Some(token) = raw.strip_prefix('#') {
		return Ok(Tag::token(token));
	}
	if let Ok(value) = raw.parse::<bool>() {
		return Ok(Tag::from(value));
	}
	if let Ok(value) = raw.parse::<i64>() {
		return Ok(Tag::from(value));
	}
	if let Ok(value) = raw.parse::<f64>() {
		return Ok(Tag::from(value));
	}
	Ok(Tag::from(raw))
}

fn setup_tracing(verbose: bool, log: &LogConfig) -> anyhow::Result<()> {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = EnvFilter::try_from_default_env().or_else(|_| match &log.filter {
		Some(directives) => EnvFilter::try_new(directives),
		None if verbose => Ok(EnvFilter::new("locus=debug")),
		None => Ok(EnvFilter::new("locus=info")),
	})?;

	if let Some(path) = &log.file {
		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(path)
			.with_context(|| format!("opening log file {}", path.display()))?;

		let file_layer = tracing_subscriber::fmt::layer()
			.with_writer(file)
			.with_ansi(false)
			.with_target(true);

		tracing_subscriber::registry()
			.with(filter)
			.with(file_layer)
			.init();

		tracing::info!(path = ?path, "Inspector tracing initialized");
		return Ok(());
	}

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
	Ok(())
}

#[cfg(test)]
mod tests;
