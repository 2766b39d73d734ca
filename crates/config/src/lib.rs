//! Configuration for locus.
//!
//! Configuration is written in TOML and describes:
//!
//! - **Session**: whether the host is authoring (`design`) or running (`live`)
//! - **Logging**: the tracing filter and an optional log file
//! - **Source sets**: named, prioritized groups of sources, each naming a
//!   prototype from the host's [`Catalog`]
//!
//! ```toml
//! session = "design"
//!
//! [log]
//! filter = "locus=debug"
//! file = "/tmp/locus.log"
//!
//! [[set]]
//! name = "core"
//! priority = 10
//!
//! [[set.source]]
//! name = "console"
//! prototype = "console-logger"
//! kind = "prototype"
//! ```
//!
//! Tag values are not configurable; hosts attach them in code.
//!
//! # Validation
//!
//! Set names must be non-empty and unique, as must source names within a
//! set. A source naming an unknown prototype is not an error: it is
//! registered without a prototype, reports itself as not loadable, and
//! produces a [`ConfigWarning`].

pub mod catalog;
pub mod error;

use std::path::{Path, PathBuf};

pub use catalog::Catalog;
pub use error::{ConfigError, ConfigWarning, Result};
use locus_locator::{Locator, Session, SessionMode, SourceConfig, SourceKind};
use rustc_hash::FxHashSet;
use serde::Deserialize;

/// Session mode as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSetting {
	#[default]
	Design,
	Live,
}

impl From<SessionSetting> for SessionMode {
	fn from(setting: SessionSetting) -> Self {
		match setting {
			SessionSetting::Design => SessionMode::Design,
			SessionSetting::Live => SessionMode::Live,
		}
	}
}

/// Source kind as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindSetting {
	#[default]
	Prototype,
	Asset,
	Scene,
}

impl From<KindSetting> for SourceKind {
	fn from(kind: KindSetting) -> Self {
		match kind {
			KindSetting::Prototype => SourceKind::Prototype,
			KindSetting::Asset => SourceKind::Asset,
			KindSetting::Scene => SourceKind::Scene,
		}
	}
}

/// `[log]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
	/// Tracing filter directive, e.g. `locus=debug`.
	pub filter: Option<String>,
	/// File to write logs to instead of stderr.
	pub file: Option<PathBuf>,
}

/// One `[[set]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetConfig {
	pub name: String,
	/// Sets are searched by descending priority.
	#[serde(default)]
	pub priority: i32,
	#[serde(default, rename = "source")]
	pub sources: Vec<SourceEntry>,
}

/// One `[[set.source]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceEntry {
	pub name: String,
	/// Catalog name of the prototype. Absent means the source has none.
	pub prototype: Option<String>,
	#[serde(default)]
	pub kind: KindSetting,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocatorConfig {
	#[serde(default)]
	pub session: SessionSetting,
	#[serde(default)]
	pub log: LogConfig,
	#[serde(default, rename = "set")]
	pub sets: Vec<SetConfig>,
}

/// A locator built from configuration, with the warnings found on the way.
#[derive(Debug)]
pub struct Materialized {
	pub locator: Locator,
	pub warnings: Vec<ConfigWarning>,
}

impl LocatorConfig {
	/// Parses and validates a TOML string.
	pub fn parse(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads and validates a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Checks naming rules.
	pub fn validate(&self) -> Result<()> {
		let mut sets = FxHashSet::default();
		for set in &self.sets {
			if set.name.trim().is_empty() {
				return Err(ConfigError::EmptyName { what: "set" });
			}
			if !sets.insert(set.name.as_str()) {
				return Err(ConfigError::DuplicateSet(set.name.clone()));
			}

			let mut sources = FxHashSet::default();
			for source in &set.sources {
				if source.name.trim().is_empty() {
					return Err(ConfigError::EmptyName { what: "source" });
				}
				if !sources.insert(source.name.as_str()) {
					return Err(ConfigError::DuplicateSource {
						set: set.name.clone(),
						name: source.name.clone(),
					});
				}
			}
		}
		Ok(())
	}

	/// Builds a locator, resolving prototype names against `catalog`.
	pub fn build(&self, catalog: &Catalog) -> Materialized {
		let locator = Locator::new(Session::new(self.session.into()));
		let mut warnings = Vec::new();

		for set in &self.sets {
			locator.add_set(set.name.as_str(), set.priority);
			for entry in &set.sources {
				let mut source = SourceConfig::new(entry.name.as_str(), entry.kind.into());
				if let Some(name) = &entry.prototype {
					match catalog.get(name) {
						Some(prototype) => source = source.with_prototype(prototype.clone()),
						None => {
							let warning = ConfigWarning::UnknownPrototype {
								set: set.name.clone(),
								name: entry.name.clone(),
								prototype: name.clone(),
							};
							tracing::warn!(%warning, "Unknown prototype in configuration");
							warnings.push(warning);
						}
					}
				}
				locator.add_source(&set.name, source);
			}
		}

		Materialized { locator, warnings }
	}
}
