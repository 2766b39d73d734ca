//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or schema.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A set or source was given an empty name.
	#[error("{what} name must not be empty")]
	EmptyName {
		/// What was being named ("set" or "source").
		what: &'static str,
	},

	/// Two sets share a name.
	#[error("duplicate set name: {0}")]
	DuplicateSet(String),

	/// Two sources in one set share a name.
	#[error("duplicate source `{name}` in set `{set}`")]
	DuplicateSource {
		/// The set containing both sources.
		set: String,
		/// The repeated source name.
		name: String,
	},
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Non-fatal problem found while materializing configuration.
///
/// Warnings never prevent a locator from being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
	/// A source names a prototype the catalog does not know. The source is
	/// registered without a prototype and reports itself as not loadable.
	UnknownPrototype {
		/// The set containing the source.
		set: String,
		/// The source name.
		name: String,
		/// The prototype that was not found.
		prototype: String,
	},
}

impl std::fmt::Display for ConfigWarning {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConfigWarning::UnknownPrototype {
				set,
				name,
				prototype,
			} => {
				write!(
					f,
					"source '{set}/{name}' uses unknown prototype '{prototype}' and will not load"
				)
			}
		}
	}
}
