//! Error types for configuration parsing.

use std::path::PathBuf;

use kite_primitives::HotkeyParseError;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or an unknown/mistyped key.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A hotkey override could not be parsed.
	#[error("invalid hotkey for action '{action}': {source}")]
	InvalidHotkey {
		/// The action whose override failed.
		action: String,
		/// The underlying parse error.
		source: HotkeyParseError,
	},

	/// A numeric option is outside its accepted range.
	#[error("option '{option}' out of range: {value}")]
	OutOfRange {
		/// The option key.
		option: &'static str,
		/// The rejected value.
		value: u64,
	},
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
