//! Configuration for the tool manager.
//!
//! Configuration is written in TOML:
//!
//! ```toml
//! sync_poll_interval_ms = 2
//! max_dispatch_depth = 16
//!
//! [hotkeys]
//! "route.start" = "x"
//! "edit.delete" = "ctrl-del"
//! "view.zoom_fit" = ""   # unbind
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

mod error;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub use error::{ConfigError, Result};
use kite_primitives::Hotkey;
use serde::Deserialize;

/// Default sleep between UI yields while a synchronous action runs.
pub const DEFAULT_SYNC_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default limit on nested event processing.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

const MAX_SYNC_POLL_INTERVAL_MS: u64 = 1000;

/// One user hotkey override. A `None` hotkey unbinds the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyOverride {
	pub action: String,
	pub hotkey: Option<Hotkey>,
}

/// Validated tool manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
	/// Sleep between host UI yields while a synchronous action is running.
	pub sync_poll_interval: Duration,
	/// Maximum nesting of event processing (menus, immediate actions, hotkeys).
	pub max_dispatch_depth: usize,
	/// Hotkey overrides, ordered by action name.
	pub hotkeys: Vec<HotkeyOverride>,
}

impl Default for ManagerConfig {
	fn default() -> Self {
		Self {
			sync_poll_interval: DEFAULT_SYNC_POLL_INTERVAL,
			max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
			hotkeys: Vec::new(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
	sync_poll_interval_ms: u64,
	max_dispatch_depth: usize,
	hotkeys: BTreeMap<String, String>,
}

impl Default for RawConfig {
	fn default() -> Self {
		Self {
			sync_poll_interval_ms: DEFAULT_SYNC_POLL_INTERVAL.as_millis() as u64,
			max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
			hotkeys: BTreeMap::new(),
		}
	}
}

impl ManagerConfig {
	/// Parses and validates configuration from a TOML string.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let raw: RawConfig = toml::from_str(input)?;

		if !(1..=MAX_SYNC_POLL_INTERVAL_MS).contains(&raw.sync_poll_interval_ms) {
			return Err(ConfigError::OutOfRange {
				option: "sync_poll_interval_ms",
				value: raw.sync_poll_interval_ms,
			});
		}
		if raw.max_dispatch_depth == 0 {
			return Err(ConfigError::OutOfRange {
				option: "max_dispatch_depth",
				value: 0,
			});
		}

		let hotkeys = raw
			.hotkeys
			.into_iter()
			.map(|(action, binding)| -> Result<HotkeyOverride> {
				let binding = binding.trim();
				let hotkey = if binding.is_empty() {
					None
				} else {
					Some(binding.parse::<Hotkey>().map_err(|source| ConfigError::InvalidHotkey {
						action: action.clone(),
						source,
					})?)
				};
				Ok(HotkeyOverride { action, hotkey })
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(Self {
			sync_poll_interval: Duration::from_millis(raw.sync_poll_interval_ms),
			max_dispatch_depth: raw.max_dispatch_depth,
			hotkeys,
		})
	}

	/// Reads and parses a configuration file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&content)
	}
}
