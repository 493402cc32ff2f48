use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::{Key, Modifiers};

/// Separator between modifiers and the key in hotkey strings.
const KEY_SEP: char = '-';

/// Error produced when a hotkey string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hotkey at position {position}: {message}")]
pub struct HotkeyParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

/// A key chord bound to an action, e.g. `ctrl-shift-m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
	pub key: Key,
	pub modifiers: Modifiers,
}

impl Hotkey {
	/// Creates a hotkey from a key and modifier set.
	pub const fn new(key: Key, modifiers: Modifiers) -> Self {
		Self { key, modifiers }
	}

	/// Creates an unmodified hotkey.
	pub const fn plain(key: Key) -> Self {
		Self::new(key, Modifiers::empty())
	}
}

impl FromStr for Hotkey {
	type Err = HotkeyParseError;

	fn from_str(input: &str) -> Result<Self, Self::Err> {
		let trimmed = input.trim();
		if trimmed.is_empty() {
			return Err(HotkeyParseError {
				message: "empty hotkey".to_string(),
				position: 0,
			});
		}

		let lead = input.len() - input.trim_start().len();
		let segments: Vec<(usize, &str)> = trimmed
			.split(KEY_SEP)
			.scan(lead, |offset, seg| {
				let start = *offset;
				*offset += seg.len() + KEY_SEP.len_utf8();
				Some((start, seg))
			})
			.collect();

		let mut modifiers = Modifiers::empty();
		let (last, mods) = segments.split_last().ok_or_else(|| HotkeyParseError {
			message: "empty hotkey".to_string(),
			position: lead,
		})?;

		for &(position, seg) in mods {
			let name = seg.to_ascii_lowercase();
			let modifier = Modifiers::from_modifier_name(&name).ok_or_else(|| HotkeyParseError {
				message: if seg.is_empty() {
					"empty modifier".to_string()
				} else {
					format!("unknown modifier '{seg}'")
				},
				position,
			})?;
			if modifiers.contains(modifier) {
				return Err(HotkeyParseError {
					message: format!("duplicate modifier '{seg}'"),
					position,
				});
			}
			modifiers |= modifier;
		}

		let (position, seg) = *last;
		let mut chars = seg.chars();
		let key = match (chars.next(), chars.next()) {
			(None, _) => {
				return Err(HotkeyParseError {
					message: "missing key after modifiers".to_string(),
					position,
				});
			}
			(Some(ch), None) => Key::char(ch),
			_ => Key::from_name(&seg.to_ascii_lowercase()).ok_or_else(|| HotkeyParseError {
				message: format!("unknown key '{seg}'"),
				position,
			})?,
		};

		Ok(Self { key, modifiers })
	}
}

impl fmt::Display for Hotkey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (flag, name) in [
			(Modifiers::CTRL, "ctrl"),
			(Modifiers::ALT, "alt"),
			(Modifiers::META, "meta"),
			(Modifiers::SHIFT, "shift"),
		] {
			if self.modifiers.contains(flag) {
				write!(f, "{name}{KEY_SEP}")?;
			}
		}
		f.write_str(&self.key.name())
	}
}
