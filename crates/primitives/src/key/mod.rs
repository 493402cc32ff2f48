//! Key, modifier, and mouse button types carried by input events.

mod hotkey;

use bitflags::bitflags;
pub use hotkey::{Hotkey, HotkeyParseError};

/// A logical key, independent of keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
	/// A printable character. Letters are stored lowercase.
	Char(char),
	/// Function key `F1`..`F24`.
	F(u8),
	Escape,
	Enter,
	Tab,
	Backspace,
	Delete,
	Insert,
	Home,
	End,
	PageUp,
	PageDown,
	Up,
	Down,
	Left,
	Right,
	Space,
}

impl Key {
	/// Creates a character key, normalizing ASCII letters to lowercase.
	pub fn char(ch: char) -> Self {
		Self::Char(ch.to_ascii_lowercase())
	}

	/// Canonical name used by [`Hotkey`] display and parsing.
	pub fn name(self) -> String {
		match self {
			Self::Char('-') => "minus".to_string(),
			Self::Char(ch) => ch.to_string(),
			Self::F(n) => format!("f{n}"),
			Self::Escape => "esc".to_string(),
			Self::Enter => "enter".to_string(),
			Self::Tab => "tab".to_string(),
			Self::Backspace => "backspace".to_string(),
			Self::Delete => "del".to_string(),
			Self::Insert => "ins".to_string(),
			Self::Home => "home".to_string(),
			Self::End => "end".to_string(),
			Self::PageUp => "pageup".to_string(),
			Self::PageDown => "pagedown".to_string(),
			Self::Up => "up".to_string(),
			Self::Down => "down".to_string(),
			Self::Left => "left".to_string(),
			Self::Right => "right".to_string(),
			Self::Space => "space".to_string(),
		}
	}

	/// Looks up a named key. Single characters are not handled here.
	pub(crate) fn from_name(name: &str) -> Option<Self> {
		let key = match name {
			"esc" | "escape" => Self::Escape,
			"enter" | "ret" | "return" => Self::Enter,
			"tab" => Self::Tab,
			"backspace" | "bs" => Self::Backspace,
			"del" | "delete" => Self::Delete,
			"ins" | "insert" => Self::Insert,
			"home" => Self::Home,
			"end" => Self::End,
			"pageup" | "pgup" => Self::PageUp,
			"pagedown" | "pgdn" => Self::PageDown,
			"up" => Self::Up,
			"down" => Self::Down,
			"left" => Self::Left,
			"right" => Self::Right,
			"space" => Self::Space,
			"minus" => Self::Char('-'),
			_ => {
				let digits = name.strip_prefix('f')?;
				let n: u8 = digits.parse().ok()?;
				if !(1..=24).contains(&n) {
					return None;
				}
				Self::F(n)
			}
		};
		Some(key)
	}
}

bitflags! {
	/// Keyboard modifiers held during an input event.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Modifiers: u8 {
		const SHIFT = 1 << 0;
		const CTRL = 1 << 1;
		const ALT = 1 << 2;
		const META = 1 << 3;
	}
}

impl Modifiers {
	/// Parses a single modifier name as written in hotkey strings.
	pub(crate) fn from_modifier_name(name: &str) -> Option<Self> {
		match name {
			"shift" | "s" => Some(Self::SHIFT),
			"ctrl" | "c" => Some(Self::CTRL),
			"alt" | "a" => Some(Self::ALT),
			"meta" | "cmd" | "super" => Some(Self::META),
			_ => None,
		}
	}
}

bitflags! {
	/// Mouse buttons involved in a mouse event.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct MouseButtons: u8 {
		const LEFT = 1 << 0;
		const RIGHT = 1 << 1;
		const MIDDLE = 1 << 2;
		const AUX1 = 1 << 3;
		const AUX2 = 1 << 4;
		const ANY = Self::LEFT.bits() | Self::RIGHT.bits() | Self::MIDDLE.bits() | Self::AUX1.bits() | Self::AUX2.bits();
	}
}
