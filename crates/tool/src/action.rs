//! Named actions and the registry the manager looks them up in.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use kite_config::HotkeyOverride;
use kite_primitives::Hotkey;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::ActionError;
use crate::event::{EventAction, EventCategory, EventParam, ToolEvent};


bitflags! {
	/// How an action turns into an event.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ActionFlags: u8 {
		/// Activates the tool named by the action.
		const ACTIVATE = 1 << 0;
		/// Broadcasts a message to every interested tool.
		const NOTIFY = 1 << 1;
	}
}

/// A named command a user can run from a menu, toolbar or hotkey.
#[derive(Clone)]
pub struct ToolAction {
	name: String,
	label: String,
	hotkey: Option<Hotkey>,
	flags: ActionFlags,
	param: Option<EventParam>,
}

impl ToolAction {
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			label: name.clone(),
			name,
			hotkey: None,
			flags: ActionFlags::empty(),
			param: None,
		}
	}

	/// Action that activates the tool called `tool_name`.
	pub fn activation(tool_name: impl Into<String>) -> Self {
		Self::new(tool_name).with_flags(ActionFlags::ACTIVATE)
	}

	/// Action that broadcasts a message called `name`.
	pub fn notification(name: impl Into<String>) -> Self {
		Self::new(name).with_flags(ActionFlags::NOTIFY)
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	pub fn with_hotkey(mut self, hotkey: Hotkey) -> Self {
		self.hotkey = Some(hotkey);
		self
	}

	pub fn with_flags(mut self, flags: ActionFlags) -> Self {
		self.flags = flags;
		self
	}

	/// Parameter attached to every event built from this action.
	pub fn with_param(mut self, param: EventParam) -> Self {
		self.param = Some(param);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	/// Default hotkey, before user overrides.
	pub fn default_hotkey(&self) -> Option<Hotkey> {
		self.hotkey
	}

	pub fn flags(&self) -> ActionFlags {
		self.flags
	}

	pub fn param(&self) -> Option<&EventParam> {
		self.param.as_ref()
	}

	/// Builds the event that runs this action.
	pub fn make_event(&self) -> ToolEvent {
		let event = if self.flags.contains(ActionFlags::ACTIVATE) {
			ToolEvent::activate(&self.name)
		} else if self.flags.contains(ActionFlags::NOTIFY) {
			ToolEvent::message(&self.name)
		} else {
			ToolEvent::new(EventCategory::COMMAND, EventAction::ACTION).with_command_name(&self.name)
		};
		match &self.param {
			Some(param) => event.with_param(param.clone()),
			None => event,
		}
	}
}

impl fmt::Debug for ToolAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ToolAction")
			.field("name", &self.name)
			.field("hotkey", &self.hotkey)
			.field("flags", &self.flags)
			.field("param", &self.param.is_some())
			.finish()
	}
}

impl ToolEvent {
	/// Whether this event was built from `action`.
	pub fn matches_action(&self, action: &ToolAction) -> bool {
		self.category().intersects(EventCategory::COMMAND | EventCategory::MESSAGE)
			&& self.command_name() == Some(action.name())
	}
}

/// Lookup of actions by name and by hotkey.
pub trait ActionRegistry {
	fn find_action(&self, name: &str) -> Option<Rc<ToolAction>>;

	fn find_hotkey(&self, hotkey: Hotkey) -> Option<Rc<ToolAction>>;
}

/// In-memory action registry with user hotkey overrides.
#[derive(Debug, Default)]
pub struct ActionTable {
	by_name: FxHashMap<String, Rc<ToolAction>>,
	by_hotkey: FxHashMap<Hotkey, String>,
	bound: FxHashMap<String, Hotkey>,
}

impl ActionTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an action under its name and default hotkey.
	pub fn register(&mut self, action: ToolAction) -> Result<Rc<ToolAction>, ActionError> {
		if self.by_name.contains_key(action.name()) {
			return Err(ActionError::DuplicateName(action.name().to_owned()));
		}
		if let Some(hotkey) = action.default_hotkey()
			&& let Some(existing) = self.by_hotkey.get(&hotkey)
		{
			return Err(ActionError::HotkeyConflict {
				hotkey,
				action: action.name().to_owned(),
				existing: existing.clone(),
			});
		}

		let name = action.name().to_owned();
		if let Some(hotkey) = action.default_hotkey() {
			self.by_hotkey.insert(hotkey, name.clone());
			self.bound.insert(name.clone(), hotkey);
		}
		let action = Rc::new(action);
		self.by_name.insert(name, action.clone());
		Ok(action)
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}

	/// Effective hotkey of `name` after overrides.
	pub fn hotkey_for(&self, name: &str) -> Option<Hotkey> {
		self.bound.get(name).copied()
	}

	/// Binds `name` to `hotkey`, or unbinds it when `hotkey` is `None`.
	///
	/// The new binding wins: an action previously bound to the same hotkey
	/// loses its binding.
	pub fn rebind(&mut self, name: &str, hotkey: Option<Hotkey>) -> Result<(), ActionError> {
		if !self.by_name.contains_key(name) {
			return Err(ActionError::UnknownAction(name.to_owned()));
		}

		if let Some(old) = self.bound.remove(name) {
			self.by_hotkey.remove(&old);
		}
		let Some(hotkey) = hotkey else {
			return Ok(());
		};

		if let Some(previous) = self.by_hotkey.insert(hotkey, name.to_owned()) {
			warn!(%hotkey, action = name, displaced = %previous, "hotkey override displaces binding");
			self.bound.remove(&previous);
		}
		self.bound.insert(name.to_owned(), hotkey);
		Ok(())
	}

	/// Applies configured overrides in order. Returns the names of overrides
	/// that matched no action.
	pub fn apply_overrides(&mut self, overrides: &[HotkeyOverride]) -> Vec<String> {
		let mut unknown = Vec::new();
		for entry in overrides {
			if let Err(ActionError::UnknownAction(name)) = self.rebind(&entry.action, entry.hotkey) {
				warn!(action = %name, "hotkey override for unknown action");
				unknown.push(name);
			}
		}
		unknown
	}
}

impl ActionRegistry for ActionTable {
	fn find_action(&self, name: &str) -> Option<Rc<ToolAction>> {
		self.by_name.get(name).cloned()
	}

	fn find_hotkey(&self, hotkey: Hotkey) -> Option<Rc<ToolAction>> {
		self.by_hotkey.get(&hotkey).and_then(|name| self.find_action(name))
	}
}
