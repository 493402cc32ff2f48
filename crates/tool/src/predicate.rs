//! Event predicates used by waits and transitions.

use std::ops::BitOr;
use std::rc::Rc;

use kite_primitives::{Key, Modifiers, MouseButtons};
use smallvec::SmallVec;

use crate::event::{EventAction, EventCategory, ToolEvent};


/// A template an event is tested against.
///
/// Categories and actions match by intersection. Optional fields narrow the
/// match: a command name or id only constrains events that carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMatcher {
	category: EventCategory,
	action: EventAction,
	buttons: Option<MouseButtons>,
	key: Option<Key>,
	modifiers: Option<Modifiers>,
	command_name: Option<Rc<str>>,
	command_id: Option<i32>,
}

impl EventMatcher {
	pub fn new(category: EventCategory, action: EventAction) -> Self {
		Self {
			category,
			action,
			buttons: None,
			key: None,
			modifiers: None,
			command_name: None,
			command_id: None,
		}
	}

	/// Matches every event.
	pub fn any() -> Self {
		Self::new(EventCategory::ANY, EventAction::ANY)
	}

	pub fn mouse(action: EventAction) -> Self {
		Self::new(EventCategory::MOUSE, action)
	}

	pub fn click(buttons: MouseButtons) -> Self {
		Self::mouse(EventAction::MOUSE_CLICK).with_buttons(buttons)
	}

	/// Any key press, or a specific key when narrowed with [`Self::with_key`].
	pub fn keyboard() -> Self {
		Self::new(EventCategory::KEYBOARD, EventAction::KEY_PRESSED)
	}

	pub fn key(key: Key) -> Self {
		Self::keyboard().with_key(key)
	}

	/// Activation of the tool (or activation action) called `name`.
	pub fn activate(name: &str) -> Self {
		Self::new(EventCategory::COMMAND, EventAction::ACTIVATE).with_command_name(name)
	}

	/// Any activation, including deactivation requests.
	pub fn any_activate() -> Self {
		Self::new(EventCategory::COMMAND, EventAction::ACTIVATE)
	}

	pub fn cancel() -> Self {
		Self::new(EventCategory::COMMAND, EventAction::CANCEL_TOOL)
	}

	pub fn action(name: &str) -> Self {
		Self::new(EventCategory::COMMAND, EventAction::ACTION).with_command_name(name)
	}

	pub fn message(name: &str) -> Self {
		Self::new(EventCategory::MESSAGE, EventAction::NOTIFY).with_command_name(name)
	}

	pub fn menu_choice() -> Self {
		Self::new(EventCategory::MENU, EventAction::MENU_CHOICE)
	}

	pub fn menu_closed() -> Self {
		Self::new(EventCategory::MENU, EventAction::MENU_CLOSED)
	}

	pub fn with_buttons(mut self, buttons: MouseButtons) -> Self {
		self.buttons = Some(buttons);
		self
	}

	pub fn with_key(mut self, key: Key) -> Self {
		self.key = Some(key);
		self
	}

	pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
		self.modifiers = Some(modifiers);
		self
	}

	pub fn with_command_name(mut self, name: &str) -> Self {
		self.command_name = Some(Rc::from(name));
		self
	}

	pub fn with_command_id(mut self, id: i32) -> Self {
		self.command_id = Some(id);
		self
	}

	pub fn matches(&self, event: &ToolEvent) -> bool {
		if !self.category.intersects(event.category()) {
			return false;
		}

		if event.category().intersects(EventCategory::COMMAND | EventCategory::MESSAGE | EventCategory::MENU) {
			if let (Some(want), Some(got)) = (self.command_name.as_deref(), event.command_name())
				&& want != got
			{
				return false;
			}
			if let (Some(want), Some(got)) = (self.command_id, event.command_id())
				&& want != got
			{
				return false;
			}
		}

		if let Some(buttons) = self.buttons
			&& event.category().contains(EventCategory::MOUSE)
			&& !buttons.intersects(event.buttons())
		{
			return false;
		}
		if let Some(key) = self.key
			&& event.key_code() != Some(key)
		{
			return false;
		}
		if let Some(modifiers) = self.modifiers
			&& event.modifiers() != modifiers
		{
			return false;
		}

		self.action.intersects(event.action_flags())
	}
}

/// An ordered set of matchers; matches when any member matches.
///
/// Built with `|`: `EventMatcher::click(MouseButtons::LEFT) | EventMatcher::cancel()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPredicate(SmallVec<[EventMatcher; 2]>);

impl EventPredicate {
	/// A predicate that matches nothing.
	pub fn new() -> Self {
		Self::default()
	}

	/// A predicate that matches every event.
	pub fn any() -> Self {
		EventMatcher::any().into()
	}

	pub fn push(&mut self, matcher: EventMatcher) {
		self.0.push(matcher);
	}

	pub fn matches(&self, event: &ToolEvent) -> bool {
		self.0.iter().any(|m| m.matches(event))
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn clear(&mut self) {
		self.0.clear();
	}

	pub fn iter(&self) -> impl Iterator<Item = &EventMatcher> {
		self.0.iter()
	}
}

impl From<EventMatcher> for EventPredicate {
	fn from(matcher: EventMatcher) -> Self {
		let mut predicate = Self::new();
		predicate.push(matcher);
		predicate
	}
}

impl BitOr for EventMatcher {
	type Output = EventPredicate;

	fn bitor(self, rhs: EventMatcher) -> EventPredicate {
		EventPredicate::from(self) | rhs
	}
}

impl BitOr<EventMatcher> for EventPredicate {
	type Output = EventPredicate;

	fn bitor(mut self, rhs: EventMatcher) -> EventPredicate {
		self.push(rhs);
		self
	}
}

impl BitOr for EventPredicate {
	type Output = EventPredicate;

	fn bitor(mut self, rhs: EventPredicate) -> EventPredicate {
		self.0.extend(rhs.0);
		self
	}
}
