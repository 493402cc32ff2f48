//! Events flowing through the dispatcher.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use kite_primitives::{Key, Modifiers, MouseButtons, Point};

use crate::tool::ToolId;


bitflags! {
	/// Broad event class. Matchers may combine several categories.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct EventCategory: u32 {
		const MOUSE = 1 << 0;
		const KEYBOARD = 1 << 1;
		const COMMAND = 1 << 2;
		const MESSAGE = 1 << 3;
		const VIEW = 1 << 4;
		const MENU = 1 << 5;
		const ANY = u32::MAX;
	}
}

bitflags! {
	/// Specific event action. Matchers may combine several actions.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct EventAction: u32 {
		const MOUSE_CLICK = 1 << 0;
		const MOUSE_DBLCLICK = 1 << 1;
		const MOUSE_DOWN = 1 << 2;
		const MOUSE_UP = 1 << 3;
		const MOUSE_DRAG = 1 << 4;
		const MOUSE_MOTION = 1 << 5;
		const MOUSE_WHEEL = 1 << 6;
		const MOUSE = Self::MOUSE_CLICK.bits()
			| Self::MOUSE_DBLCLICK.bits()
			| Self::MOUSE_DOWN.bits()
			| Self::MOUSE_UP.bits()
			| Self::MOUSE_DRAG.bits()
			| Self::MOUSE_MOTION.bits()
			| Self::MOUSE_WHEEL.bits();

		const KEY_PRESSED = 1 << 8;

		const VIEW_REFRESH = 1 << 10;
		const VIEW_ZOOM = 1 << 11;
		const VIEW_PAN = 1 << 12;

		const ACTIVATE = 1 << 14;
		const CANCEL_TOOL = 1 << 15;
		const ACTION = 1 << 16;
		const MODEL_CHANGE = 1 << 17;
		const UNDO_REDO_PRE = 1 << 18;
		const UNDO_REDO_POST = 1 << 19;

		const MENU_OPEN = 1 << 21;
		const MENU_CHOICE = 1 << 22;
		const MENU_CLOSED = 1 << 23;
		const MENU_UPDATE = 1 << 24;

		const NOTIFY = 1 << 26;

		const ANY = u32::MAX;
	}
}

/// Opaque parameter payload attached to an event.
pub type EventParam = Rc<dyn Any>;

/// Opaque transactional object attached to an event.
///
/// The scheduler never inspects it; tools downcast it to their commit type.
pub type CommitRef = Rc<dyn Any>;

/// Completion state shared between a synchronous caller and the tool serving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
	Running,
	Finished,
	Cancelled,
}

/// Shared tri-state completion flag for synchronous actions.
///
/// Starts as [`SyncState::Finished`] so a tool that never touches it does not
/// block the caller.
#[derive(Debug, Clone)]
pub struct SyncHandle(Rc<Cell<SyncState>>);

impl Default for SyncHandle {
	fn default() -> Self {
		Self::new()
	}
}

impl SyncHandle {
	pub fn new() -> Self {
		Self(Rc::new(Cell::new(SyncState::Finished)))
	}

	pub fn state(&self) -> SyncState {
		self.0.get()
	}

	pub fn set(&self, state: SyncState) {
		self.0.set(state);
	}
}

/// Routing state shared by every clone of one delivered event.
#[derive(Debug, Default)]
struct Routing {
	first_responder: Cell<Option<ToolId>>,
	pass: Cell<bool>,
}

/// A unit of input, command, or synthetic signal.
///
/// Clones share routing state (first responder and the pass-on flag), so a
/// tool that calls [`ToolEvent::pass_event`] on the copy it received is seen
/// by the dispatcher.
#[derive(Clone)]
pub struct ToolEvent {
	category: EventCategory,
	action: EventAction,
	position: Option<Point>,
	buttons: MouseButtons,
	modifiers: Modifiers,
	key: Option<Key>,
	command_name: Option<Rc<str>>,
	command_id: Option<i32>,
	param: Option<EventParam>,
	commit: Option<CommitRef>,
	sync: Option<SyncHandle>,
	routing: Rc<Routing>,
}

impl ToolEvent {
	pub fn new(category: EventCategory, action: EventAction) -> Self {
		Self {
			category,
			action,
			position: None,
			buttons: MouseButtons::empty(),
			modifiers: Modifiers::empty(),
			key: None,
			command_name: None,
			command_id: None,
			param: None,
			commit: None,
			sync: None,
			routing: Rc::new(Routing::default()),
		}
	}

	/// Mouse event at `position`.
	pub fn mouse(action: EventAction, buttons: MouseButtons, position: Point) -> Self {
		let mut event = Self::new(EventCategory::MOUSE, action);
		event.buttons = buttons;
		event.position = Some(position);
		event
	}

	pub fn click(buttons: MouseButtons, position: Point) -> Self {
		Self::mouse(EventAction::MOUSE_CLICK, buttons, position)
	}

	/// Key press event.
	pub fn key(key: Key, modifiers: Modifiers) -> Self {
		let mut event = Self::new(EventCategory::KEYBOARD, EventAction::KEY_PRESSED);
		event.key = Some(key);
		event.modifiers = modifiers;
		event
	}

	/// Command event without a name.
	pub fn command(action: EventAction) -> Self {
		Self::new(EventCategory::COMMAND, action)
	}

	/// Activation request for the tool (or activation action) called `name`.
	pub fn activate(name: &str) -> Self {
		Self::command(EventAction::ACTIVATE).with_command_name(name)
	}

	/// Cancellation request for the current tool.
	pub fn cancel() -> Self {
		Self::command(EventAction::CANCEL_TOOL)
	}

	/// Named action command.
	pub fn action(name: &str) -> Self {
		Self::command(EventAction::ACTION).with_command_name(name)
	}

	/// Named broadcast message.
	pub fn message(name: &str) -> Self {
		Self::new(EventCategory::MESSAGE, EventAction::NOTIFY).with_command_name(name)
	}

	/// Context menu selection of item `id`.
	pub fn menu_choice(id: i32) -> Self {
		Self::new(EventCategory::MENU, EventAction::MENU_CHOICE).with_command_id(id)
	}

	/// Context menu dismissal.
	pub fn menu_closed() -> Self {
		Self::new(EventCategory::MENU, EventAction::MENU_CLOSED)
	}

	pub fn with_position(mut self, position: Point) -> Self {
		self.position = Some(position);
		self
	}

	pub fn without_position(mut self) -> Self {
		self.position = None;
		self
	}

	pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
		self.modifiers = modifiers;
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

	pub fn with_param(mut self, param: EventParam) -> Self {
		self.param = Some(param);
		self
	}

	pub fn with_commit(mut self, commit: CommitRef) -> Self {
		self.commit = Some(commit);
		self
	}

	pub fn with_sync(mut self, sync: SyncHandle) -> Self {
		self.sync = Some(sync);
		self
	}

	pub fn category(&self) -> EventCategory {
		self.category
	}

	pub fn action_flags(&self) -> EventAction {
		self.action
	}

	pub fn position(&self) -> Option<Point> {
		self.position
	}

	pub fn buttons(&self) -> MouseButtons {
		self.buttons
	}

	pub fn modifiers(&self) -> Modifiers {
		self.modifiers
	}

	pub fn key_code(&self) -> Option<Key> {
		self.key
	}

	pub fn command_name(&self) -> Option<&str> {
		self.command_name.as_deref()
	}

	pub fn command_id(&self) -> Option<i32> {
		self.command_id
	}

	pub fn param(&self) -> Option<&EventParam> {
		self.param.as_ref()
	}

	/// Downcasts the parameter payload.
	pub fn param_as<T: 'static>(&self) -> Option<&T> {
		self.param.as_deref().and_then(|p| p.downcast_ref::<T>())
	}

	pub fn commit(&self) -> Option<&CommitRef> {
		self.commit.as_ref()
	}

	/// Completion flag of a synchronous action, if the caller is waiting on one.
	pub fn sync(&self) -> Option<&SyncHandle> {
		self.sync.as_ref()
	}

	pub fn is_activate(&self) -> bool {
		self.category.contains(EventCategory::COMMAND) && self.action.contains(EventAction::ACTIVATE)
	}

	pub fn is_cancel(&self) -> bool {
		self.category.contains(EventCategory::COMMAND) && self.action.contains(EventAction::CANCEL_TOOL)
	}

	/// True for a click with any of `buttons`.
	pub fn is_click(&self, buttons: MouseButtons) -> bool {
		self.category.contains(EventCategory::MOUSE) && self.action.contains(EventAction::MOUSE_CLICK) && self.buttons.intersects(buttons)
	}

	pub fn is_menu_choice(&self) -> bool {
		self.category.contains(EventCategory::MENU) && self.action.contains(EventAction::MENU_CHOICE)
	}

	pub fn is_menu_closed(&self) -> bool {
		self.category.contains(EventCategory::MENU) && self.action.contains(EventAction::MENU_CLOSED)
	}

	/// True for a command or message carrying `name`.
	pub fn is_action(&self, name: &str) -> bool {
		self.category.intersects(EventCategory::COMMAND | EventCategory::MESSAGE) && self.command_name() == Some(name)
	}

	/// Asks the dispatcher to keep offering this event to the next active tool.
	pub fn pass_event(&self) {
		self.routing.pass.set(true);
	}

	pub fn passes(&self) -> bool {
		self.routing.pass.get()
	}

	/// The first tool that accepted this event, if any.
	pub fn first_responder(&self) -> Option<ToolId> {
		self.routing.first_responder.get()
	}

	pub(crate) fn claim_first_responder(&self, tool: ToolId) {
		if self.routing.first_responder.get().is_none() {
			self.routing.first_responder.set(Some(tool));
		}
	}

	pub(crate) fn reset_pass(&self) {
		self.routing.pass.set(false);
	}

	/// A copy with fresh routing state, for re-queueing.
	pub fn detached(&self) -> Self {
		Self {
			routing: Rc::new(Routing::default()),
			..self.clone()
		}
	}
}

/// Events compare by value; payloads compare by identity and routing is ignored.
impl PartialEq for ToolEvent {
	fn eq(&self, other: &Self) -> bool {
		fn same(a: &Option<Rc<dyn Any>>, b: &Option<Rc<dyn Any>>) -> bool {
			match (a, b) {
				(Some(a), Some(b)) => Rc::ptr_eq(a, b),
				(None, None) => true,
				_ => false,
			}
		}

		self.category == other.category
			&& self.action == other.action
			&& self.position == other.position
			&& self.buttons == other.buttons
			&& self.modifiers == other.modifiers
			&& self.key == other.key
			&& self.command_name == other.command_name
			&& self.command_id == other.command_id
			&& same(&self.param, &other.param)
			&& same(&self.commit, &other.commit)
	}
}

impl fmt::Debug for ToolEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("ToolEvent");
		s.field("category", &self.category).field("action", &self.action);
		if let Some(position) = self.position {
			s.field("position", &position);
		}
		if !self.buttons.is_empty() {
			s.field("buttons", &self.buttons);
		}
		if let Some(key) = self.key {
			s.field("key", &key).field("modifiers", &self.modifiers);
		}
		if let Some(name) = self.command_name() {
			s.field("command", &name);
		}
		if let Some(id) = self.command_id {
			s.field("id", &id);
		}
		s.field("has_param", &self.param.is_some())
			.field("has_commit", &self.commit.is_some())
			.finish()
	}
}
