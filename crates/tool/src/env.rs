//! Collaborators the manager drives: the view, the host frame, and the
//! action registry.

use std::fmt;
use std::rc::Rc;

use kite_primitives::Point;

use crate::action::{ActionRegistry, ActionTable};
use crate::event::ToolEvent;
use crate::manager::ToolManager;

/// Per-tool view interaction settings, saved and applied whenever the
/// current tool changes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSettings {
	/// Pins the cursor to a position, if set.
	pub forced_cursor: Option<Point>,
	pub show_cursor: bool,
	pub snapping: bool,
	pub grab_mouse: bool,
	pub auto_pan: bool,
	pub capture_cursor: bool,
}

/// The view the tools operate on.
pub trait ViewControls {
	fn cursor_position(&self) -> Point;

	/// Settings currently applied to the view.
	fn settings(&self) -> ViewSettings;

	fn apply_settings(&self, settings: &ViewSettings);

	/// Forces the cursor to `position`, or releases it.
	fn force_cursor_position(&self, position: Option<Point>);
}

/// The host window.
pub trait HostFrame {
	/// Shows `menu` modally and returns the chosen item id.
	///
	/// Implementations may call [`ToolManager::process_event`] while the popup
	/// is open.
	fn popup_menu(&self, manager: &ToolManager, menu: &ContextMenu) -> Option<i32>;

	/// Runs one iteration of the host UI loop. Called while a synchronous
	/// action waits for its completion flag.
	fn yield_to_ui(&self, manager: &ToolManager);

	/// Refreshes status bars and toolbars after an event was processed.
	fn update_ui(&self, _event: &ToolEvent) {}
}

/// One entry in a [`ContextMenu`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
	pub id: i32,
	pub label: String,
	/// Action name carried by the choice event.
	pub action: Option<String>,
	pub enabled: bool,
}

impl MenuItem {
	pub fn new(id: i32, label: impl Into<String>) -> Self {
		Self {
			id,
			label: label.into(),
			action: None,
			enabled: true,
		}
	}

	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn disabled(mut self) -> Self {
		self.enabled = false;
		self
	}
}

/// A tool-provided popup menu.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextMenu {
	pub title: String,
	pub items: Vec<MenuItem>,
}

impl ContextMenu {
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			items: Vec::new(),
		}
	}

	pub fn with_item(mut self, item: MenuItem) -> Self {
		self.items.push(item);
		self
	}

	pub fn item(&self, id: i32) -> Option<&MenuItem> {
		self.items.iter().find(|item| item.id == id)
	}
}

/// When a scheduled context menu is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuTrigger {
	/// Never.
	#[default]
	Off,
	/// On the next right click.
	Button,
	/// After the current event, once.
	Now,
}

/// The collaborators a [`ToolManager`] is built with.
#[derive(Clone)]
pub struct ToolEnvironment {
	pub view: Option<Rc<dyn ViewControls>>,
	pub frame: Option<Rc<dyn HostFrame>>,
	pub actions: Rc<dyn ActionRegistry>,
}

impl ToolEnvironment {
	pub fn new(actions: Rc<dyn ActionRegistry>) -> Self {
		Self {
			view: None,
			frame: None,
			actions,
		}
	}

	pub fn with_view(mut self, view: Rc<dyn ViewControls>) -> Self {
		self.view = Some(view);
		self
	}

	pub fn with_frame(mut self, frame: Rc<dyn HostFrame>) -> Self {
		self.frame = Some(frame);
		self
	}
}

impl Default for ToolEnvironment {
	fn default() -> Self {
		Self::new(Rc::new(ActionTable::new()))
	}
}

impl fmt::Debug for ToolEnvironment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ToolEnvironment")
			.field("view", &self.view.is_some())
			.field("frame", &self.frame.is_some())
			.finish_non_exhaustive()
	}
}
