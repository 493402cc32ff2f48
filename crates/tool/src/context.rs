//! Per-tool execution state: the current frame and the frames nested
//! beneath it.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use kite_primitives::BoxFutureLocal;

use crate::env::{ContextMenu, MenuTrigger, ViewSettings};
use crate::event::ToolEvent;
use crate::predicate::EventPredicate;
use crate::run::ToolRun;
use crate::tool::{Tool, ToolKind};


/// Identifies one run of a tool. Allocated from a manager-owned counter and
/// never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) u64);

impl fmt::Display for FrameId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "f{}", self.0)
	}
}

/// A behavior spawned when a transition matches.
pub type Behavior = Rc<dyn Fn(ToolRun, ToolEvent) -> BoxFutureLocal<'static, ()>>;

/// Observable state of a tool's current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
	/// No run in progress.
	Idle,
	/// A run is in progress and not blocked.
	Running,
	/// The run is suspended in [`ToolRun::wait`].
	Waiting,
}

pub(crate) enum Continuation {
	None,
	Parked(BoxFutureLocal<'static, ()>),
	/// Taken out of the frame while it is being polled.
	InFlight,
}

impl Continuation {
	pub(crate) fn is_some(&self) -> bool {
		!matches!(self, Self::None)
	}

	pub(crate) fn is_parked(&self) -> bool {
		matches!(self, Self::Parked(_))
	}
}

/// What a resumed wait observes.
pub(crate) enum Delivery {
	Event(ToolEvent),
	Shutdown,
}

#[derive(Clone)]
pub(crate) struct Transition {
	pub(crate) predicate: EventPredicate,
	pub(crate) behavior: Behavior,
}

pub(crate) struct ContextFrame {
	pub(crate) id: FrameId,
	pub(crate) idle: bool,
	pub(crate) pending_wait: bool,
	pub(crate) wait_predicate: EventPredicate,
	pub(crate) continuation: Continuation,
	pub(crate) delivery: Option<Delivery>,
	pub(crate) transitions: Vec<Transition>,
	pub(crate) initial_event: Option<ToolEvent>,
	pub(crate) wakeup_event: Option<ToolEvent>,
	pub(crate) view_settings: ViewSettings,
	pub(crate) menu: Option<Rc<ContextMenu>>,
	pub(crate) menu_trigger: MenuTrigger,
}

impl ContextFrame {
	pub(crate) fn new(id: FrameId) -> Self {
		Self {
			id,
			idle: true,
			pending_wait: false,
			wait_predicate: EventPredicate::new(),
			continuation: Continuation::None,
			delivery: None,
			transitions: Vec::new(),
			initial_event: None,
			wakeup_event: None,
			view_settings: ViewSettings::default(),
			menu: None,
			menu_trigger: MenuTrigger::Off,
		}
	}

	pub(crate) fn status(&self) -> ToolStatus {
		if self.pending_wait {
			ToolStatus::Waiting
		} else if !self.idle {
			ToolStatus::Running
		} else {
			ToolStatus::Idle
		}
	}

	/// Suspended in a wait with its continuation parked.
	pub(crate) fn is_waiting(&self) -> bool {
		self.pending_wait && self.continuation.is_parked()
	}

	pub(crate) fn clear_wait(&mut self) {
		self.pending_wait = false;
		self.wait_predicate.clear();
	}
}

pub(crate) struct ToolContext {
	pub(crate) tool: Rc<dyn Tool>,
	pub(crate) any: Rc<dyn Any>,
	pub(crate) name: Rc<str>,
	pub(crate) kind: ToolKind,
	pub(crate) frame: ContextFrame,
	/// Frames displaced by nested runs, innermost last.
	pub(crate) nested: Vec<ContextFrame>,
	/// Stays set across nested frames until the tool is idle again.
	pub(crate) shutting_down: bool,
}

impl ToolContext {
	pub(crate) fn new<T: Tool>(tool: Rc<T>, frame: FrameId) -> Self {
		let name: Rc<str> = Rc::from(tool.name());
		let kind = tool.kind();
		let any: Rc<dyn Any> = tool.clone();
		Self {
			tool,
			any,
			name,
			kind,
			frame: ContextFrame::new(frame),
			nested: Vec::new(),
			shutting_down: false,
		}
	}

	/// Saves the current frame and starts a fresh one that keeps the
	/// transitions and menu of the saved frame.
	pub(crate) fn push(&mut self, id: FrameId) {
		let mut fresh = ContextFrame::new(id);
		fresh.transitions = self.frame.transitions.clone();
		fresh.menu = self.frame.menu.clone();
		let saved = std::mem::replace(&mut self.frame, fresh);
		self.nested.push(saved);
	}

	/// Restores the most recently saved frame, dropping the current one.
	/// Returns the dropped frame, or `None` when nothing was saved.
	pub(crate) fn pop(&mut self) -> Option<ContextFrame> {
		let saved = self.nested.pop()?;
		Some(std::mem::replace(&mut self.frame, saved))
	}

	pub(crate) fn frame_mut(&mut self, id: FrameId) -> Option<&mut ContextFrame> {
		if self.frame.id == id {
			return Some(&mut self.frame);
		}
		self.nested.iter_mut().find(|frame| frame.id == id)
	}

	pub(crate) fn status(&self) -> ToolStatus {
		self.frame.status()
	}
}
