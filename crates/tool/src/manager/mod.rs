//! The tool manager: registry, dispatcher, and action invoker.

mod dispatch;
mod invoke;
mod lifecycle;
mod menu;
mod view;

use std::any::TypeId;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use indexmap::IndexMap;
use kite_config::ManagerConfig;
use kite_primitives::{BoxFutureLocal, Point};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::context::{Behavior, FrameId, ToolContext, ToolStatus, Transition};
use crate::env::{ContextMenu, MenuTrigger, ToolEnvironment, ViewControls};
use crate::error::ToolError;
use crate::event::ToolEvent;
use crate::predicate::EventPredicate;
use crate::run::ToolRun;
use crate::tool::{Tool, ToolId, ToolRef};

/// Owns every registered tool and drives their runs.
///
/// Cloning yields another handle to the same manager. All methods take
/// `&self` and may be called re-entrantly from tool behaviors and host
/// callbacks.
#[derive(Clone)]
pub struct ToolManager(Rc<Inner>);

pub(crate) struct Inner {
	pub(crate) state: RefCell<ManagerState>,
	env: ToolEnvironment,
	config: ManagerConfig,
}

#[derive(Debug, Default)]
pub(crate) struct MenuState {
	owner: Option<ToolId>,
	active: bool,
	cursor: Option<Point>,
}

pub(crate) struct ManagerState {
	pub(crate) tools: IndexMap<ToolId, ToolContext>,
	names: FxHashMap<Rc<str>, ToolId>,
	types: FxHashMap<TypeId, ToolId>,
	next_tool_id: u32,
	next_frame_id: u64,
	/// Running tools, highest dispatch priority first.
	active: VecDeque<ToolId>,
	queue: VecDeque<ToolEvent>,
	/// Tool whose view settings are applied to the view.
	active_state: Option<ToolId>,
	menu: MenuState,
	depth: usize,
	shutting_down: bool,
}

impl ManagerState {
	fn new() -> Self {
		Self {
			tools: IndexMap::new(),
			names: FxHashMap::default(),
			types: FxHashMap::default(),
			next_tool_id: 1,
			next_frame_id: 1,
			active: VecDeque::new(),
			queue: VecDeque::new(),
			active_state: None,
			menu: MenuState::default(),
			depth: 0,
			shutting_down: false,
		}
	}

	fn alloc_frame(&mut self) -> FrameId {
		let id = FrameId(self.next_frame_id);
		self.next_frame_id += 1;
		id
	}

	fn resolve(&self, tool: ToolRef<'_>) -> Option<ToolId> {
		match tool {
			ToolRef::Id(id) => self.tools.contains_key(&id).then_some(id),
			ToolRef::Name(name) => self.names.get(name).copied(),
		}
	}

	/// Moves `id` to the front of the active stack, adding it if absent.
	fn bring_to_front(&mut self, id: ToolId) {
		self.active.retain(|t| *t != id);
		self.active.push_front(id);
	}

	fn is_active(&self, id: ToolId) -> bool {
		self.active.contains(&id)
	}
}

impl ToolManager {
	pub fn new(env: ToolEnvironment) -> Self {
		Self::with_config(ManagerConfig::default(), env)
	}

	pub fn with_config(config: ManagerConfig, env: ToolEnvironment) -> Self {
		Self(Rc::new(Inner {
			state: RefCell::new(ManagerState::new()),
			env,
			config,
		}))
	}

	pub(crate) fn from_inner(inner: Rc<Inner>) -> Self {
		Self(inner)
	}

	pub(crate) fn state(&self) -> Ref<'_, ManagerState> {
		self.0.state.borrow()
	}

	pub(crate) fn state_mut(&self) -> RefMut<'_, ManagerState> {
		self.0.state.borrow_mut()
	}

	pub(crate) fn view(&self) -> Option<&Rc<dyn ViewControls>> {
		self.0.env.view.as_ref()
	}

	pub fn config(&self) -> &ManagerConfig {
		&self.0.config
	}

	pub fn environment(&self) -> &ToolEnvironment {
		&self.0.env
	}

	/// Registers `tool` and returns its id.
	///
	/// Names and concrete types must be unique. The tool is not initialized;
	/// see [`Self::init_tools`].
	pub fn register_tool<T: Tool>(&self, tool: T) -> Result<ToolId, ToolError> {
		let mut state = self.state_mut();
		if state.names.contains_key(tool.name()) {
			return Err(ToolError::DuplicateName(tool.name().to_owned()));
		}
		let type_id = TypeId::of::<T>();
		if let Some(existing) = state.types.get(&type_id).and_then(|id| state.tools.get(id)) {
			return Err(ToolError::DuplicateType {
				type_name: std::any::type_name::<T>(),
				existing: existing.name.to_string(),
			});
		}

		let id = ToolId(state.next_tool_id);
		state.next_tool_id += 1;
		let frame = state.alloc_frame();
		let ctx = ToolContext::new(Rc::new(tool), frame);
		debug!(tool = %ctx.name, tool_id = %id, "registered tool");
		state.names.insert(ctx.name.clone(), id);
		state.types.insert(type_id, id);
		state.tools.insert(id, ctx);
		Ok(id)
	}

	/// Looks a tool up by id or name.
	pub fn resolve<'a>(&self, tool: impl Into<ToolRef<'a>>) -> Result<ToolId, ToolError> {
		let tool = tool.into();
		self.state()
			.resolve(tool)
			.ok_or_else(|| ToolError::UnknownTool(tool.to_string()))
	}

	pub fn tool_id(&self, name: &str) -> Option<ToolId> {
		self.state().names.get(name).copied()
	}

	pub fn find_tool<'a>(&self, tool: impl Into<ToolRef<'a>>) -> Option<Rc<dyn Tool>> {
		let state = self.state();
		let id = state.resolve(tool.into())?;
		state.tools.get(&id).map(|ctx| ctx.tool.clone())
	}

	pub fn tool_name(&self, id: ToolId) -> Option<Rc<str>> {
		self.state().tools.get(&id).map(|ctx| ctx.name.clone())
	}

	/// The registered tool of concrete type `T`.
	pub fn get_tool<T: Tool>(&self) -> Option<Rc<T>> {
		let state = self.state();
		let id = state.types.get(&TypeId::of::<T>())?;
		let any = state.tools.get(id)?.any.clone();
		any.downcast::<T>().ok()
	}

	/// Registered tools in registration order.
	pub fn tools(&self) -> Vec<ToolId> {
		self.state().tools.keys().copied().collect()
	}

	pub fn is_tool_active(&self, id: ToolId) -> bool {
		self.state().is_active(id)
	}

	/// The active stack, front first.
	pub fn active_tools(&self) -> Vec<ToolId> {
		self.state().active.iter().copied().collect()
	}

	/// The tool whose view settings are currently applied.
	pub fn current_tool(&self) -> Option<ToolId> {
		self.state().active_state
	}

	pub fn tool_status(&self, id: ToolId) -> Option<ToolStatus> {
		self.state().tools.get(&id).map(ToolContext::status)
	}

	/// Number of frames saved beneath the tool's current frame.
	pub fn nested_depth(&self, id: ToolId) -> usize {
		self.state().tools.get(&id).map_or(0, |ctx| ctx.nested.len())
	}

	/// The event that started the tool's current frame.
	pub fn initial_event(&self, id: ToolId) -> Option<ToolEvent> {
		self.state().tools.get(&id)?.frame.initial_event.clone()
	}

	/// The last event that woke the tool's current frame.
	pub fn wakeup_event(&self, id: ToolId) -> Option<ToolEvent> {
		self.state().tools.get(&id)?.frame.wakeup_event.clone()
	}

	/// Owner of the context menu being displayed.
	pub fn menu_owner(&self) -> Option<ToolId> {
		self.state().menu.owner
	}

	/// Cursor position recorded when the last context menu opened.
	pub fn menu_cursor(&self) -> Option<Point> {
		self.state().menu.cursor
	}

	pub fn cursor_position(&self) -> Option<Point> {
		self.view().map(|view| view.cursor_position())
	}

	/// Set once [`Self::shutdown_all_tools`] has started.
	pub fn is_shutting_down(&self) -> bool {
		self.state().shutting_down
	}

	pub fn is_tool_shutting_down(&self, id: ToolId) -> bool {
		let state = self.state();
		state.tools.get(&id).is_none_or(|ctx| ctx.shutting_down)
	}

	/// Number of posted events not yet processed.
	pub fn queued_events(&self) -> usize {
		self.state().queue.len()
	}

	/// Adds a transition to the tool's current frame. Transitions are tested
	/// in the order they were scheduled.
	pub fn schedule_next_state<F, Fut>(&self, tool: ToolId, predicate: impl Into<EventPredicate>, behavior: F)
	where
		F: Fn(ToolRun, ToolEvent) -> Fut + 'static,
		Fut: Future<Output = ()> + 'static,
	{
		let boxed: Behavior =
			Rc::new(move |run: ToolRun, event: ToolEvent| -> BoxFutureLocal<'static, ()> { Box::pin(behavior(run, event)) });
		let mut state = self.state_mut();
		match state.tools.get_mut(&tool) {
			Some(ctx) => ctx.frame.transitions.push(Transition {
				predicate: predicate.into(),
				behavior: boxed,
			}),
			None => warn!(tool_id = %tool, "transition scheduled for unknown tool"),
		}
	}

	pub fn clear_transitions(&self, tool: ToolId) {
		let cleared = self
			.state_mut()
			.tools
			.get_mut(&tool)
			.map(|ctx| std::mem::take(&mut ctx.frame.transitions));
		drop(cleared);
	}

	/// Clears the tool's transitions and lets it register them again.
	pub(crate) fn reset_transitions(&self, id: ToolId) {
		self.clear_transitions(id);
		let Some(tool) = self.state().tools.get(&id).map(|ctx| ctx.tool.clone()) else {
			return;
		};
		tool.set_transitions(self, id);
	}

	/// Attaches a context menu to the tool's current frame.
	pub fn schedule_context_menu(&self, tool: ToolId, menu: ContextMenu, trigger: MenuTrigger) {
		let frame = self.state().tools.get(&tool).map(|ctx| ctx.frame.id);
		match frame {
			Some(frame) => self.schedule_frame_menu(tool, frame, menu, trigger),
			None => warn!(tool_id = %tool, "context menu scheduled for unknown tool"),
		}
	}

	pub(crate) fn schedule_frame_menu(&self, tool: ToolId, frame: FrameId, menu: ContextMenu, trigger: MenuTrigger) {
		let mut state = self.state_mut();
		if let Some(frame) = state.tools.get_mut(&tool).and_then(|ctx| ctx.frame_mut(frame)) {
			frame.menu = Some(Rc::new(menu));
			frame.menu_trigger = trigger;
		}
	}

	/// Queues `event` to be processed once the current dispatch finishes, or
	/// by the next [`Self::process_event`] call.
	pub fn post_event(&self, event: ToolEvent) {
		self.state_mut().queue.push_back(event.detached());
	}

	/// Removes a tool and everything it was running.
	pub(crate) fn unregister(&self, id: ToolId) {
		let removed = {
			let mut state = self.state_mut();
			let Some(ctx) = state.tools.shift_remove(&id) else {
				return;
			};
			state.names.remove(&ctx.name);
			state.types.retain(|_, tool| *tool != id);
			state.active.retain(|tool| *tool != id);
			if state.active_state == Some(id) {
				state.active_state = None;
			}
			debug!(tool = %ctx.name, tool_id = %id, "unregistered tool");
			ctx
		};
		drop(removed);
	}
}
