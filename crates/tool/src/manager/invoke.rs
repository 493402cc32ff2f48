//! Actions and tool activation.

use tracing::{debug, warn};

use super::ToolManager;
use crate::action::ToolAction;
use crate::error::ToolError;
use crate::event::{CommitRef, EventCategory, EventParam, SyncHandle, SyncState, ToolEvent};
use crate::tool::{ResetReason, ToolId, ToolKind, ToolRef};

impl ToolManager {
	/// Runs `action`.
	///
	/// Deferred runs queue the event and return `false`. Immediate runs
	/// dispatch inline and return whether the event was handled. An immediate
	/// run with a `commit` attaches a completion flag and keeps yielding to the
	/// host while a tool holds it at [`SyncState::Running`]; it succeeds unless
	/// the flag ends up [`SyncState::Cancelled`].
	pub fn run_action(
		&self,
		action: &ToolAction,
		immediate: bool,
		param: Option<EventParam>,
		commit: Option<CommitRef>,
	) -> bool {
		if self.is_shutting_down() {
			return true;
		}

		let mut event = action.make_event();
		if event.category().contains(EventCategory::COMMAND)
			&& let Some(cursor) = self.cursor_position()
		{
			event = event.with_position(cursor);
		}
		if let Some(param) = param {
			event = event.with_param(param);
		}

		if !immediate {
			if let Some(commit) = commit {
				warn!(action = action.name(), "deferred action carries a commit that may not outlive it");
				event = event.with_commit(commit);
			}
			self.post_event(event);
			return false;
		}

		let previous = self.current_tool();
		let handled = match commit {
			None => self.process_event(event),
			Some(commit) => {
				let sync = SyncHandle::new();
				self.process_event(event.with_commit(commit).with_sync(sync.clone()));
				self.wait_for_sync(action, &sync);
				sync.state() != SyncState::Cancelled
			}
		};
		self.set_active_state(previous);
		handled
	}

	/// Runs the action registered under `name`. Unknown names do nothing and
	/// return `false`.
	pub fn run_action_by_name(
		&self,
		name: &str,
		immediate: bool,
		param: Option<EventParam>,
		commit: Option<CommitRef>,
	) -> bool {
		match self.0.env.actions.find_action(name) {
			Some(action) => self.run_action(&action, immediate, param, commit),
			None => {
				warn!(action = name, "unknown action");
				false
			}
		}
	}

	fn wait_for_sync(&self, action: &ToolAction, sync: &SyncHandle) {
		let interval = self.0.config.sync_poll_interval;
		while sync.state() == SyncState::Running {
			let Some(frame) = &self.0.env.frame else {
				warn!(action = action.name(), "no host frame to yield to, abandoning synchronous wait");
				return;
			};
			frame.yield_to_ui(self);
			std::thread::sleep(interval);
		}
	}

	/// Activates an interactive tool as if picked from a toolbox.
	///
	/// A tool that is already running is moved to the front of the active
	/// stack. Returns `false` for unknown and non-interactive tools.
	pub fn invoke_tool<'a>(&self, tool: impl Into<ToolRef<'a>>) -> bool {
		let id = match self.activation_target(tool.into()) {
			Ok(id) => id,
			Err(err) => {
				warn!(%err, "cannot invoke tool");
				return false;
			}
		};

		if self.is_tool_active(id) {
			self.state_mut().bring_to_front(id);
			debug!(tool_id = %id, "tool already active, moved to front");
			return true;
		}

		let Some((handle, name)) = self
			.state()
			.tools
			.get(&id)
			.map(|ctx| (ctx.tool.clone(), ctx.name.clone()))
		else {
			return false;
		};
		handle.reset(ResetReason::Run, self);
		self.reset_transitions(id);

		let mut event = ToolEvent::activate(&name);
		if let Some(cursor) = self.cursor_position() {
			event = event.with_position(cursor);
		}
		self.process_event(event);
		true
	}

	fn activation_target(&self, tool: ToolRef<'_>) -> Result<ToolId, ToolError> {
		let id = self.resolve(tool)?;
		let state = self.state();
		match state.tools.get(&id) {
			Some(ctx) if ctx.kind == ToolKind::Interactive => Ok(id),
			Some(ctx) => Err(ToolError::NotInteractive(ctx.name.to_string())),
			None => Err(ToolError::UnknownTool(tool.to_string())),
		}
	}

	/// Sends a cancellation to the running tools.
	pub fn cancel_tool(&self) -> bool {
		self.process_event(ToolEvent::cancel())
	}

	/// Asks the running tools to finish by activating nothing.
	pub fn deactivate_tool(&self) -> bool {
		self.process_event(ToolEvent::activate(""))
	}
}
