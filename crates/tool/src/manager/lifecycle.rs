//! Initialization, reset, and shutdown of registered tools.

use std::rc::Rc;

use tracing::{debug, warn};

use super::ToolManager;
use crate::context::Delivery;
use crate::tool::{ResetReason, Tool, ToolId, ToolRef};

impl ToolManager {
	fn tool_handles(&self) -> Vec<(ToolId, Rc<dyn Tool>)> {
		self.state()
			.tools
			.iter()
			.map(|(id, ctx)| (*id, ctx.tool.clone()))
			.collect()
	}

	/// Initializes every tool in registration order, unregistering those that
	/// fail, then resets the survivors with [`ResetReason::Run`].
	pub fn init_tools(&self) {
		for (id, tool) in self.tool_handles() {
			match tool.init(self) {
				Ok(()) => debug!(tool = tool.name(), tool_id = %id, "tool initialized"),
				Err(err) => {
					warn!(tool = tool.name(), tool_id = %id, error = %err, "tool failed to initialize, unregistering");
					self.unregister(id);
				}
			}
		}
		self.reset_tools(ResetReason::Run);
	}

	/// Resets every tool and re-arms its transitions. Except for redraws, the
	/// running tool is deactivated first.
	pub fn reset_tools(&self, reason: ResetReason) {
		if reason != ResetReason::Redraw {
			self.deactivate_tool();
		}
		for (id, tool) in self.tool_handles() {
			tool.reset(reason, self);
			self.reset_transitions(id);
		}
		debug!(?reason, "tools reset");
	}

	/// Signals every running tool to shut down and resumes each so it can
	/// observe the signal. Actions run afterwards are ignored.
	pub fn shutdown_all_tools(&self) {
		let snapshot = {
			let mut state = self.state_mut();
			state.shutting_down = true;
			let snapshot: Vec<ToolId> = state.active.iter().copied().collect();
			for id in &snapshot {
				if let Some(ctx) = state.tools.get_mut(id) {
					ctx.shutting_down = true;
				}
			}
			snapshot
		};
		debug!(tools = snapshot.len(), "shutting down tools");

		for id in snapshot {
			self.shutdown_tool(id);
		}
	}

	/// Signals one running tool to shut down. A waiting tool is resumed with
	/// an empty wakeup, once per nested frame, until it is idle or stops
	/// making progress. Returns `false` for unknown tools.
	pub fn shutdown_tool<'a>(&self, tool: impl Into<ToolRef<'a>>) -> bool {
		let id = match self.resolve(tool) {
			Ok(id) => id,
			Err(err) => {
				warn!(%err, "cannot shut down tool");
				return false;
			}
		};

		{
			let mut state = self.state_mut();
			if !state.is_active(id) {
				return true;
			}
			if let Some(ctx) = state.tools.get_mut(&id) {
				ctx.shutting_down = true;
			}
		}

		loop {
			let waiting = {
				let state = self.state();
				if !state.is_active(id) {
					break;
				}
				state
					.tools
					.get(&id)
					.filter(|ctx| ctx.frame.is_waiting())
					.map(|ctx| ctx.frame.id)
			};
			let Some(frame) = waiting else {
				break;
			};

			debug!(tool_id = %id, %frame, "delivering shutdown");
			self.set_active_state(Some(id));
			if !self.resume(id, Delivery::Shutdown) {
				break;
			}

			let stalled = self
				.state()
				.tools
				.get(&id)
				.is_some_and(|ctx| ctx.frame.id == frame && ctx.frame.is_waiting());
			if stalled {
				warn!(tool_id = %id, %frame, "tool kept waiting after shutdown");
				break;
			}
		}
		true
	}
}
