//! The handle a running behavior uses to talk to its manager.

use std::future::Future;
use std::pin::Pin;
use std::rc::Weak;
use std::task::{Context, Poll};

use tracing::{error, trace};

use crate::context::{Delivery, FrameId};
use crate::env::{ContextMenu, MenuTrigger};
use crate::event::ToolEvent;
use crate::manager::{Inner, ToolManager};
use crate::predicate::EventPredicate;
use crate::tool::ToolId;

/// A handle to one run of a tool.
///
/// Holds only a weak reference to the manager, so a behavior that outlives
/// its manager observes shutdown instead of keeping it alive.
#[derive(Clone)]
pub struct ToolRun {
	inner: Weak<Inner>,
	tool: ToolId,
	frame: FrameId,
}

impl ToolRun {
	pub(crate) fn new(inner: Weak<Inner>, tool: ToolId, frame: FrameId) -> Self {
		Self { inner, tool, frame }
	}

	pub fn tool_id(&self) -> ToolId {
		self.tool
	}

	pub fn frame(&self) -> FrameId {
		self.frame
	}

	pub fn manager(&self) -> Option<ToolManager> {
		self.inner.upgrade().map(ToolManager::from_inner)
	}

	/// Suspends the run until an event matching `predicate` is delivered.
	///
	/// Resolves to `None` when the tool is being shut down; the run should
	/// then return.
	pub fn wait(&self, predicate: impl Into<EventPredicate>) -> Wait {
		Wait {
			run: self.clone(),
			predicate: Some(predicate.into()),
			stage: Stage::Fresh,
		}
	}

	pub fn is_shutting_down(&self) -> bool {
		self.manager().is_none_or(|manager| manager.is_tool_shutting_down(self.tool))
	}

	/// Queues `event` for processing after the current dispatch.
	pub fn post_event(&self, event: ToolEvent) {
		if let Some(manager) = self.manager() {
			manager.post_event(event);
		}
	}

	/// Runs the named action. See [`ToolManager::run_action_by_name`].
	pub fn run_action(&self, name: &str, immediate: bool) -> bool {
		self.manager()
			.is_some_and(|manager| manager.run_action_by_name(name, immediate, None, None))
	}

	/// Attaches a context menu to this run's frame.
	pub fn schedule_context_menu(&self, menu: ContextMenu, trigger: MenuTrigger) {
		if let Some(manager) = self.manager() {
			manager.schedule_frame_menu(self.tool, self.frame, menu, trigger);
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
	Fresh,
	Registered,
	Done,
}

/// Future returned by [`ToolRun::wait`].
#[must_use = "a wait does nothing unless awaited"]
pub struct Wait {
	run: ToolRun,
	predicate: Option<EventPredicate>,
	stage: Stage,
}

impl Future for Wait {
	type Output = Option<ToolEvent>;

	fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<ToolEvent>> {
		let this = &mut *self;
		let Some(inner) = this.run.inner.upgrade() else {
			this.stage = Stage::Done;
			return Poll::Ready(None);
		};
		let mut state = inner.state.borrow_mut();
		let Some(ctx) = state.tools.get_mut(&this.run.tool) else {
			this.stage = Stage::Done;
			return Poll::Ready(None);
		};
		let shutting_down = ctx.shutting_down;
		let tool = ctx.name.clone();
		let Some(frame) = ctx.frame_mut(this.run.frame) else {
			this.stage = Stage::Done;
			return Poll::Ready(None);
		};

		match this.stage {
			Stage::Fresh => {
				if shutting_down {
					this.stage = Stage::Done;
					return Poll::Ready(None);
				}
				if frame.pending_wait {
					error!(tool = %tool, frame = %this.run.frame, "wait while already waiting");
					this.stage = Stage::Done;
					return Poll::Ready(None);
				}
				frame.pending_wait = true;
				frame.wait_predicate = this.predicate.take().unwrap_or_default();
				frame.delivery = None;
				this.stage = Stage::Registered;
				trace!(tool = %tool, frame = %this.run.frame, "waiting");
				Poll::Pending
			}
			Stage::Registered => match frame.delivery.take() {
				Some(Delivery::Event(event)) => {
					this.stage = Stage::Done;
					Poll::Ready(Some(event))
				}
				Some(Delivery::Shutdown) => {
					this.stage = Stage::Done;
					Poll::Ready(None)
				}
				None => Poll::Pending,
			},
			Stage::Done => Poll::Ready(None),
		}
	}
}

impl Drop for Wait {
	fn drop(&mut self) {
		if self.stage != Stage::Registered {
			return;
		}
		let Some(inner) = self.run.inner.upgrade() else {
			return;
		};
		let Ok(mut state) = inner.state.try_borrow_mut() else {
			return;
		};
		if let Some(frame) = state
			.tools
			.get_mut(&self.run.tool)
			.and_then(|ctx| ctx.frame_mut(self.run.frame))
		{
			frame.clear_wait();
			frame.delivery = None;
		}
	}
}
