//! Event dispatch: the wake phase, the transition phase, and the drive loop
//! that polls tool continuations.

use std::rc::Rc;

use kite_primitives::{BoxFutureLocal, Hotkey, poll_once};
use smallvec::SmallVec;
use tracing::{debug, error, trace, trace_span, warn};

use super::ToolManager;
use crate::context::{Behavior, Continuation, Delivery, FrameId};
use crate::event::{EventAction, EventCategory, ToolEvent};
use crate::run::ToolRun;
use crate::tool::{ToolId, ToolKind};

type IdList = SmallVec<[ToolId; 8]>;

struct Outcome {
	handled: bool,
	/// Tools woken or started by the event.
	touched: IdList,
}

impl ToolManager {
	/// Processes one event from the host, then drains every event queued while
	/// it was handled. Returns whether any tool handled the event.
	pub fn process_event(&self, event: ToolEvent) -> bool {
		let depth = self.state().depth;
		if depth >= self.0.config.max_dispatch_depth {
			error!(depth, ?event, "dispatch depth exceeded, dropping event");
			return false;
		}

		let handled = self.process_one(&event);
		self.drain_queue();

		if let Some(frame) = &self.0.env.frame {
			frame.update_ui(&event);
		}
		handled
	}

	fn process_one(&self, event: &ToolEvent) -> bool {
		let depth = {
			let mut state = self.state_mut();
			state.depth += 1;
			state.depth
		};
		let _span = trace_span!("tool.dispatch", depth).entered();

		let handled = if self.dispatch_hotkey(event) {
			true
		} else {
			let outcome = self.dispatch_phases(event);
			let activated = self.dispatch_activation(event, &outcome.touched);
			self.dispatch_context_menu(event);
			outcome.handled || activated
		};

		self.state_mut().depth -= 1;
		handled
	}

	fn drain_queue(&self) {
		loop {
			let Some(event) = self.state_mut().queue.pop_front() else {
				break;
			};
			trace!(?event, "draining queued event");
			self.process_one(&event);
		}
	}

	/// Runs the action bound to a pressed hotkey.
	pub fn dispatch_hotkey(&self, event: &ToolEvent) -> bool {
		if !event.category().contains(EventCategory::KEYBOARD)
			|| !event.action_flags().contains(EventAction::KEY_PRESSED)
		{
			return false;
		}
		let Some(key) = event.key_code() else {
			return false;
		};
		let hotkey = Hotkey::new(key, event.modifiers());
		let Some(action) = self.0.env.actions.find_hotkey(hotkey) else {
			return false;
		};
		trace!(%hotkey, action = action.name(), "hotkey");
		self.run_action(&action, true, None, None)
	}

	/// Offers `event` to waiting tools, then to transition tables.
	pub(crate) fn dispatch_internal(&self, event: &ToolEvent) -> bool {
		self.dispatch_phases(event).handled
	}

	fn dispatch_phases(&self, event: &ToolEvent) -> Outcome {
		let mut handled = false;
		let mut touched = IdList::new();

		let active: IdList = self.state().active.iter().copied().collect();
		for id in active {
			let matched = {
				let state = self.state();
				if !state.is_active(id) {
					continue;
				}
				if event.is_menu_choice() && state.menu.owner.is_some_and(|owner| owner != id) {
					continue;
				}
				state
					.tools
					.get(&id)
					.is_some_and(|ctx| ctx.frame.is_waiting() && ctx.frame.wait_predicate.matches(event))
			};
			if !matched {
				continue;
			}

			trace!(tool_id = %id, "waking tool");
			event.claim_first_responder(id);
			event.reset_pass();
			touched.push(id);
			handled = true;

			self.set_active_state(Some(id));
			self.resume(id, Delivery::Event(event.clone()));

			if !event.passes() {
				return Outcome { handled, touched };
			}
		}

		// Activating nothing only stops tools; it never starts one.
		if event.is_activate() && event.command_name().is_none_or(str::is_empty) {
			return Outcome { handled, touched };
		}

		let registered: IdList = self.state().tools.keys().copied().collect();
		for id in registered {
			if touched.contains(&id) {
				continue;
			}
			let behavior = {
				let state = self.state();
				let Some(ctx) = state.tools.get(&id) else {
					continue;
				};
				if ctx.shutting_down {
					continue;
				}
				ctx.frame
					.transitions
					.iter()
					.find(|transition| transition.predicate.matches(event))
					.map(|transition| transition.behavior.clone())
			};
			let Some(behavior) = behavior else {
				continue;
			};

			trace!(tool_id = %id, "transition matched");
			event.claim_first_responder(id);
			handled = true;
			touched.push(id);
			self.start_run(id, &behavior, event);

			if !event.category().contains(EventCategory::MESSAGE) {
				break;
			}
		}

		Outcome { handled, touched }
	}

	/// Starts the tool named by an activation event that no tool took up, for
	/// instance because the previously running tool consumed it on its way out.
	fn dispatch_activation(&self, event: &ToolEvent, touched: &[ToolId]) -> bool {
		if !event.is_activate() {
			return false;
		}
		let Some(name) = event.command_name().filter(|name| !name.is_empty()) else {
			return false;
		};

		let target = {
			let state = self.state();
			let Some(&id) = state.names.get(name) else {
				return false;
			};
			if touched.contains(&id) || state.is_active(id) {
				return false;
			}
			state
				.tools
				.get(&id)
				.filter(|ctx| ctx.kind == ToolKind::Interactive && !ctx.shutting_down)
				.and_then(|ctx| {
					ctx.frame
						.transitions
						.iter()
						.find(|transition| transition.predicate.matches(event))
						.map(|transition| (id, transition.behavior.clone()))
				})
		};
		let Some((id, behavior)) = target else {
			return false;
		};

		debug!(tool = name, "activating tool");
		event.claim_first_responder(id);
		self.start_run(id, &behavior, event);
		true
	}

	/// Spawns a new run of `behavior`, nesting it above the tool's current run
	/// if there is one.
	fn start_run(&self, id: ToolId, behavior: &Behavior, event: &ToolEvent) {
		let live_settings = match self.view() {
			Some(view) if self.current_tool() == Some(id) => Some(view.settings()),
			_ => None,
		};

		let frame = {
			let mut state = self.state_mut();
			let frame = state.alloc_frame();
			let Some(ctx) = state.tools.get_mut(&id) else {
				return;
			};
			if ctx.frame.continuation.is_some() {
				let carried = live_settings.unwrap_or_else(|| ctx.frame.view_settings.clone());
				ctx.push(frame);
				ctx.frame.view_settings = carried;
				debug!(tool = %ctx.name, %frame, depth = ctx.nested.len(), "nested run");
			} else {
				ctx.frame.id = frame;
				debug!(tool = %ctx.name, %frame, "run started");
			}
			ctx.frame.idle = false;
			ctx.frame.clear_wait();
			ctx.frame.delivery = None;
			ctx.frame.continuation = Continuation::InFlight;
			ctx.frame.initial_event = Some(event.clone());
			state.bring_to_front(id);
			frame
		};

		self.set_active_state(Some(id));
		let run = ToolRun::new(Rc::downgrade(&self.0), id, frame);
		let fut = behavior(run, event.clone());
		self.drive(id, frame, fut);
	}

	/// Hands `delivery` to the tool's waiting frame and resumes it.
	pub(crate) fn resume(&self, id: ToolId, delivery: Delivery) -> bool {
		let (frame, fut) = {
			let mut state = self.state_mut();
			let Some(ctx) = state.tools.get_mut(&id) else {
				return false;
			};
			let frame = &mut ctx.frame;
			let fut = match std::mem::replace(&mut frame.continuation, Continuation::InFlight) {
				Continuation::Parked(fut) => fut,
				other => {
					frame.continuation = other;
					error!(tool = %ctx.name, frame = %ctx.frame.id, "resume without a parked continuation");
					return false;
				}
			};
			frame.clear_wait();
			if let Delivery::Event(event) = &delivery {
				frame.wakeup_event = Some(event.clone());
			}
			frame.delivery = Some(delivery);
			(frame.id, fut)
		};

		self.drive(id, frame, fut);
		true
	}

	/// Polls a continuation once, then parks it or finishes its frame.
	fn drive(&self, id: ToolId, frame: FrameId, mut fut: BoxFutureLocal<'static, ()>) {
		if poll_once(&mut fut).is_some() {
			drop(fut);
			self.finish_frame(id, frame);
			return;
		}

		let orphan = {
			let mut state = self.state_mut();
			match state.tools.get_mut(&id) {
				Some(ctx) => {
					let name = ctx.name.clone();
					match ctx.frame_mut(frame) {
						Some(slot) => {
							if !slot.pending_wait {
								warn!(tool = %name, %frame, "tool suspended without waiting");
							}
							slot.continuation = Continuation::Parked(fut);
							None
						}
						None => Some(fut),
					}
				}
				None => Some(fut),
			}
		};
		drop(orphan);
	}

	/// Ends a finished run: restores the frame beneath it, or returns the tool
	/// to idle and removes it from the active stack.
	fn finish_frame(&self, id: ToolId, frame: FrameId) {
		let dropped = {
			let mut state = self.state_mut();
			let Some(ctx) = state.tools.get_mut(&id) else {
				return;
			};

			let mut deactivated = false;
			let dropped = if ctx.frame.id == frame {
				ctx.frame.continuation = Continuation::None;
				ctx.frame.clear_wait();
				ctx.frame.delivery = None;
				match ctx.pop() {
					Some(done) => {
						debug!(tool = %ctx.name, %frame, resumed = %ctx.frame.id, "nested run finished");
						Some(done)
					}
					None => {
						ctx.frame.idle = true;
						ctx.shutting_down = false;
						deactivated = true;
						debug!(tool = %ctx.name, %frame, "run finished");
						None
					}
				}
			} else {
				let position = ctx.nested.iter().position(|saved| saved.id == frame);
				position.map(|index| ctx.nested.remove(index))
			};

			if deactivated {
				state.active.retain(|tool| *tool != id);
				if state.active_state == Some(id) {
					state.active_state = None;
				}
			}
			dropped
		};
		drop(dropped);
	}
}
