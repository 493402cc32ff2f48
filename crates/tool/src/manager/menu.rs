//! Context menus scheduled by running tools.
//!
//! The host shows the popup modally and may call back into
//! [`ToolManager::process_event`] while it is open. Menu events never open a
//! menu and only one menu is shown at a time, so the re-entry cannot recurse.

use std::any::Any;
use std::rc::Rc;

use kite_primitives::{MouseButtons, Point};
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::{MenuState, ToolManager};
use crate::context::FrameId;
use crate::env::{ContextMenu, MenuTrigger};
use crate::event::{EventCategory, ToolEvent};
use crate::predicate::EventPredicate;
use crate::tool::ToolId;

impl ToolManager {
	/// Shows the context menu of the first running tool whose trigger fires
	/// for `event`.
	pub(crate) fn dispatch_context_menu(&self, event: &ToolEvent) {
		if event.category().intersects(EventCategory::MENU) {
			return;
		}

		let target = {
			let mut state = self.state_mut();
			if state.menu.active {
				return;
			}

			let active: SmallVec<[ToolId; 8]> = state.active.iter().copied().collect();
			let mut target = None;
			for id in active {
				let Some(ctx) = state.tools.get_mut(&id) else {
					continue;
				};
				let frame = &mut ctx.frame;
				match frame.menu_trigger {
					MenuTrigger::Off => continue,
					MenuTrigger::Button if !event.is_click(MouseButtons::RIGHT) => break,
					MenuTrigger::Button | MenuTrigger::Now => {}
				}
				let Some(menu) = frame.menu.clone() else {
					continue;
				};

				if frame.continuation.is_parked() {
					frame.wait_predicate = EventPredicate::any();
				}
				if frame.menu_trigger == MenuTrigger::Now {
					frame.menu_trigger = MenuTrigger::Off;
				}
				target = Some((id, menu));
				break;
			}
			target
		};

		if let Some((owner, menu)) = target {
			self.show_context_menu(owner, menu);
		}
	}

	fn show_context_menu(&self, owner: ToolId, menu: Rc<ContextMenu>) {
		let view = self.view().cloned();
		let cursor = view.as_ref().map(|view| view.cursor_position());

		let saved: Vec<(ToolId, FrameId, Option<Point>)> = {
			let mut state = self.state_mut();
			state.menu = MenuState {
				owner: Some(owner),
				active: true,
				cursor,
			};
			state
				.tools
				.iter()
				.map(|(id, ctx)| (*id, ctx.frame.id, ctx.frame.view_settings.forced_cursor))
				.collect()
		};
		if let (Some(view), Some(cursor)) = (&view, cursor) {
			view.force_cursor_position(Some(cursor));
		}

		let popup = ContextMenu::clone(&menu);
		let choice = match &self.0.env.frame {
			Some(frame) => frame.popup_menu(self, &popup),
			None => {
				warn!(tool_id = %owner, "no host frame to show a context menu");
				None
			}
		};
		debug!(tool_id = %owner, ?choice, "context menu closed");

		let param: Rc<dyn Any> = menu;
		if let Some(id) = choice {
			let mut event = ToolEvent::menu_choice(id).with_param(param.clone());
			if let Some(action) = popup.item(id).and_then(|item| item.action.as_deref()) {
				event = event.with_command_name(action);
			}
			self.dispatch_internal(&event);
		}
		self.dispatch_internal(&ToolEvent::menu_closed().with_param(param));

		let forced = {
			let mut state = self.state_mut();
			for (id, frame, forced) in saved {
				if let Some(slot) = state.tools.get_mut(&id).and_then(|ctx| ctx.frame_mut(frame)) {
					slot.view_settings.forced_cursor = forced;
				}
			}
			state.menu.owner = None;
			state.menu.active = false;
			state
				.active_state
				.and_then(|id| state.tools.get(&id))
				.and_then(|ctx| ctx.frame.view_settings.forced_cursor)
		};
		if let Some(view) = &view {
			view.force_cursor_position(forced);
		}
	}
}
