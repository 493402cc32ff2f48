//! Hand-over of view settings between tools.

use tracing::trace;

use super::ToolManager;
use crate::tool::ToolId;

impl ToolManager {
	/// Makes `next` the tool owning the view: the settings applied to the view
	/// are saved into the previous owner's frame, then `next`'s are applied.
	pub(crate) fn set_active_state(&self, next: Option<ToolId>) {
		let previous = {
			let state = self.state();
			if state.active_state == next {
				return;
			}
			state.active_state
		};
		let view = self.view().cloned();

		if let (Some(view), Some(previous)) = (&view, previous) {
			let saved = view.settings();
			if let Some(ctx) = self.state_mut().tools.get_mut(&previous) {
				ctx.frame.view_settings = saved;
			}
		}

		let settings = {
			let mut state = self.state_mut();
			state.active_state = next;
			next.and_then(|id| state.tools.get(&id)).map(|ctx| ctx.frame.view_settings.clone())
		};
		trace!(?previous, ?next, "active state changed");

		if let (Some(view), Some(settings)) = (&view, settings) {
			view.apply_settings(&settings);
		}
	}
}
