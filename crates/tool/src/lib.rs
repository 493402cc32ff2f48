//! Cooperative dispatch and scheduling for interactive editing tools.
//!
//! Tools register transitions with the [`ToolManager`]. A matching event
//! spawns a behavior, a local future that suspends on [`ToolRun::wait`] until
//! the manager delivers an event its predicate accepts. The host feeds input
//! through [`ToolManager::process_event`]; everything runs on one thread and
//! switches only at waits.
//!
//! ```
//! use kite_tool::{EventMatcher, Tool, ToolEnvironment, ToolEvent, ToolId, ToolManager};
//!
//! struct Measure;
//!
//! impl Tool for Measure {
//! 	fn name(&self) -> &str {
//! 		"measure"
//! 	}
//!
//! 	fn set_transitions(&self, manager: &ToolManager, id: ToolId) {
//! 		manager.schedule_next_state(id, EventMatcher::activate("measure"), |run, _| async move {
//! 			while let Some(event) = run.wait(EventMatcher::any()).await {
//! 				if event.is_cancel() {
//! 					break;
//! 				}
//! 			}
//! 		});
//! 	}
//! }
//!
//! let manager = ToolManager::new(ToolEnvironment::default());
//! let id = manager.register_tool(Measure).unwrap();
//! manager.init_tools();
//!
//! assert!(manager.invoke_tool("measure"));
//! assert_eq!(manager.active_tools(), vec![id]);
//! manager.process_event(ToolEvent::cancel());
//! assert!(manager.active_tools().is_empty());
//! ```

mod action;
mod context;
mod env;
mod error;
mod event;
mod manager;
mod predicate;
mod run;
mod tool;

pub use action::{ActionFlags, ActionRegistry, ActionTable, ToolAction};
pub use context::{Behavior, FrameId, ToolStatus};
pub use env::{ContextMenu, HostFrame, MenuItem, MenuTrigger, ToolEnvironment, ViewControls, ViewSettings};
pub use error::{ActionError, ToolError};
pub use event::{CommitRef, EventAction, EventCategory, EventParam, SyncHandle, SyncState, ToolEvent};
pub use manager::ToolManager;
pub use predicate::{EventMatcher, EventPredicate};
pub use run::{ToolRun, Wait};
pub use tool::{ResetReason, Tool, ToolId, ToolKind, ToolRef};
