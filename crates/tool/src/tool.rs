//! The tool trait and the identifiers the manager hands out.

use std::fmt;

use crate::manager::ToolManager;

/// Registry-assigned tool identifier, unique per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolId(pub(crate) u32);

impl ToolId {
	pub fn get(self) -> u32 {
		self.0
	}
}

impl fmt::Display for ToolId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Whether a tool can be activated by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
	/// Activated from a toolbox or activation action; owns view settings.
	#[default]
	Interactive,
	/// Cannot be invoked; runs only through its transitions.
	NonInteractive,
}

/// Why [`Tool::reset`] is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetReason {
	/// The tool is about to be invoked.
	Run,
	/// The document model was reloaded.
	ModelReload,
	/// The manager is shutting down.
	ShutDown,
	/// The view is being redrawn; active tools are left running.
	Redraw,
}

/// A unit of editing behavior driven by the [`ToolManager`].
///
/// Tools hold no reference to their runs. Behaviors are registered with
/// [`ToolManager::schedule_next_state`] from [`Tool::set_transitions`] and run as
/// local futures that suspend on [`ToolRun::wait`](crate::ToolRun::wait).
///
/// State a tool mutates from its behaviors must live behind interior
/// mutability; the manager only ever hands out shared references.
pub trait Tool: 'static {
	/// Unique tool name, also used as the activation command name.
	fn name(&self) -> &str;

	fn kind(&self) -> ToolKind {
		ToolKind::Interactive
	}

	/// One-time initialization. A failing tool is unregistered.
	fn init(&self, _manager: &ToolManager) -> anyhow::Result<()> {
		Ok(())
	}

	/// Returns the tool to a known state.
	fn reset(&self, _reason: ResetReason, _manager: &ToolManager) {}

	/// Registers the tool's transitions. Called after every reset, once the
	/// previous transitions have been cleared.
	fn set_transitions(&self, _manager: &ToolManager, _id: ToolId) {}
}

/// A tool addressed by id or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRef<'a> {
	Id(ToolId),
	Name(&'a str),
}

impl From<ToolId> for ToolRef<'_> {
	fn from(id: ToolId) -> Self {
		Self::Id(id)
	}
}

impl<'a> From<&'a str> for ToolRef<'a> {
	fn from(name: &'a str) -> Self {
		Self::Name(name)
	}
}

impl<'a> From<&'a String> for ToolRef<'a> {
	fn from(name: &'a String) -> Self {
		Self::Name(name)
	}
}

impl fmt::Display for ToolRef<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Id(id) => id.fmt(f),
			Self::Name(name) => f.write_str(name),
		}
	}
}
