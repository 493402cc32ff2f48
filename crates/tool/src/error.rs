//! Error types for tool and action registration.

use kite_primitives::Hotkey;
use thiserror::Error;

/// Errors raised while registering or looking up tools.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
	/// Another tool already uses this name.
	#[error("a tool named '{0}' is already registered")]
	DuplicateName(String),

	/// Another tool of the same concrete type is already registered.
	#[error("a tool of type {type_name} is already registered (as '{existing}')")]
	DuplicateType {
		/// Rust type name of the rejected tool.
		type_name: &'static str,
		/// Name of the tool that holds the type.
		existing: String,
	},

	/// No tool matches the given id or name.
	#[error("unknown tool '{0}'")]
	UnknownTool(String),

	/// The tool cannot be invoked because it is not interactive.
	#[error("tool '{0}' is not interactive")]
	NotInteractive(String),
}

/// Errors raised while building an action table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
	/// Another action already uses this name.
	#[error("an action named '{0}' is already registered")]
	DuplicateName(String),

	/// The default hotkey is already bound to another action.
	#[error("hotkey {hotkey} of '{action}' is already bound to '{existing}'")]
	HotkeyConflict {
		hotkey: Hotkey,
		action: String,
		existing: String,
	},

	/// No action matches the given name.
	#[error("unknown action '{0}'")]
	UnknownAction(String),
}
