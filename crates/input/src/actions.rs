//! The closed action set and its effect on the repeat sequence.
//!
//! Actions are resolved from the binding tries and executed by the key
//! handler; the session does the actual editing. Execution lives in the
//! handler because macros, `.` and motion pairing need handler state.

use loft_session::Direction;

/// Where entering insert mode places the cursor first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertTarget {
	/// `i`: before the character under the cursor.
	Here,
	/// `a`: after it.
	After,
	/// `I`: start of line.
	Home,
	/// `A`: end of line.
	End,
	/// `o`: a fresh row below.
	OpenBelow,
	/// `O`: a fresh row above.
	OpenAbove,
}

/// One executable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	EnterInsert(InsertTarget),
	ExitToNormal,
	EnterVisual,
	EnterVisualLine,
	StartSearch,
	/// `d<motion>`: paired with a resolved motion at dispatch time.
	DeleteMotion,
	/// `y<motion>`.
	YankMotion,
	DeleteBlocks,
	YankBlocks,
	CloneBlocks,
	DeleteCharAfter,
	DeleteCharBefore,
	DeleteToEol,
	Paste(Direction),
	JoinBelow,
	ToggleCollapse,
	Indent,
	Outdent,
	SwapDown,
	SwapUp,
	Undo,
	Redo,
	ZoomIn,
	ZoomOut,
	ZoomRoot,
	JumpPrevious,
	JumpNext,
	RecordMacro,
	PlayMacro,
	RepeatLast,
	/// Visual-mode delete: character span or block range per selection.
	VisualDelete,
	VisualYank,
}

/// How a completed command affects the `.`-replay sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
	/// Commit the consumed keys as the repeatable sequence.
	Save,
	/// Discard the consumed keys; the command is not repeatable.
	Drop,
	/// Keep accumulating; the command continues (mode entries, whose burst
	/// ends later, e.g. insert until escape).
	Defer,
}

impl Action {
	/// Whether this action must be paired with a resolved motion.
	pub fn accepts_motion(&self) -> bool {
		matches!(self, Action::DeleteMotion | Action::YankMotion)
	}

	pub fn repeat(&self) -> Repeat {
		match self {
			Action::DeleteMotion
			| Action::DeleteBlocks
			| Action::DeleteCharAfter
			| Action::DeleteCharBefore
			| Action::DeleteToEol
			| Action::Paste(_)
			| Action::JoinBelow
			| Action::ToggleCollapse
			| Action::Indent
			| Action::Outdent
			| Action::SwapDown
			| Action::SwapUp
			| Action::VisualDelete => Repeat::Save,
			Action::EnterInsert(_)
			| Action::EnterVisual
			| Action::EnterVisualLine
			| Action::StartSearch => Repeat::Defer,
			Action::ExitToNormal
			| Action::YankMotion
			| Action::YankBlocks
			| Action::CloneBlocks
			| Action::Undo
			| Action::Redo
			| Action::ZoomIn
			| Action::ZoomOut
			| Action::ZoomRoot
			| Action::JumpPrevious
			| Action::JumpNext
			| Action::RecordMacro
			| Action::PlayMacro
			| Action::RepeatLast
			| Action::VisualYank => Repeat::Drop,
		}
	}
}
