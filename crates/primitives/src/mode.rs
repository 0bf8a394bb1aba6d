//! Modal state identifiers and the per-mode behavior table.

/// The closed set of modal states.
///
/// Exactly one mode is active in a session at a time. Per-mode behavior is a
/// record resolved by [`ModeId::behavior`]; adding behavior means editing
/// that table, not registering strings at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModeId {
	#[default]
	Normal,
	Insert,
	Visual,
	VisualLine,
	Search,
	Settings,
}

/// Static behavior of one mode.
#[derive(Debug, Clone, Copy)]
pub struct ModeBehavior {
	/// Cursor renders between characters and may rest one past line end.
	pub cursor_between: bool,
	/// Printable keys are text (or query input), not commands.
	pub raw_text: bool,
	/// A leading digit run is parsed as a repeat count.
	pub uses_counts: bool,
}

impl ModeId {
	/// Display name of the mode.
	pub fn name(self) -> &'static str {
		match self {
			ModeId::Normal => "NORMAL",
			ModeId::Insert => "INSERT",
			ModeId::Visual => "VISUAL",
			ModeId::VisualLine => "VISUAL LINE",
			ModeId::Search => "SEARCH",
			ModeId::Settings => "SETTINGS",
		}
	}

	/// All modes, for building the per-mode binding tries.
	pub fn all() -> [ModeId; 6] {
		[
			ModeId::Normal,
			ModeId::Insert,
			ModeId::Visual,
			ModeId::VisualLine,
			ModeId::Search,
			ModeId::Settings,
		]
	}

	/// The mode's behavior record.
	pub fn behavior(self) -> ModeBehavior {
		match self {
			ModeId::Normal => ModeBehavior {
				cursor_between: false,
				raw_text: false,
				uses_counts: true,
			},
			ModeId::Insert => ModeBehavior {
				cursor_between: true,
				raw_text: true,
				uses_counts: false,
			},
			ModeId::Visual | ModeId::VisualLine => ModeBehavior {
				cursor_between: false,
				raw_text: false,
				uses_counts: true,
			},
			ModeId::Search => ModeBehavior {
				cursor_between: true,
				raw_text: true,
				uses_counts: false,
			},
			ModeId::Settings => ModeBehavior {
				cursor_between: false,
				raw_text: true,
				uses_counts: false,
			},
		}
	}
}
