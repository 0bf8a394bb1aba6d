//! The default keymap.
//!
//! Motions are registered in every mode that takes commands, so they work
//! both standalone and behind the `<motion>` acceptor of composite actions
//! like `d<motion>`.

use loft_primitives::{ModeId, Result};
use loft_session::Direction;
use rustc_hash::FxHashMap;

use crate::actions::{Action, InsertTarget};
use crate::bindings::{BindingTarget, KeyBindingsTree};
use crate::motions::Motion;

fn bind_motions(tree: &mut KeyBindingsTree) -> Result<()> {
	use BindingTarget::Motion as M;
	tree.bind("h", M(Motion::Left))?;
	tree.bind("left", M(Motion::Left))?;
	tree.bind("l", M(Motion::Right))?;
	tree.bind("right", M(Motion::Right))?;
	tree.bind("0", M(Motion::Home))?;
	tree.bind("$", M(Motion::End))?;
	tree.bind("j", M(Motion::Down))?;
	tree.bind("down", M(Motion::Down))?;
	tree.bind("k", M(Motion::Up))?;
	tree.bind("up", M(Motion::Up))?;
	tree.bind("g g", M(Motion::FirstVisible))?;
	tree.bind("G", M(Motion::LastVisible))?;
	tree.bind("w", M(Motion::WordNext { big: false }))?;
	tree.bind("W", M(Motion::WordNext { big: true }))?;
	tree.bind("e", M(Motion::WordEnd { big: false }))?;
	tree.bind("E", M(Motion::WordEnd { big: true }))?;
	tree.bind("b", M(Motion::WordPrev { big: false }))?;
	tree.bind("B", M(Motion::WordPrev { big: true }))?;
	tree.bind("f", M(Motion::Find { backwards: false, until: false }))?;
	tree.bind("F", M(Motion::Find { backwards: true, until: false }))?;
	tree.bind("t", M(Motion::Find { backwards: false, until: true }))?;
	tree.bind("T", M(Motion::Find { backwards: true, until: true }))?;
	Ok(())
}

fn normal() -> Result<KeyBindingsTree> {
	use BindingTarget::Action as A;
	let mut tree = KeyBindingsTree::new(ModeId::Normal);
	bind_motions(&mut tree)?;

	tree.bind("i", A(Action::EnterInsert(InsertTarget::Here)))?;
	tree.bind("a", A(Action::EnterInsert(InsertTarget::After)))?;
	tree.bind("I", A(Action::EnterInsert(InsertTarget::Home)))?;
	tree.bind("A", A(Action::EnterInsert(InsertTarget::End)))?;
	tree.bind("o", A(Action::EnterInsert(InsertTarget::OpenBelow)))?;
	tree.bind("O", A(Action::EnterInsert(InsertTarget::OpenAbove)))?;

	tree.bind("x", A(Action::DeleteCharAfter))?;
	tree.bind("X", A(Action::DeleteCharBefore))?;
	tree.bind("D", A(Action::DeleteToEol))?;
	tree.bind("d d", A(Action::DeleteBlocks))?;
	tree.bind("d <motion>", A(Action::DeleteMotion))?;
	tree.bind("y y", A(Action::YankBlocks))?;
	tree.bind("y <motion>", A(Action::YankMotion))?;
	tree.bind("y c", A(Action::CloneBlocks))?;
	tree.bind("p", A(Action::Paste(Direction::After)))?;
	tree.bind("P", A(Action::Paste(Direction::Before)))?;
	tree.bind("J", A(Action::JoinBelow))?;

	tree.bind("z", A(Action::ToggleCollapse))?;
	tree.bind("tab", A(Action::Indent))?;
	tree.bind("shift+tab", A(Action::Outdent))?;
	tree.bind("ctrl+j", A(Action::SwapDown))?;
	tree.bind("ctrl+k", A(Action::SwapUp))?;

	tree.bind("u", A(Action::Undo))?;
	tree.bind("ctrl+r", A(Action::Redo))?;
	tree.bind("v", A(Action::EnterVisual))?;
	tree.bind("V", A(Action::EnterVisualLine))?;
	tree.bind("/", A(Action::StartSearch))?;

	tree.bind("q", A(Action::RecordMacro))?;
	tree.bind("@", A(Action::PlayMacro))?;
	tree.bind(".", A(Action::RepeatLast))?;

	tree.bind("enter", A(Action::ZoomIn))?;
	tree.bind("shift+enter", A(Action::ZoomOut))?;
	tree.bind("ctrl+home", A(Action::ZoomRoot))?;
	tree.bind("ctrl+o", A(Action::JumpPrevious))?;
	tree.bind("ctrl+i", A(Action::JumpNext))?;
	Ok(tree)
}

fn visual() -> Result<KeyBindingsTree> {
	use BindingTarget::Action as A;
	let mut tree = KeyBindingsTree::new(ModeId::Visual);
	bind_motions(&mut tree)?;
	tree.bind("d", A(Action::VisualDelete))?;
	tree.bind("x", A(Action::VisualDelete))?;
	tree.bind("y", A(Action::VisualYank))?;
	tree.bind("esc", A(Action::ExitToNormal))?;
	tree.bind("v", A(Action::ExitToNormal))?;
	tree.bind("V", A(Action::EnterVisualLine))?;
	Ok(tree)
}

fn visual_line() -> Result<KeyBindingsTree> {
	use BindingTarget::Action as A;
	let mut tree = KeyBindingsTree::new(ModeId::VisualLine);
	bind_motions(&mut tree)?;
	tree.bind("d", A(Action::VisualDelete))?;
	tree.bind("x", A(Action::VisualDelete))?;
	tree.bind("y", A(Action::VisualYank))?;
	tree.bind("esc", A(Action::ExitToNormal))?;
	tree.bind("V", A(Action::ExitToNormal))?;
	tree.bind("v", A(Action::EnterVisual))?;
	Ok(tree)
}

/// The built-in keymap; building it cannot conflict, so errors here mean a
/// bug in this module.
pub fn default_bindings() -> Result<FxHashMap<ModeId, KeyBindingsTree>> {
	let mut map = FxHashMap::default();
	for mode in ModeId::all() {
		let tree = match mode {
			ModeId::Normal => normal()?,
			ModeId::Visual => visual()?,
			ModeId::VisualLine => visual_line()?,
			// Raw-text modes take no commands and carry no trie.
			_ => continue,
		};
		map.insert(mode, tree);
	}
	Ok(map)
}
