//! Session-level behavior: undo/redo checkpoints, block delete and paste,
//! visual-line selection resolution, and structural edits.

use loft_document::{Document, Path};
use loft_primitives::{ModeId, Row, line_from_str};
use loft_session::{Direction, Session};
use loft_store::{InMemoryBackend, Store};
use pretty_assertions::assert_eq;

async fn session_with(texts: &[&str]) -> Session {
	let mut doc = Document::new(Store::new(Box::new(InMemoryBackend::new()), "test"));
	for (i, text) in texts.iter().enumerate() {
		let row = doc.new_row().await.unwrap();
		doc.set_line(row, line_from_str(text)).await.unwrap();
		doc.attach(row, Row::ROOT, i).await.unwrap();
	}
	Session::new(doc).await.unwrap()
}

async fn top_texts(s: &mut Session) -> Vec<String> {
	let children = s.document.get_children(Row::ROOT).await.unwrap();
	let mut out = Vec::new();
	for row in children {
		out.push(s.document.get_text(row).await.unwrap());
	}
	out
}

#[tokio::test]
async fn insert_undo_redo_round_trips() {
	let mut s = session_with(&["hello"]).await;
	let snapshot = s.document.serialize().await.unwrap();

	s.cursor.set_col(5);
	s.add_chars_at_cursor(line_from_str(" world")).await.unwrap();
	s.save();
	assert_eq!(top_texts(&mut s).await, vec!["hello world"]);

	s.undo().await.unwrap();
	assert_eq!(s.document.serialize().await.unwrap(), snapshot);

	s.redo().await.unwrap();
	assert_eq!(top_texts(&mut s).await, vec!["hello world"]);
}

#[tokio::test]
async fn undo_restores_cursor_from_before_the_burst() {
	let mut s = session_with(&["abc"]).await;
	assert_eq!(s.cursor.col, 0);

	s.cursor.set_col(3);
	s.add_chars_at_cursor(line_from_str("xy")).await.unwrap();
	s.save();
	assert_eq!(s.cursor.col, 5);

	s.undo().await.unwrap();
	assert_eq!(s.cursor.col, 3);
}

#[tokio::test]
async fn one_checkpoint_covers_a_whole_burst() {
	let mut s = session_with(&["ab"]).await;

	// Two mutations, one save: undo reverts both together.
	s.cursor.set_col(2);
	s.add_chars_at_cursor(line_from_str("c")).await.unwrap();
	s.add_chars_at_cursor(line_from_str("d")).await.unwrap();
	s.save();
	assert_eq!(top_texts(&mut s).await, vec!["abcd"]);

	s.undo().await.unwrap();
	assert_eq!(top_texts(&mut s).await, vec!["ab"]);
}

#[tokio::test]
async fn delete_then_paste_swaps_rows() {
	let mut s = session_with(&["a", "b"]).await;

	s.delete_blocks(1).await.unwrap();
	s.save();
	assert_eq!(top_texts(&mut s).await, vec!["b"]);

	s.paste(Direction::After).await.unwrap();
	s.save();
	assert_eq!(top_texts(&mut s).await, vec!["b", "a"]);

	s.undo().await.unwrap();
	assert_eq!(top_texts(&mut s).await, vec!["b"]);
	s.undo().await.unwrap();
	assert_eq!(top_texts(&mut s).await, vec!["a", "b"]);
}

#[tokio::test]
async fn deleted_block_keeps_its_subtree_through_paste() {
	let mut s = session_with(&["parent", "other"]).await;
	let parent = s.document.get_children(Row::ROOT).await.unwrap()[0];
	let child = s.document.new_row().await.unwrap();
	s.document.set_line(child, line_from_str("child")).await.unwrap();
	s.document.attach(child, parent, 0).await.unwrap();

	s.delete_blocks(1).await.unwrap();
	s.save();
	s.paste(Direction::After).await.unwrap();
	s.save();

	assert_eq!(top_texts(&mut s).await, vec!["other", "parent"]);
	let pasted = s.document.get_children(Row::ROOT).await.unwrap()[1];
	let grandchildren = s.document.get_children(pasted).await.unwrap();
	assert_eq!(grandchildren.len(), 1);
	assert_eq!(s.document.get_text(grandchildren[0]).await.unwrap(), "child");
}

#[tokio::test]
async fn new_edit_discards_the_redo_branch() {
	let mut s = session_with(&["x"]).await;

	s.cursor.set_col(1);
	s.add_chars_at_cursor(line_from_str("a")).await.unwrap();
	s.save();
	s.undo().await.unwrap();

	s.cursor.set_col(1);
	s.add_chars_at_cursor(line_from_str("b")).await.unwrap();
	s.save();
	assert_eq!(top_texts(&mut s).await, vec!["xb"]);

	// The "xa" branch is gone; redo has nothing to replay.
	s.redo().await.unwrap();
	assert_eq!(top_texts(&mut s).await, vec!["xb"]);
}

#[tokio::test]
async fn clone_paste_onto_own_descendant_is_rejected() {
	let mut s = session_with(&["p"]).await;
	let p = s.document.get_children(Row::ROOT).await.unwrap()[0];
	let c = s.document.new_row().await.unwrap();
	s.document.set_line(c, line_from_str("c")).await.unwrap();
	s.document.attach(c, p, 0).await.unwrap();

	s.clone_blocks(1).await.unwrap();
	s.cursor.set_position(Path::root().extend(&[p, c]).unwrap(), 0);
	s.paste(Direction::After).await.unwrap();

	// Attaching p under itself would be a cycle; nothing changed.
	assert_eq!(s.document.get_children(p).await.unwrap(), vec![c]);
	assert_eq!(top_texts(&mut s).await, vec!["p"]);
}

#[tokio::test]
async fn clone_paste_elsewhere_attaches_the_same_row() {
	let mut s = session_with(&["a", "b"]).await;
	let rows = s.document.get_children(Row::ROOT).await.unwrap();
	let b1 = s.document.new_row().await.unwrap();
	s.document.attach(b1, rows[1], 0).await.unwrap();

	s.clone_blocks(1).await.unwrap();
	// Paste inside b: b's children are visible, so the paste lands as its
	// first child.
	s.cursor.set_position(Path::root().child(rows[1]).unwrap(), 0);
	s.paste(Direction::After).await.unwrap();

	assert_eq!(s.document.get_children(rows[1]).await.unwrap(), vec![rows[0], b1]);
	assert!(s.document.is_clone(rows[0]).await.unwrap());
	assert_eq!(s.document.get_parents(rows[0]).await.unwrap(), vec![Row::ROOT, rows[1]]);
}

#[tokio::test]
async fn visual_line_selection_resolves_to_sibling_range() {
	let mut s = session_with(&["a", "b"]).await;
	let rows = s.document.get_children(Row::ROOT).await.unwrap();
	let a1 = s.document.new_row().await.unwrap();
	s.document.set_line(a1, line_from_str("a1")).await.unwrap();
	s.document.attach(a1, rows[0], 0).await.unwrap();

	// Anchor deep inside a, cursor on b: the selection spans a..=b.
	s.cursor.set_position(Path::root().extend(&[rows[0], a1]).unwrap(), 0);
	s.set_mode(ModeId::VisualLine).await.unwrap();
	s.cursor.set_position(Path::root().child(rows[1]).unwrap(), 0);

	let (parent, lo, hi) = s.visual_line_range().await.unwrap();
	assert!(parent.is_root());
	assert_eq!((lo, hi), (0, 1));
}

#[tokio::test]
async fn visual_line_ancestor_pair_collapses_to_the_ancestor() {
	let mut s = session_with(&["a"]).await;
	let a = s.document.get_children(Row::ROOT).await.unwrap()[0];
	let a1 = s.document.new_row().await.unwrap();
	s.document.attach(a1, a, 0).await.unwrap();

	s.set_mode(ModeId::VisualLine).await.unwrap();
	s.cursor.set_position(Path::root().extend(&[a, a1]).unwrap(), 0);

	let (parent, lo, hi) = s.visual_line_range().await.unwrap();
	assert!(parent.is_root());
	assert_eq!((lo, hi), (0, 0));
}

#[tokio::test]
async fn join_merges_text_and_adopts_children() {
	let mut s = session_with(&["hello", "world"]).await;
	let rows = s.document.get_children(Row::ROOT).await.unwrap();
	let w1 = s.document.new_row().await.unwrap();
	s.document.set_line(w1, line_from_str("w1")).await.unwrap();
	s.document.attach(w1, rows[1], 0).await.unwrap();

	s.join_row_below().await.unwrap();
	s.save();

	assert_eq!(top_texts(&mut s).await, vec!["hello world"]);
	assert_eq!(s.document.get_children(rows[0]).await.unwrap(), vec![w1]);
	assert_eq!(s.cursor.col, 5);

	s.undo().await.unwrap();
	assert_eq!(top_texts(&mut s).await, vec!["hello", "world"]);
	assert_eq!(s.document.get_children(rows[1]).await.unwrap(), vec![w1]);
}

#[tokio::test]
async fn split_moves_the_tail_to_a_new_row() {
	let mut s = session_with(&["hello"]).await;
	s.cursor.set_col(2);

	s.split_line_at_cursor().await.unwrap();
	assert_eq!(top_texts(&mut s).await, vec!["he", "llo"]);
	assert_eq!(s.cursor.col, 0);
	assert_eq!(s.cursor.path.row(), s.document.get_children(Row::ROOT).await.unwrap()[1]);
}

#[tokio::test]
async fn indent_then_outdent_restores_position() {
	let mut s = session_with(&["a", "b"]).await;
	let rows = s.document.get_children(Row::ROOT).await.unwrap();
	s.cursor.set_position(Path::root().child(rows[1]).unwrap(), 0);

	s.indent_block().await.unwrap();
	assert_eq!(s.document.get_children(Row::ROOT).await.unwrap(), vec![rows[0]]);
	assert_eq!(s.document.get_children(rows[0]).await.unwrap(), vec![rows[1]]);

	s.outdent_block().await.unwrap();
	assert_eq!(s.document.get_children(Row::ROOT).await.unwrap(), vec![rows[0], rows[1]]);
}

#[tokio::test]
async fn deleting_the_last_row_leaves_one_to_stand_on() {
	let mut s = session_with(&["only"]).await;

	s.delete_blocks(1).await.unwrap();
	let children = s.document.get_children(Row::ROOT).await.unwrap();
	assert_eq!(children.len(), 1);
	assert_eq!(s.document.get_text(children[0]).await.unwrap(), "");
	assert_eq!(s.cursor.path.row(), children[0]);
}

#[tokio::test]
async fn zoom_and_jump_history() {
	let mut s = session_with(&["a"]).await;
	let a = s.document.get_children(Row::ROOT).await.unwrap()[0];
	let a1 = s.document.new_row().await.unwrap();
	s.document.attach(a1, a, 0).await.unwrap();

	s.zoom_in().await.unwrap();
	assert_eq!(s.view_root.row(), a);
	assert_eq!(s.cursor.path.row(), a1);

	s.jump_previous().await.unwrap();
	assert!(s.view_root.is_root());
	assert_eq!(s.cursor.path.row(), a);

	s.jump_next().await.unwrap();
	assert_eq!(s.view_root.row(), a);
}

#[tokio::test]
async fn subscribers_observe_mode_and_cursor_changes() {
	use std::sync::{Arc, Mutex};

	let mut s = session_with(&["ab", "cd"]).await;
	let log = Arc::new(Mutex::new(Vec::new()));
	let sink = log.clone();
	s.subscribe(move |event| sink.lock().unwrap().push(format!("{event:?}")));

	s.set_mode(ModeId::Insert).await.unwrap();
	assert_eq!(log.lock().unwrap().len(), 1);
	assert!(log.lock().unwrap()[0].contains("ModeChanged"));
	assert!(log.lock().unwrap()[0].contains("Insert"));

	s.cursor.set_col(1);
	s.flush_cursor_events();
	assert!(log.lock().unwrap()[1].contains("CursorColChanged"));

	let rows = s.document.get_children(Row::ROOT).await.unwrap();
	s.cursor.set_position(Path::root().child(rows[1]).unwrap(), 0);
	s.flush_cursor_events();
	let last = log.lock().unwrap().last().cloned().unwrap();
	assert!(last.contains("CursorColChanged"));
	assert!(log.lock().unwrap().iter().any(|e| e.contains("CursorRowChanged")));

	// Nothing moved; a second flush reports nothing.
	let before = log.lock().unwrap().len();
	s.flush_cursor_events();
	assert_eq!(log.lock().unwrap().len(), before);
}

#[tokio::test]
async fn view_root_persists_across_sessions() {
	let mut s = session_with(&["a", "b"]).await;
	let rows = s.document.get_children(Row::ROOT).await.unwrap();
	s.cursor.set_position(Path::root().child(rows[1]).unwrap(), 0);
	s.zoom_in().await.unwrap();
	assert_eq!(s.view_root.row(), rows[1]);

	// Reopening over the same store restores the zoom.
	let reopened = Session::new(s.document).await.unwrap();
	assert_eq!(reopened.view_root.row(), rows[1]);
	assert_eq!(reopened.cursor.path.parent().unwrap().row(), rows[1]);
}

#[tokio::test]
async fn leaving_insert_mode_clamps_the_cursor() {
	let mut s = session_with(&["ab"]).await;
	s.set_mode(ModeId::Insert).await.unwrap();
	s.cursor.set_col(2); // between-characters position past the last char
	s.set_mode(ModeId::Normal).await.unwrap();
	assert_eq!(s.cursor.col, 1);
}
