//! End-to-end key handling: counts, motion acceptors, macros, repeat.

use loft_document::Document;
use loft_input::KeyHandler;
use loft_primitives::{Key, Row, line_from_str};
use loft_session::Session;
use loft_store::{InMemoryBackend, Store};
use pretty_assertions::assert_eq;

async fn handler_with(texts: &[&str]) -> KeyHandler {
	let mut doc = Document::new(Store::new(Box::new(InMemoryBackend::new()), "test"));
	for (i, text) in texts.iter().enumerate() {
		let row = doc.new_row().await.unwrap();
		doc.set_line(row, line_from_str(text)).await.unwrap();
		doc.attach(row, Row::ROOT, i).await.unwrap();
	}
	KeyHandler::new(Session::new(doc).await.unwrap()).unwrap()
}

/// Feeds whitespace-separated key tokens and runs the handler to drain.
async fn send(handler: &mut KeyHandler, keys: &str) {
	for token in keys.split_whitespace() {
		handler.enqueue(Key::new(token)).unwrap();
	}
	handler.stop();
	handler.run().await.unwrap();
}

async fn top_texts(handler: &mut KeyHandler) -> Vec<String> {
	let doc = &mut handler.session.document;
	let children = doc.get_children(Row::ROOT).await.unwrap();
	let mut out = Vec::new();
	for row in children {
		out.push(doc.get_text(row).await.unwrap());
	}
	out
}

#[tokio::test]
async fn count_prefix_repeats_a_motion() {
	let mut h = handler_with(&["a", "b", "c", "d"]).await;
	let rows = h.session.document.get_children(Row::ROOT).await.unwrap();

	send(&mut h, "3 j").await;
	assert_eq!(h.session.cursor.path.row(), rows[3]);
}

#[tokio::test]
async fn count_applies_to_a_motion_paired_action() {
	let mut h = handler_with(&["a", "b", "c", "d"]).await;

	// d2j deletes the cursor row plus the two below it.
	send(&mut h, "d 2 j").await;
	assert_eq!(top_texts(&mut h).await, vec!["d"]);
}

#[tokio::test]
async fn dd_p_swaps_rows_and_undo_walks_back() {
	let mut h = handler_with(&["a", "b"]).await;

	send(&mut h, "d d p").await;
	assert_eq!(top_texts(&mut h).await, vec!["b", "a"]);

	// Delete and paste are separate checkpoints.
	h.session.undo().await.unwrap();
	assert_eq!(top_texts(&mut h).await, vec!["b"]);
	h.session.undo().await.unwrap();
	assert_eq!(top_texts(&mut h).await, vec!["a", "b"]);
}

#[tokio::test]
async fn insert_mode_types_text_as_one_checkpoint() {
	let mut h = handler_with(&["a"]).await;

	send(&mut h, "i h i esc").await;
	assert_eq!(top_texts(&mut h).await, vec!["hia"]);
	assert_eq!(h.session.checkpoint_count(), 1);

	h.session.undo().await.unwrap();
	assert_eq!(top_texts(&mut h).await, vec!["a"]);
}

#[tokio::test]
async fn repeat_replays_the_last_edit() {
	let mut h = handler_with(&["abcd"]).await;

	send(&mut h, "x .").await;
	assert_eq!(top_texts(&mut h).await, vec!["cd"]);
}

#[tokio::test]
async fn repeat_replays_an_insert_burst() {
	let mut h = handler_with(&["a"]).await;

	send(&mut h, "i h esc .").await;
	assert_eq!(top_texts(&mut h).await, vec!["hha"]);
}

#[tokio::test]
async fn macro_playback_contributes_at_most_one_checkpoint() {
	let mut h = handler_with(&["abcdefg"]).await;

	// Record x into register a (deleting one char while recording), then
	// play it three times.
	send(&mut h, "q a x q 3 @ a").await;
	assert_eq!(top_texts(&mut h).await, vec!["efg"]);
	// One checkpoint from the recording pass, one from the whole playback.
	assert_eq!(h.session.checkpoint_count(), 2);

	h.session.undo().await.unwrap();
	assert_eq!(top_texts(&mut h).await, vec!["bcdefg"]);
}

#[tokio::test]
async fn unmatched_sequence_is_dropped_silently() {
	let mut h = handler_with(&["ab"]).await;

	// "d" then "q" matches nothing; the following command still runs.
	send(&mut h, "d q x").await;
	assert_eq!(top_texts(&mut h).await, vec!["b"]);
}

#[tokio::test]
async fn find_motion_consumes_its_character() {
	let mut h = handler_with(&["hello world"]).await;

	send(&mut h, "f o").await;
	assert_eq!(h.session.cursor.col, 4);
}

#[tokio::test]
async fn delete_with_find_motion_is_inclusive() {
	let mut h = handler_with(&["hello world"]).await;

	send(&mut h, "d f o").await;
	assert_eq!(top_texts(&mut h).await, vec![" world"]);
}

#[tokio::test]
async fn visual_line_delete_removes_the_spanned_rows() {
	let mut h = handler_with(&["a", "b", "c"]).await;

	send(&mut h, "V j d").await;
	assert_eq!(top_texts(&mut h).await, vec!["c"]);
}

#[tokio::test]
async fn visual_char_delete_spans_anchor_to_cursor() {
	let mut h = handler_with(&["hello"]).await;

	send(&mut h, "v 2 l d").await;
	assert_eq!(top_texts(&mut h).await, vec!["lo"]);
}

#[tokio::test]
async fn search_jumps_to_the_first_match() {
	let mut h = handler_with(&["apple", "banana"]).await;
	let rows = h.session.document.get_children(Row::ROOT).await.unwrap();

	send(&mut h, "/ b a n enter").await;
	assert_eq!(h.session.cursor.path.row(), rows[1]);
}

#[tokio::test]
async fn oversized_count_clamps_instead_of_overflowing() {
	let mut h = handler_with(&["a", "b", "c"]).await;
	let rows = h.session.document.get_children(Row::ROOT).await.unwrap();

	// Far more digits than the accumulator could hold unclamped; the motion
	// still lands on the last row.
	let digits = "9 ".repeat(25);
	send(&mut h, &format!("{digits}j")).await;
	assert_eq!(h.session.cursor.path.row(), rows[2]);
}

#[tokio::test]
async fn zero_is_home_not_a_count() {
	let mut h = handler_with(&["hello"]).await;
	h.session.cursor.set_col(4);

	send(&mut h, "0").await;
	assert_eq!(h.session.cursor.col, 0);
}

#[tokio::test]
async fn gg_and_shift_g_jump_to_extremes() {
	let mut h = handler_with(&["a", "b", "c"]).await;
	let rows = h.session.document.get_children(Row::ROOT).await.unwrap();

	send(&mut h, "G").await;
	assert_eq!(h.session.cursor.path.row(), rows[2]);

	// The stream is stopped after a run; gg is covered by a fresh handler.
	let mut h = handler_with(&["a", "b", "c"]).await;
	let rows = h.session.document.get_children(Row::ROOT).await.unwrap();
	send(&mut h, "j j g g").await;
	assert_eq!(h.session.cursor.path.row(), rows[0]);
}
