//! The modal key handler.
//!
//! One [`KeyHandler::step`] consumes a complete command from the stream:
//! an optional repeat count, a walk down the active mode's binding trie,
//! and, behind a `<motion>` acceptor, a second count and a motion
//! resolution. Raw-text modes (insert, search) bypass the trie for
//! printable keys. An unmatched sequence is not an error; the consumed keys
//! are dropped and the handler waits for the next command.
//!
//! Macro playback and `.` replay feed a recorded key list through the same
//! step loop via a temporary stopped stream; the resulting
//! [`Error::QueueStopped`] is the normal end of playback. Session `save()`
//! is disabled while a macro plays, so one playback commits at most one
//! undo checkpoint.

use loft_primitives::{BoxFuture, Char, Error, Key, ModeId, Result};
use loft_session::Session;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::actions::{Action, InsertTarget, Repeat};
use crate::bindings::{BindingTarget, KeyBindingsTree};
use crate::keymap::default_bindings;
use crate::keystream::KeyStream;
use crate::motions::Motion;

/// A fully resolved command, ready to dispatch.
enum Resolved {
	Action {
		action: Action,
		/// `(motion, motion count, find-char argument)` for motion acceptors.
		motion: Option<(Motion, usize, Option<char>)>,
	},
	Motion {
		motion: Motion,
		arg: Option<char>,
	},
	NoMatch,
}

type Recording = Option<(Key, Vec<Key>)>;

async fn next_key(stream: &mut KeyStream, recording: &mut Recording) -> Result<Key> {
	let key = stream.dequeue().await?;
	if let Some((_, keys)) = recording {
		keys.push(key.clone());
	}
	Ok(key)
}

/// Repeat counts clamp here, like vim's; digits beyond it change nothing.
const MAX_COUNT: usize = 999_999_999;

/// Parses a leading repeat count: digits `1-9` then `0-9`, so a bare `0`
/// stays available as the home motion. Returns the count and the first
/// non-count key.
async fn parse_count(
	stream: &mut KeyStream,
	recording: &mut Recording,
	first: Key,
) -> Result<(usize, Key)> {
	let mut count: Option<usize> = None;
	let mut key = first;
	loop {
		match key.as_digit() {
			Some(d) if count.is_some() || d != 0 => {
				let next = count.unwrap_or(0).saturating_mul(10).saturating_add(d as usize);
				count = Some(next.min(MAX_COUNT));
				key = next_key(stream, recording).await?;
			}
			_ => return Ok((count.unwrap_or(1), key)),
		}
	}
}

/// Resolves a motion against the trie, following only branches with a
/// motion leaf below them. Find-style motions consume their character
/// argument here.
async fn resolve_motion(
	stream: &mut KeyStream,
	recording: &mut Recording,
	tree: &KeyBindingsTree,
	first: Key,
) -> Result<Option<(Motion, Option<char>)>> {
	let mut node = tree.root();
	let mut key = first;
	loop {
		match node.child(&key) {
			Some(child) if child.has_motion() => {
				if let Some(BindingTarget::Motion(motion)) = child.target() {
					let arg = if motion.needs_char() {
						match next_key(stream, recording).await?.as_char() {
							Some(ch) => Some(ch),
							None => return Ok(None),
						}
					} else {
						None
					};
					return Ok(Some((motion, arg)));
				}
				node = child;
				key = next_key(stream, recording).await?;
			}
			_ => return Ok(None),
		}
	}
}

async fn resolve_command(
	stream: &mut KeyStream,
	recording: &mut Recording,
	tree: &KeyBindingsTree,
	first: Key,
) -> Result<Resolved> {
	let mut node = tree.root();
	let mut key = first;
	loop {
		if let Some(child) = node.child(&key) {
			if child.is_leaf() {
				return match child.target() {
					Some(BindingTarget::Action(action)) => Ok(Resolved::Action {
						action,
						motion: None,
					}),
					Some(BindingTarget::Motion(motion)) => {
						let arg = if motion.needs_char() {
							match next_key(stream, recording).await?.as_char() {
								Some(ch) => Some(ch),
								None => return Ok(Resolved::NoMatch),
							}
						} else {
							None
						};
						Ok(Resolved::Motion { motion, arg })
					}
					None => Ok(Resolved::NoMatch),
				};
			}
			node = child;
			key = next_key(stream, recording).await?;
		} else if let Some(slot) = node.child(&Key::motion_sentinel()) {
			let (mcount, mkey) = parse_count(stream, recording, key).await?;
			let Some((motion, arg)) = resolve_motion(stream, recording, tree, mkey).await? else {
				return Ok(Resolved::NoMatch);
			};
			let Some(BindingTarget::Action(action)) = slot.target() else {
				return Err(Error::invariant(
					"motion acceptor bound to a non-action".to_string(),
				));
			};
			return Ok(Resolved::Action {
				action,
				motion: Some((motion, mcount, arg)),
			});
		} else {
			trace!(key = %key, "no binding");
			return Ok(Resolved::NoMatch);
		}
	}
}

pub struct KeyHandler {
	pub session: Session,
	bindings: FxHashMap<ModeId, KeyBindingsTree>,
	stream: KeyStream,
	macros: FxHashMap<Key, Vec<Key>>,
	recording: Recording,
}

impl KeyHandler {
	pub fn new(session: Session) -> Result<Self> {
		Ok(Self::with_bindings(session, default_bindings()?))
	}

	pub fn with_bindings(session: Session, bindings: FxHashMap<ModeId, KeyBindingsTree>) -> Self {
		Self {
			session,
			bindings,
			stream: KeyStream::new(),
			macros: FxHashMap::default(),
			recording: None,
		}
	}

	/// Feeds one key into the stream.
	pub fn enqueue(&self, key: Key) -> Result<()> {
		self.stream.enqueue(key)
	}

	/// A producer handle for key sources living elsewhere.
	pub fn sender(&self) -> Result<mpsc::UnboundedSender<Key>> {
		self.stream.sender()
	}

	/// Closes the stream; [`KeyHandler::run`] returns once it drains.
	pub fn stop(&mut self) {
		self.stream.stop();
	}

	/// Processes commands until the stream stops. Errors from a command
	/// propagate; the stream itself stays usable for the keys after it.
	pub async fn run(&mut self) -> Result<()> {
		loop {
			match self.step().await {
				Ok(()) => {}
				Err(e) if e.is_queue_stopped() => return Ok(()),
				Err(e) => return Err(e),
			}
		}
	}

	/// Consumes and executes one complete command. Cursor movement is
	/// reported to session subscribers at the end of each command.
	pub async fn step(&mut self) -> Result<()> {
		let key = next_key(&mut self.stream, &mut self.recording).await?;
		let mode = self.session.mode();
		let result = if mode.behavior().raw_text {
			match mode {
				ModeId::Insert => self.step_insert(key).await,
				ModeId::Search => self.step_search(key).await,
				_ => self.step_settings(key).await,
			}
		} else {
			self.step_command(mode, key).await
		};
		self.session.flush_cursor_events();
		result
	}

	async fn step_command(&mut self, mode: ModeId, first: Key) -> Result<()> {
		let (count, key) = if mode.behavior().uses_counts {
			parse_count(&mut self.stream, &mut self.recording, first).await?
		} else {
			(1, first)
		};
		let resolved = {
			let Self {
				stream,
				recording,
				bindings,
				..
			} = self;
			let tree = bindings.get(&mode).ok_or_else(|| {
				Error::invariant(format!("no bindings for mode {}", mode.name()))
			})?;
			resolve_command(stream, recording, tree, key).await?
		};
		self.dispatch(resolved, count).await
	}

	async fn dispatch(&mut self, resolved: Resolved, count: usize) -> Result<()> {
		match resolved {
			Resolved::NoMatch => {
				self.stream.drop_all();
				Ok(())
			}
			Resolved::Motion { motion, arg } => {
				motion.execute(&mut self.session, count, arg).await?;
				self.stream.drop_all();
				Ok(())
			}
			Resolved::Action { action, motion } => {
				debug!(?action, count, "dispatch");
				self.execute_action(action, count, motion).await?;
				match action.repeat() {
					Repeat::Save => {
						self.session.save();
						self.stream.save();
					}
					Repeat::Drop => {
						self.session.save();
						self.stream.drop_all();
					}
					Repeat::Defer => {}
				}
				Ok(())
			}
		}
	}

	async fn step_insert(&mut self, key: Key) -> Result<()> {
		match key.as_str() {
			"esc" => {
				self.session.set_mode(ModeId::Normal).await?;
				self.session.save();
				self.stream.save();
			}
			"enter" => self.session.split_line_at_cursor().await?,
			"backspace" => self.session.del_chars_before_cursor(1, false).await?,
			"tab" => self.session.indent_block().await?,
			"shift+tab" => self.session.outdent_block().await?,
			"left" => Motion::Left.execute(&mut self.session, 1, None).await?,
			"right" => Motion::Right.execute(&mut self.session, 1, None).await?,
			"up" => Motion::Up.execute(&mut self.session, 1, None).await?,
			"down" => Motion::Down.execute(&mut self.session, 1, None).await?,
			"space" => self.session.add_chars_at_cursor(vec![Char::plain(' ')]).await?,
			_ => {
				if let Some(ch) = key.as_char() {
					self.session.add_chars_at_cursor(vec![Char::plain(ch)]).await?;
				}
			}
		}
		Ok(())
	}

	async fn step_search(&mut self, key: Key) -> Result<()> {
		match key.as_str() {
			"esc" => {
				self.session.set_mode(ModeId::Normal).await?;
				self.stream.drop_all();
			}
			"enter" => {
				self.session.accept_search().await?;
				self.session.set_mode(ModeId::Normal).await?;
				self.stream.drop_all();
			}
			"backspace" => {
				self.session.search_buffer.pop();
			}
			"space" => self.session.search_buffer.push(' '),
			_ => {
				if let Some(ch) = key.as_char() {
					self.session.search_buffer.push(ch);
				}
			}
		}
		Ok(())
	}

	async fn step_settings(&mut self, key: Key) -> Result<()> {
		if key.as_str() == "esc" {
			self.session.set_mode(ModeId::Normal).await?;
		}
		self.stream.drop_all();
		Ok(())
	}

	async fn execute_action(
		&mut self,
		action: Action,
		count: usize,
		motion: Option<(Motion, usize, Option<char>)>,
	) -> Result<()> {
		let s = &mut self.session;
		match action {
			Action::EnterInsert(target) => {
				s.set_mode(ModeId::Insert).await?;
				match target {
					InsertTarget::Here => {}
					InsertTarget::After => s.cursor.right(&mut s.document, true).await?,
					InsertTarget::Home => s.cursor.home(),
					InsertTarget::End => s.cursor.end(&mut s.document, true).await?,
					InsertTarget::OpenBelow => s.new_row_below().await?,
					InsertTarget::OpenAbove => s.new_row_above().await?,
				}
			}
			Action::ExitToNormal => s.set_mode(ModeId::Normal).await?,
			Action::EnterVisual => s.set_mode(ModeId::Visual).await?,
			Action::EnterVisualLine => s.set_mode(ModeId::VisualLine).await?,
			Action::StartSearch => s.set_mode(ModeId::Search).await?,
			Action::DeleteMotion | Action::YankMotion => {
				let (motion, mcount, arg) = motion.ok_or_else(|| {
					Error::invariant("motion action dispatched without a motion".to_string())
				})?;
				self.motion_span(action, motion, count.saturating_mul(mcount), arg)
					.await?;
			}
			Action::DeleteBlocks => s.delete_blocks(count).await?,
			Action::YankBlocks => s.yank_blocks(count).await?,
			Action::CloneBlocks => s.clone_blocks(count).await?,
			Action::DeleteCharAfter => {
				s.del_chars_after_cursor(count, true).await?;
				s.cursor.clamp(&mut s.document, false).await?;
			}
			Action::DeleteCharBefore => s.del_chars_before_cursor(count, true).await?,
			Action::DeleteToEol => {
				s.del_chars_to_eol(true).await?;
				s.cursor.clamp(&mut s.document, false).await?;
			}
			Action::Paste(direction) => s.paste(direction).await?,
			Action::JoinBelow => {
				for _ in 0..count {
					s.join_row_below().await?;
				}
			}
			Action::ToggleCollapse => s.toggle_collapse().await?,
			Action::Indent => {
				for _ in 0..count {
					s.indent_block().await?;
				}
			}
			Action::Outdent => {
				for _ in 0..count {
					s.outdent_block().await?;
				}
			}
			Action::SwapDown => s.swap_block(count as isize).await?,
			Action::SwapUp => s.swap_block(-(count as isize)).await?,
			Action::Undo => {
				for _ in 0..count {
					s.undo().await?;
				}
			}
			Action::Redo => {
				for _ in 0..count {
					s.redo().await?;
				}
			}
			Action::ZoomIn => s.zoom_in().await?,
			Action::ZoomOut => s.zoom_out().await?,
			Action::ZoomRoot => s.zoom_root().await?,
			Action::JumpPrevious => {
				for _ in 0..count {
					s.jump_previous().await?;
				}
			}
			Action::JumpNext => {
				for _ in 0..count {
					s.jump_next().await?;
				}
			}
			Action::RecordMacro => match self.recording.take() {
				Some((register, mut keys)) => {
					// The stopping `q` was mirrored into the buffer; it is
					// not part of the macro.
					keys.pop();
					debug!(register = %register, len = keys.len(), "macro recorded");
					self.macros.insert(register, keys);
				}
				None => {
					let register = next_key(&mut self.stream, &mut self.recording).await?;
					self.recording = Some((register, Vec::new()));
				}
			},
			Action::PlayMacro => {
				let register = next_key(&mut self.stream, &mut self.recording).await?;
				let Some(keys) = self.macros.get(&register).cloned() else {
					return Ok(());
				};
				let mut sequence = Vec::new();
				for _ in 0..count {
					sequence.extend(keys.iter().cloned());
				}
				self.play_keys(sequence).await?;
			}
			Action::RepeatLast => {
				// The `.` itself must not become part of the next repeat.
				self.stream.drop_all();
				let last = self.stream.last_sequence().to_vec();
				if last.is_empty() {
					return Ok(());
				}
				let mut sequence = Vec::new();
				for _ in 0..count {
					sequence.extend(last.iter().cloned());
				}
				self.play_keys(sequence).await?;
			}
			Action::VisualDelete | Action::VisualYank => {
				self.visual_operate(action).await?;
			}
		}
		Ok(())
	}

	/// Applies a motion-paired action: character-wise when the motion stays
	/// on the cursor row, block-wise when it crosses rows.
	async fn motion_span(
		&mut self,
		action: Action,
		motion: Motion,
		count: usize,
		arg: Option<char>,
	) -> Result<()> {
		let s = &mut self.session;
		let before = s.cursor.clone();
		motion.execute(s, count, arg).await?;
		if !motion.linewise() && before.path.is(&s.cursor.path) {
			match action {
				Action::DeleteMotion => {
					s.del_chars_between(before.col, motion.inclusive(), true).await?;
				}
				_ => {
					let line = s.document.get_line(before.path.row()).await?;
					let (lo, hi) = if before.col <= s.cursor.col {
						(before.col, s.cursor.col)
					} else {
						(s.cursor.col, before.col)
					};
					let hi = (hi + usize::from(motion.inclusive())).min(line.len());
					s.register.save_chars(line[lo..hi].to_vec());
					s.cursor.set_col(lo);
				}
			}
		} else {
			s.anchor = Some(before);
			let (parent, lo, hi) = s.visual_line_range().await?;
			s.anchor = None;
			match action {
				Action::DeleteMotion => s.delete_block_range(&parent, lo, hi).await?,
				_ => {
					s.yank_block_range(&parent, lo, hi).await?;
					// Cursor lands on the first yanked row.
					let children = s.document.get_children(parent.row()).await?;
					s.cursor.set_position(parent.child(children[lo])?, 0);
				}
			}
		}
		Ok(())
	}

	async fn visual_operate(&mut self, action: Action) -> Result<()> {
		let s = &mut self.session;
		let anchor = s
			.anchor
			.clone()
			.ok_or_else(|| Error::invariant("visual operation without an anchor".to_string()))?;
		if s.mode() == ModeId::Visual && anchor.path.is(&s.cursor.path) {
			match action {
				Action::VisualDelete => s.del_chars_between(anchor.col, true, true).await?,
				_ => {
					let line = s.document.get_line(anchor.path.row()).await?;
					let (lo, hi) = if anchor.col <= s.cursor.col {
						(anchor.col, s.cursor.col)
					} else {
						(s.cursor.col, anchor.col)
					};
					let hi = (hi + 1).min(line.len());
					s.register.save_chars(line[lo..hi].to_vec());
					s.cursor.set_col(lo);
				}
			}
		} else {
			let (parent, lo, hi) = s.visual_line_range().await?;
			match action {
				Action::VisualDelete => s.delete_block_range(&parent, lo, hi).await?,
				_ => s.yank_block_range(&parent, lo, hi).await?,
			}
		}
		s.set_mode(ModeId::Normal).await
	}

	/// Replays recorded keys through a temporary stopped stream. The
	/// [`Error::QueueStopped`] at its end is the normal exit; session saves
	/// are suppressed so the whole replay commits as one checkpoint.
	fn play_keys(&mut self, keys: Vec<Key>) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let was_enabled = self.session.save_enabled;
			self.session.save_enabled = false;
			let outer = std::mem::replace(&mut self.stream, KeyStream::from_recorded(keys));
			let mut result = Ok(());
			loop {
				match self.step().await {
					Ok(()) => {}
					Err(e) if e.is_queue_stopped() => break,
					Err(e) => {
						result = Err(e);
						break;
					}
				}
			}
			self.stream = outer;
			self.session.save_enabled = was_enabled;
			self.session.save();
			result
		})
	}
}
