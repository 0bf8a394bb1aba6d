//! Cursor motions, resolvable from binding tries and composable with
//! motion-accepting actions.

use loft_primitives::{Error, Result};
use loft_session::Session;

/// One cursor movement. Motions execute against the session cursor and are
/// also threaded into actions like `d<motion>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
	Left,
	Right,
	Home,
	End,
	Up,
	Down,
	FirstVisible,
	LastVisible,
	WordNext { big: bool },
	WordEnd { big: bool },
	WordPrev { big: bool },
	/// `f`/`F`/`t`/`T`; the target character is dequeued separately.
	Find { backwards: bool, until: bool },
}

impl Motion {
	/// Whether the motion consumes one extra key as its argument.
	pub fn needs_char(&self) -> bool {
		matches!(self, Motion::Find { .. })
	}

	/// Character-wise deletes spanning this motion include the landing
	/// column.
	pub fn inclusive(&self) -> bool {
		matches!(
			self,
			Motion::End | Motion::WordEnd { .. } | Motion::Find { .. }
		)
	}

	/// Linewise motions make paired actions operate on whole blocks.
	pub fn linewise(&self) -> bool {
		matches!(
			self,
			Motion::Up | Motion::Down | Motion::FirstVisible | Motion::LastVisible
		)
	}

	/// Moves the session cursor `count` times. Stops as soon as an
	/// iteration no longer moves it, so a count pinned against a document
	/// boundary does not spin.
	pub async fn execute(&self, session: &mut Session, count: usize, arg: Option<char>) -> Result<()> {
		let past_end = session.past_end();
		for _ in 0..count.max(1) {
			let at = (session.cursor.path.clone(), session.cursor.col);
			match *self {
				Motion::Left => session.cursor.left(&mut session.document).await?,
				Motion::Right => session.cursor.right(&mut session.document, past_end).await?,
				Motion::Home => session.cursor.home(),
				Motion::End => session.cursor.end(&mut session.document, past_end).await?,
				Motion::Up => {
					session
						.cursor
						.up(&mut session.document, &session.view_root, past_end)
						.await?;
				}
				Motion::Down => {
					session
						.cursor
						.down(&mut session.document, &session.view_root, past_end)
						.await?;
				}
				Motion::FirstVisible => {
					session
						.cursor
						.visible_home(&mut session.document, &session.view_root)
						.await?;
				}
				Motion::LastVisible => {
					session
						.cursor
						.visible_end(&mut session.document, &session.view_root, past_end)
						.await?;
				}
				Motion::WordNext { big } => {
					session
						.cursor
						.next_word(&mut session.document, &session.view_root, big)
						.await?;
				}
				Motion::WordEnd { big } => {
					session
						.cursor
						.end_word(&mut session.document, &session.view_root, big)
						.await?;
				}
				Motion::WordPrev { big } => {
					session
						.cursor
						.prev_word(&mut session.document, &session.view_root, big)
						.await?;
				}
				Motion::Find { backwards, until } => {
					let ch = arg.ok_or_else(|| {
						Error::invariant("find motion executed without its character".to_string())
					})?;
					let offset = match (until, backwards) {
						(true, false) => -1,
						(true, true) => 1,
						(false, _) => 0,
					};
					session
						.cursor
						.find_char(&mut session.document, ch, backwards, offset)
						.await?;
				}
			}
			if session.cursor.path.is(&at.0) && session.cursor.col == at.1 {
				break;
			}
		}
		Ok(())
	}
}
