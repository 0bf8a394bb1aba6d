//! Incremental full-text search index.
//!
//! A token → row-set map maintained from line-change notifications instead
//! of rescanning the document per query. Tokens are lowercased alphanumeric
//! words; a query matches a row when every query token is a prefix of some
//! token of that row's line. Attachment is not tracked here; callers filter
//! hits through `Document::is_attached` when resolving them to paths.

use loft_primitives::Row;
use rustc_hash::{FxHashMap, FxHashSet};

/// Token index over row line text.
#[derive(Debug, Default)]
pub struct Searcher {
	token_rows: FxHashMap<String, FxHashSet<Row>>,
	row_tokens: FxHashMap<Row, Vec<String>>,
}

fn tokenize(text: &str) -> Vec<String> {
	let mut tokens: Vec<String> = text
		.to_lowercase()
		.split(|c: char| !c.is_alphanumeric())
		.filter(|t| !t.is_empty())
		.map(str::to_owned)
		.collect();
	tokens.sort();
	tokens.dedup();
	tokens
}

impl Searcher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reindexes one row after its line changed.
	pub fn update(&mut self, row: Row, text: &str) {
		if let Some(old) = self.row_tokens.remove(&row) {
			for token in old {
				if let Some(rows) = self.token_rows.get_mut(&token) {
					rows.remove(&row);
					if rows.is_empty() {
						self.token_rows.remove(&token);
					}
				}
			}
		}
		let tokens = tokenize(text);
		for token in &tokens {
			self.token_rows.entry(token.clone()).or_default().insert(row);
		}
		if !tokens.is_empty() {
			self.row_tokens.insert(row, tokens);
		}
	}

	/// Rows whose line matches every token of `query` (prefix match, case
	/// insensitive). Sorted by row id for deterministic results.
	pub fn search(&self, query: &str) -> Vec<Row> {
		let needles = tokenize(query);
		if needles.is_empty() {
			return Vec::new();
		}

		let mut result: Option<FxHashSet<Row>> = None;
		for needle in &needles {
			let mut rows = FxHashSet::default();
			for (token, token_rows) in &self.token_rows {
				if token.starts_with(needle.as_str()) {
					rows.extend(token_rows.iter().copied());
				}
			}
			result = Some(match result {
				None => rows,
				Some(acc) => acc.intersection(&rows).copied().collect(),
			});
			if result.as_ref().is_some_and(FxHashSet::is_empty) {
				break;
			}
		}

		let mut rows: Vec<Row> = result.unwrap_or_default().into_iter().collect();
		rows.sort();
		rows
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn indexes_and_finds_tokens() {
		let mut s = Searcher::new();
		s.update(Row(1), "buy some milk");
		s.update(Row(2), "milk the cows");
		s.update(Row(3), "unrelated");

		assert_eq!(s.search("milk"), vec![Row(1), Row(2)]);
		assert_eq!(s.search("milk cows"), vec![Row(2)]);
		assert_eq!(s.search("absent"), Vec::<Row>::new());
	}

	#[test]
	fn prefix_and_case_insensitive() {
		let mut s = Searcher::new();
		s.update(Row(1), "Grocery List");
		assert_eq!(s.search("groc"), vec![Row(1)]);
		assert_eq!(s.search("LIST"), vec![Row(1)]);
	}

	#[test]
	fn update_removes_stale_tokens() {
		let mut s = Searcher::new();
		s.update(Row(1), "old text");
		s.update(Row(1), "new words");
		assert_eq!(s.search("old"), Vec::<Row>::new());
		assert_eq!(s.search("words"), vec![Row(1)]);
	}

	#[test]
	fn empty_query_matches_nothing() {
		let mut s = Searcher::new();
		s.update(Row(1), "something");
		assert_eq!(s.search("  "), Vec::<Row>::new());
	}
}
