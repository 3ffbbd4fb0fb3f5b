use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MAX_EXCLUSIONS_PER_COMMUNITY;
use crate::error::ExclusionError;

/// Which exclusion list an edit targets.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionKind {
	/// Any message containing one of these strings is not ingested at all.
	Blacklist,
	/// These strings are removed from a message before tokenization.
	Ignore,
}

impl fmt::Display for ExclusionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ExclusionKind::Blacklist => f.write_str("blacklist"),
			ExclusionKind::Ignore => f.write_str("ignore"),
		}
	}
}

fn default_limit() -> usize {
	MAX_EXCLUSIONS_PER_COMMUNITY
}

/// Ordered, bounded list of exclusion strings.
///
/// # Invariants
/// - Never holds more than `limit` entries
/// - Never holds an empty string
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExclusionList {
	entries: Vec<String>,
	#[serde(default = "default_limit")]
	limit: usize,
}

impl ExclusionList {
	pub fn new(limit: usize) -> Self {
		Self { entries: Vec::new(), limit }
	}

	/// Appends `string` to the list.
	///
	/// # Errors
	/// - `Empty` if `string` is empty
	/// - `LimitReached` if the list is already full
	pub fn add(&mut self, string: &str) -> Result<(), ExclusionError> {
		if string.is_empty() {
			return Err(ExclusionError::Empty);
		}
		if self.entries.len() >= self.limit {
			return Err(ExclusionError::LimitReached { limit: self.limit });
		}
		self.entries.push(string.to_owned());
		Ok(())
	}

	/// Removes the entry with the 1-based `id` shown by [`ExclusionList::list`].
	pub fn remove(&mut self, id: usize) -> Result<String, ExclusionError> {
		if id == 0 || id > self.entries.len() {
			return Err(ExclusionError::InvalidId(id));
		}
		Ok(self.entries.remove(id - 1))
	}

	/// Returns `(id, string)` pairs, ids starting at 1.
	pub fn list(&self) -> Vec<(usize, &str)> {
		self.entries.iter().enumerate().map(|(i, s)| (i + 1, s.as_str())).collect()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn limit(&self) -> usize {
		self.limit
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(String::as_str).filter(|s| !s.is_empty())
	}
}

impl Default for ExclusionList {
	fn default() -> Self {
		Self::new(MAX_EXCLUSIONS_PER_COMMUNITY)
	}
}

/// Both exclusion lists of one community, injected per ingest call.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Exclusions {
	pub blacklist: ExclusionList,
	pub ignore: ExclusionList,
}

impl Exclusions {
	/// Empty lists with the given capacity each.
	pub fn with_limit(limit: usize) -> Self {
		Self { blacklist: ExclusionList::new(limit), ignore: ExclusionList::new(limit) }
	}

	pub fn list(&self, kind: ExclusionKind) -> &ExclusionList {
		match kind {
			ExclusionKind::Blacklist => &self.blacklist,
			ExclusionKind::Ignore => &self.ignore,
		}
	}

	pub fn list_mut(&mut self, kind: ExclusionKind) -> &mut ExclusionList {
		match kind {
			ExclusionKind::Blacklist => &mut self.blacklist,
			ExclusionKind::Ignore => &mut self.ignore,
		}
	}

	/// True if `text` contains any blacklisted string.
	pub fn is_blacklisted(&self, text: &str) -> bool {
		self.blacklist.iter().any(|needle| text.contains(needle))
	}

	/// Removes every occurrence of every ignored string, in list order.
	pub fn strip_ignored(&self, text: &str) -> String {
		self.ignore.iter().fold(text.to_owned(), |acc, needle| acc.replace(needle, ""))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_entry_past_the_cap() {
		let mut list = ExclusionList::default();
		for i in 0..50 {
			list.add(&format!("word{i}")).unwrap();
		}
		assert_eq!(list.add("one too many"), Err(ExclusionError::LimitReached { limit: 50 }));
		assert_eq!(list.len(), 50);
	}

	#[test]
	fn rejects_empty_string() {
		let mut list = ExclusionList::default();
		assert_eq!(list.add(""), Err(ExclusionError::Empty));
		assert!(list.is_empty());
	}

	#[test]
	fn remove_uses_one_based_ids() {
		let mut list = ExclusionList::default();
		list.add("a").unwrap();
		list.add("b").unwrap();
		list.add("c").unwrap();
		assert_eq!(list.remove(0), Err(ExclusionError::InvalidId(0)));
		assert_eq!(list.remove(4), Err(ExclusionError::InvalidId(4)));
		assert_eq!(list.remove(2), Ok("b".to_owned()));
		assert_eq!(list.list(), vec![(1, "a"), (2, "c")]);
	}

	#[test]
	fn blacklist_and_ignore_rules() {
		let mut exclusions = Exclusions::default();
		exclusions.list_mut(ExclusionKind::Blacklist).add("forbidden").unwrap();
		exclusions.list_mut(ExclusionKind::Ignore).add("um ").unwrap();

		assert!(exclusions.is_blacklisted("this is forbidden text"));
		assert!(!exclusions.is_blacklisted("this is fine"));
		assert_eq!(exclusions.strip_ignored("um hello um there"), "hello there");
	}
}
