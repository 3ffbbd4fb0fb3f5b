use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::scope::{IngestScopes, Scope};

/// An all-or-nothing batch of insert-or-increment writes.
///
/// Writes are coalesced per key, so recording the same pair twice yields a
/// single `+2` increment. A store applies the batch entirely or not at all.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
	pairs: HashMap<(Scope, String, String), u64>,
	totals: HashMap<(Scope, String), u64>,
}

impl Transaction {
	pub fn new() -> Self {
		Self::default()
	}

	/// Increments the pair entry `first -> second` of `scope` and the total
	/// entry of `first`, keeping them in step.
	pub fn record_pair(&mut self, scope: Scope, first: &str, second: &str) {
		let frequency = self.pairs.entry((scope, first.to_owned(), second.to_owned())).or_insert(0);
		*frequency = frequency.saturating_add(1);
		let total = self.totals.entry((scope, first.to_owned())).or_insert(0);
		*total = total.saturating_add(1);
	}

	/// The four writes of one adjacent pair: community and author, pair and total.
	pub fn record_adjacent(scopes: IngestScopes, first: &str, second: &str) -> Self {
		let mut transaction = Self::new();
		transaction.record_pair(scopes.community_scope(), first, second);
		transaction.record_pair(scopes.author_scope(), first, second);
		transaction
	}

	/// Records every adjacent pair of `tokens` for both scopes.
	pub fn record_sequence(&mut self, scopes: IngestScopes, tokens: &[String]) {
		for window in tokens.windows(2) {
			self.record_pair(scopes.community_scope(), &window[0], &window[1]);
			self.record_pair(scopes.author_scope(), &window[0], &window[1]);
		}
	}

	/// Folds `other` into this transaction, summing increments per key.
	pub fn merge(&mut self, other: Transaction) {
		for (key, count) in other.pairs {
			let frequency = self.pairs.entry(key).or_insert(0);
			*frequency = frequency.saturating_add(count);
		}
		for (key, count) in other.totals {
			let total = self.totals.entry(key).or_insert(0);
			*total = total.saturating_add(count);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty() && self.totals.is_empty()
	}

	pub(crate) fn pair_increments(&self) -> impl Iterator<Item = (&Scope, &str, &str, u64)> {
		self.pairs
			.iter()
			.map(|((scope, first, second), count)| (scope, first.as_str(), second.as_str(), *count))
	}

	pub(crate) fn total_increments(&self) -> impl Iterator<Item = (&Scope, &str, u64)> {
		self.totals.iter().map(|((scope, first), count)| (scope, first.as_str(), *count))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn adjacent_pair_touches_both_scopes() {
		let transaction = Transaction::record_adjacent(IngestScopes::new(1, 2), "", "hi");
		let mut pairs: Vec<_> = transaction.pair_increments().map(|(s, f, n, c)| (*s, f, n, c)).collect();
		pairs.sort_by_key(|(scope, ..)| matches!(scope, Scope::Author(..)));
		assert_eq!(pairs, vec![(Scope::Community(1), "", "hi", 1), (Scope::Author(1, 2), "", "hi", 1)]);
		assert_eq!(transaction.total_increments().count(), 2);
	}

	#[test]
	fn merge_sums_increments() {
		let scopes = IngestScopes::new(1, 2);
		let tokens: Vec<String> = ["", "a", "a", ""].iter().map(|s| s.to_string()).collect();
		let mut left = Transaction::new();
		left.record_sequence(scopes, &tokens);
		let mut right = Transaction::new();
		right.record_sequence(scopes, &tokens);
		left.merge(right);

		let total_a = left
			.total_increments()
			.find(|(scope, first, _)| **scope == Scope::Community(1) && *first == "a")
			.map(|(.., count)| count);
		// "a" -> "a" and "a" -> "" per sequence, two sequences
		assert_eq!(total_a, Some(4));
	}
}
