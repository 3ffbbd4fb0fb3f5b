use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::state::State;

/// Pair entries of one scope, grouped by first token.
///
/// # Invariants
/// - Each state in `states` corresponds to a unique first token
/// - All frequencies are >= 1
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct PairTable {
	states: HashMap<String, State>,
}

impl PairTable {
	/// Adds `count` occurrences of `first -> second`, creating the entry if needed.
	pub(crate) fn add_pair(&mut self, first: &str, second: &str, count: u64) {
		self.states.entry(first.to_owned()).or_default().add_transition(second, count);
	}

	pub(crate) fn frequency(&self, first: &str, second: &str) -> Option<u64> {
		self.states.get(first)?.frequency(second)
	}

	/// The `offset`-th completion of `first`, most frequent first.
	pub(crate) fn nth_completion(&self, first: &str, offset: usize) -> Option<(&str, u64)> {
		self.states.get(first)?.nth(offset)
	}

	/// `(first_token, Σ frequency)` for every first token of the table.
	pub(crate) fn frequency_sums(&self) -> impl Iterator<Item = (&str, u64)> {
		self.states.iter().map(|(first, state)| (first.as_str(), state.frequency_sum()))
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.states.is_empty()
	}
}

/// Total entries of one scope: first token → total completion count.
pub(crate) type TotalTable = HashMap<String, u64>;
