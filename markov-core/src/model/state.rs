use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One outgoing edge, ordered for enumeration.
///
/// Ordering: descending frequency, then ascending token, so that the
/// enumeration is reproducible for a given random draw.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
struct Ranked {
	frequency: u64,
	token: String,
}

impl Ord for Ranked {
	fn cmp(&self, other: &Self) -> Ordering {
		other
			.frequency
			.cmp(&self.frequency)
			.then_with(|| self.token.cmp(&other.token))
	}
}

impl PartialOrd for Ranked {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// All pair entries sharing one first token inside one scope.
///
/// Conceptually, a node in the Markov chain whose outgoing edges are
/// weighted by their number of observations.
///
/// ## Invariants
/// - `transitions` and `ranking` hold exactly the same edges
/// - `ranking` is sorted, so an offset lookup is a plain index
/// - Each frequency is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct State {
	/// Frequency indexed by the second token.
	/// Example: { "there" => 42, "friend" => 3 }
	transitions: HashMap<String, u64>,
	/// Same edges, in enumeration order.
	ranking: Vec<Ranked>,
}

impl State {
	/// Records `count` more occurrences of the transition toward `next_token`.
	///
	/// The caller has checked that the addition does not overflow.
	pub(crate) fn add_transition(&mut self, next_token: &str, count: u64) {
		if count == 0 {
			return;
		}
		let frequency = self.transitions.entry(next_token.to_owned()).or_insert(0);
		if *frequency > 0 {
			let old = Ranked { frequency: *frequency, token: next_token.to_owned() };
			if let Ok(at) = self.ranking.binary_search(&old) {
				self.ranking.remove(at);
			}
		}
		*frequency += count;

		let ranked = Ranked { frequency: *frequency, token: next_token.to_owned() };
		let at = self.ranking.binary_search(&ranked).unwrap_or_else(|at| at);
		self.ranking.insert(at, ranked);
	}

	pub(crate) fn frequency(&self, next_token: &str) -> Option<u64> {
		self.transitions.get(next_token).copied()
	}

	/// Returns the edge at `offset` in descending-frequency order.
	pub(crate) fn nth(&self, offset: usize) -> Option<(&str, u64)> {
		self.ranking.get(offset).map(|r| (r.token.as_str(), r.frequency))
	}

	/// Sum of all outgoing frequencies. Saturates instead of wrapping.
	pub(crate) fn frequency_sum(&self) -> u64 {
		self.transitions.values().fold(0u64, |acc, f| acc.saturating_add(*f))
	}
}
