use log::debug;
use rand::Rng;

use crate::error::{ConsistencyError, GenerationError};
use super::chain_store::ChainStore;
use super::scope::Scope;
use super::tokenizer::SENTINEL;

/// Weighted random walk over a [`ChainStore`].
///
/// # Algorithm
/// Starting from the sentinel, each step draws `r` uniformly in
/// `[1, total]` and scans the completions of the current token by
/// descending frequency, subtracting each frequency from `r` until one
/// covers it. The walk ends when the sentinel is selected again.
///
/// The distribution is never materialized: the store's ordered
/// enumeration is read lazily, one offset at a time.
///
/// # Notes
/// - The scan stops after `max_iterations` candidates; the last candidate
///   examined is then accepted as if it had been drawn.
/// - Any disagreement between totals and pairs is reported, never repaired.
#[derive(Debug)]
pub struct Generator<'a, S: ChainStore + ?Sized> {
	store: &'a S,
	max_iterations: usize,
}

impl<'a, S: ChainStore + ?Sized> Generator<'a, S> {
	/// `max_iterations` is clamped to at least one candidate per step.
	pub fn new(store: &'a S, max_iterations: usize) -> Self {
		Self { store, max_iterations: max_iterations.max(1) }
	}

	/// Walks the chain of `scope` and returns the tokens between the sentinels.
	///
	/// # Errors
	/// - `EmptyCorpus` if the scope has no starting data
	/// - `Inconsistent` if a total disagrees with its pair entries
	/// - `Store` if the store itself fails
	pub fn walk<R: Rng>(&self, scope: &Scope, rng: &mut R) -> Result<Vec<String>, GenerationError> {
		let mut output = Vec::new();
		let mut current = SENTINEL.to_owned();

		loop {
			let total = match self.store.total_completion_count(scope, &current)? {
				Some(total) => total,
				None if current == SENTINEL => return Err(GenerationError::EmptyCorpus(*scope)),
				None => {
					return Err(ConsistencyError::NoTotalCompletionCount { scope: *scope, token: current }.into());
				}
			};

			let next = self.choose_next(scope, &current, total, rng)?;
			if next == SENTINEL {
				break;
			}
			output.push(next.clone());
			current = next;
		}

		Ok(output)
	}

	/// Picks the completion of `current` covering a uniform draw in `[1, total]`.
	fn choose_next<R: Rng>(
		&self,
		scope: &Scope,
		current: &str,
		total: u64,
		rng: &mut R,
	) -> Result<String, GenerationError> {
		let invalid_count = |offset: usize| ConsistencyError::InvalidCompletionCount {
			scope: *scope,
			token: current.to_owned(),
			offset,
		};

		if total == 0 {
			return Err(invalid_count(0).into());
		}

		let mut r = rng.random_range(1..=total);
		let mut remaining = total;
		let mut last_candidate = None;

		for offset in 0..self.max_iterations {
			let Some((candidate, frequency)) = self.store.next_token_at(scope, current, offset)? else {
				return Err(ConsistencyError::NoNextToken { scope: *scope, token: current.to_owned(), offset }.into());
			};

			if r <= frequency {
				return Ok(candidate);
			}

			r -= frequency;
			remaining = match remaining.checked_sub(frequency) {
				Some(rest) if rest > 0 => rest,
				_ => return Err(invalid_count(offset).into()),
			};
			last_candidate = Some(candidate);
		}

		debug!(
			"Scanned {} completions of {current:?} in {scope} without a pick, keeping the last one",
			self.max_iterations
		);
		last_candidate.ok_or_else(|| {
			ConsistencyError::NoNextToken { scope: *scope, token: current.to_owned(), offset: 0 }.into()
		})
	}
}
