mod support;

use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;

use markov_core::model::chain_store::ChainStore;
use markov_core::model::generator::Generator;
use markov_core::model::transaction::Transaction;
use markov_core::{ChainConfig, CommunityId, ConsistencyError, GenerationError, MarkovEngine, Scope, StoreError};

use support::{engine, ingest_all, HighestDraw, LowestDraw};

/// Hand-written chain that may break the pair/total invariant on purpose.
#[derive(Default)]
struct FixtureStore {
	totals: HashMap<String, u64>,
	/// Completions per first token, already in enumeration order.
	pairs: HashMap<String, Vec<(String, u64)>>,
}

impl FixtureStore {
	fn total(mut self, token: &str, total: u64) -> Self {
		self.totals.insert(token.to_owned(), total);
		self
	}

	fn pair(mut self, first: &str, second: &str, frequency: u64) -> Self {
		self.pairs.entry(first.to_owned()).or_default().push((second.to_owned(), frequency));
		self
	}
}

impl ChainStore for FixtureStore {
	fn commit(&self, _transaction: Transaction) -> Result<(), StoreError> {
		Ok(())
	}

	fn total_completion_count(&self, _scope: &Scope, token: &str) -> Result<Option<u64>, StoreError> {
		Ok(self.totals.get(token).copied())
	}

	fn next_token_at(&self, _scope: &Scope, token: &str, offset: usize) -> Result<Option<(String, u64)>, StoreError> {
		Ok(self.pairs.get(token).and_then(|c| c.get(offset)).cloned())
	}

	fn erase_community(&self, _community: CommunityId) -> Result<(), StoreError> {
		Ok(())
	}
}

const SCOPE: Scope = Scope::Community(1);

#[test]
fn missing_total_on_later_token_is_a_violation() {
	let store = FixtureStore::default().total("", 1).pair("", "x", 1);
	let err = Generator::new(&store, 1000).walk(&SCOPE, &mut LowestDraw).unwrap_err();

	assert!(err.is_consistency_violation());
	match err {
		GenerationError::Inconsistent(ConsistencyError::NoTotalCompletionCount { scope, token }) => {
			assert_eq!(scope, SCOPE);
			assert_eq!(token, "x");
		}
		other => panic!("unexpected {other:?}"),
	}
}

#[test]
fn total_larger_than_pairs_runs_out_of_tokens() {
	let store = FixtureStore::default().total("", 3).pair("", "x", 1);
	let err = Generator::new(&store, 1000).walk(&SCOPE, &mut HighestDraw).unwrap_err();

	match err {
		GenerationError::Inconsistent(ConsistencyError::NoNextToken { token, offset, .. }) => {
			assert_eq!(token, "");
			assert_eq!(offset, 1);
		}
		other => panic!("unexpected {other:?}"),
	}
}

#[test]
fn zero_total_is_an_invalid_count() {
	let store = FixtureStore::default().total("", 0).pair("", "x", 1);
	let err = Generator::new(&store, 1000).walk(&SCOPE, &mut LowestDraw).unwrap_err();
	assert!(matches!(
		err,
		GenerationError::Inconsistent(ConsistencyError::InvalidCompletionCount { offset: 0, .. })
	));
}

#[test]
fn missing_start_total_is_empty_corpus() {
	let store = FixtureStore::default();
	let err = Generator::new(&store, 1000).walk(&SCOPE, &mut LowestDraw).unwrap_err();
	assert!(matches!(err, GenerationError::EmptyCorpus(Scope::Community(1))));
	assert!(!err.is_consistency_violation());
}

#[test]
fn high_draw_selects_the_last_candidate() {
	let engine = engine();
	ingest_all(&engine, 1, 7, &["a b", "a c"]);
	assert_eq!(engine.generate_with(SCOPE, &mut HighestDraw).unwrap(), "a c");
}

#[test]
fn iteration_cap_keeps_the_last_candidate_examined() {
	let config = ChainConfig { max_generation_iterations: 1, ..ChainConfig::default() };
	let engine = MarkovEngine::in_memory(config);
	ingest_all(&engine, 1, 7, &["a b", "a c"]);

	// The draw covers "c", but only "b" is examined before the cap.
	assert_eq!(engine.generate_with(SCOPE, &mut HighestDraw).unwrap(), "a b");
}

#[test]
fn seeded_walks_only_follow_recorded_edges() {
	let engine = engine();
	ingest_all(&engine, 1, 7, &["the cat sat", "the dog sat", "the cat ran", "a dog ran"]);

	let mut rng = StdRng::seed_from_u64(42);
	let mut seen = HashSet::new();
	for _ in 0..200 {
		let tokens = engine.generate_tokens(SCOPE, &mut rng).unwrap();
		assert!(!tokens.is_empty());
		for pair in tokens.windows(2) {
			let frequency = engine.store().pair_frequency(&SCOPE, &pair[0], &pair[1]).unwrap();
			assert!(frequency.is_some(), "unrecorded edge {pair:?}");
		}
		seen.insert(tokens.join(" "));
	}
	assert!(seen.contains("the cat sat"));
	assert!(seen.len() > 2);
}

#[test]
fn same_seed_same_output() {
	let engine = engine();
	ingest_all(&engine, 1, 7, &["one two three", "one three two", "two one three"]);

	let first = engine.generate_with(SCOPE, &mut StdRng::seed_from_u64(7)).unwrap();
	let second = engine.generate_with(SCOPE, &mut StdRng::seed_from_u64(7)).unwrap();
	assert_eq!(first, second);
}
