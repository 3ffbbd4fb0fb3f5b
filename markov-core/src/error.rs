use thiserror::Error;

use crate::model::scope::Scope;

/// Reply for any generation failure whose detail must stay in the logs.
pub const GENERIC_FAILURE_MESSAGE: &str = "Error: something went wrong while generating a message.";

/// Failure of the chain store. Ingest propagates these untouched.
#[derive(Error, Debug)]
pub enum StoreError {
	#[error("chain store lock poisoned by a panicking writer")]
	Poisoned,

	#[error("frequency overflow for token {token:?} in {scope}")]
	FrequencyOverflow { scope: Scope, token: String },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("snapshot or journal encoding error: {0}")]
	Snapshot(#[from] postcard::Error),

	#[error("unsupported journal schema version {0}")]
	UnsupportedJournalVersion(u8),

	#[error("journal entry of {0} bytes exceeds the 4 GiB frame limit")]
	EntryTooLarge(usize),
}

/// A broken pair/total invariant found while walking the chain.
///
/// These are bug reports, never benign outcomes: retrying will not fix them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
	#[error("no total completion count for token {token:?} in {scope}")]
	NoTotalCompletionCount { scope: Scope, token: String },

	#[error("no next token for {token:?} at offset {offset} in {scope}")]
	NoNextToken { scope: Scope, token: String, offset: usize },

	#[error("completion count for {token:?} exhausted at offset {offset} in {scope}")]
	InvalidCompletionCount { scope: Scope, token: String, offset: usize },
}

/// Outcome of a generation that did not produce text.
#[derive(Error, Debug)]
pub enum GenerationError {
	/// The scope has no data yet. Expected, not a bug.
	#[error("no data for {0} yet")]
	EmptyCorpus(Scope),

	#[error(transparent)]
	Inconsistent(#[from] ConsistencyError),

	#[error(transparent)]
	Store(#[from] StoreError),
}

impl GenerationError {
	/// True when the error reports a broken chain rather than an expected outcome.
	pub fn is_consistency_violation(&self) -> bool {
		matches!(self, GenerationError::Inconsistent(_))
	}

	/// Text safe to show to an end user: no token, offset or storage detail.
	pub fn user_message(&self) -> String {
		match self {
			GenerationError::EmptyCorpus(Scope::Community(_)) => "Error: no data for this community yet!".to_owned(),
			GenerationError::EmptyCorpus(Scope::Author(..)) => "Error: no data for this member yet!".to_owned(),
			GenerationError::Inconsistent(_) | GenerationError::Store(_) => GENERIC_FAILURE_MESSAGE.to_owned(),
		}
	}
}

/// Rejected edit of an exclusion list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExclusionError {
	#[error("the string must have length greater than 0")]
	Empty,

	#[error("the maximum number of exclusions of this type has already been reached ({limit})")]
	LimitReached { limit: usize },

	#[error("invalid or nonexistent ID: {0}")]
	InvalidId(usize),
}
