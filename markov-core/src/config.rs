use serde::{Deserialize, Serialize};

/// Longest token kept by the tokenizer, in characters.
pub const MAX_TOKEN_LENGTH: usize = 70;

/// Number of candidates scanned for one step before the last one is accepted.
pub const MAX_TOKEN_GENERATION_ITERATIONS: usize = 1000;

/// Maximum number of strings per exclusion list.
pub const MAX_EXCLUSIONS_PER_COMMUNITY: usize = 50;

/// Tunables of the chain engine.
///
/// The engine only reads this; it is supplied once at construction.
/// Every field has a default, so a partial JSON document is enough to
/// override a single value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ChainConfig {
	/// Tokens longer than this (in chars) are dropped during tokenization.
	pub max_token_length: usize,

	/// Hard cap on candidates examined when choosing the next token.
	pub max_generation_iterations: usize,

	/// Capacity of each exclusion list (blacklist and ignore).
	pub max_exclusions: usize,
}

impl Default for ChainConfig {
	fn default() -> Self {
		Self {
			max_token_length: MAX_TOKEN_LENGTH,
			max_generation_iterations: MAX_TOKEN_GENERATION_ITERATIONS,
			max_exclusions: MAX_EXCLUSIONS_PER_COMMUNITY,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_limits() {
		let config = ChainConfig::default();
		assert_eq!(config.max_token_length, 70);
		assert_eq!(config.max_generation_iterations, 1000);
		assert_eq!(config.max_exclusions, 50);
	}
}
