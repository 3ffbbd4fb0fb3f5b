use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, error, info};
use rand::Rng;

use crate::config::ChainConfig;
use crate::error::{GenerationError, StoreError};
use crate::io::read_lines;
use super::chain_store::{ChainStore, MemoryChainStore};
use super::detokenizer::detokenize;
use super::exclusions::Exclusions;
use super::generator::Generator;
use super::scope::{AuthorId, CommunityId, IngestScopes, Scope};
use super::tokenizer::Tokenizer;
use super::transaction::Transaction;

/// Facade over tokenizer, chain store, generator and detokenizer.
///
/// # Responsibilities
/// - Ingest raw messages into the community and author chains
/// - Generate text for a community or author scope
/// - Erase every chain of a community
///
/// Exclusion lists are owned by the caller and passed per call.
#[derive(Debug)]
pub struct MarkovEngine<S: ChainStore = MemoryChainStore> {
	store: S,
	tokenizer: Tokenizer,
	config: ChainConfig,
}

impl MarkovEngine<MemoryChainStore> {
	/// Engine over an in-memory store that is never persisted.
	pub fn in_memory(config: ChainConfig) -> Self {
		Self::with_store(MemoryChainStore::new(), config)
	}

	/// Engine over a durable store: snapshot at `path`, journal next to it.
	pub fn open<P: AsRef<Path>>(path: P, config: ChainConfig) -> Result<Self, StoreError> {
		Ok(Self::with_store(MemoryChainStore::open(path)?, config))
	}
}

impl<S: ChainStore> MarkovEngine<S> {
	pub fn with_store(store: S, config: ChainConfig) -> Self {
		let tokenizer = Tokenizer::new(config.max_token_length);
		Self { store, tokenizer, config }
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn config(&self) -> &ChainConfig {
		&self.config
	}

	/// Runs the tokenizer with this engine's limits.
	pub fn tokenize(&self, raw_text: &str, exclusions: &Exclusions) -> Option<Vec<String>> {
		self.tokenizer.tokenize(raw_text, exclusions)
	}

	/// Tokenizes `raw_text` and records it in the community and author chains.
	///
	/// Returns `Ok(false)` when the message was filtered out (blacklisted, or
	/// no token left); the store is then untouched.
	///
	/// # Errors
	/// Store failures are returned as-is; pairs committed before the failure stay.
	pub fn ingest(
		&self,
		raw_text: &str,
		community: CommunityId,
		author: AuthorId,
		exclusions: &Exclusions,
	) -> Result<bool, StoreError> {
		let Some(tokens) = self.tokenizer.tokenize(raw_text, exclusions) else {
			debug!("Skipped message of author {author} in community {community}");
			return Ok(false);
		};

		self.ingest_tokens(IngestScopes::new(community, author), &tokens)?;
		debug!("Ingested {} pairs for author {author} in community {community}", tokens.len() - 1);
		Ok(true)
	}

	/// Records every adjacent pair of `tokens` in both scopes.
	///
	/// Each adjacent pair is one transaction of four writes (community pair,
	/// community total, author pair, author total).
	pub fn ingest_tokens(&self, scopes: IngestScopes, tokens: &[String]) -> Result<(), StoreError> {
		for window in tokens.windows(2) {
			self.store.commit(Transaction::record_adjacent(scopes, &window[0], &window[1]))?;
		}
		Ok(())
	}

	/// Walks the chain of `scope` with `rng` and returns the raw tokens.
	///
	/// Consistency violations are logged with full detail before being returned.
	pub fn generate_tokens<R: Rng>(&self, scope: Scope, rng: &mut R) -> Result<Vec<String>, GenerationError> {
		let result = Generator::new(&self.store, self.config.max_generation_iterations).walk(&scope, rng);
		if let Err(GenerationError::Inconsistent(err)) = &result {
			error!("Markov chain is inconsistent: {err}");
		}
		result
	}

	/// Generates text for `scope` with the given random source.
	pub fn generate_with<R: Rng>(&self, scope: Scope, rng: &mut R) -> Result<String, GenerationError> {
		Ok(detokenize(&self.generate_tokens(scope, rng)?))
	}

	/// Generates text for `scope` with the thread-local random source.
	pub fn generate(&self, scope: Scope) -> Result<String, GenerationError> {
		self.generate_with(scope, &mut rand::rng())
	}

	/// Removes all chain data of `community`, its author scopes included.
	pub fn erase_scope_data(&self, community: CommunityId) -> Result<(), StoreError> {
		self.store.erase_community(community)
	}

	/// Imports every line of a text file as a message of `scopes`.
	///
	/// Lines are tokenized in parallel, the partial chains are merged and the
	/// result is committed as one transaction: either the whole file is
	/// imported or nothing is.
	///
	/// # Returns
	/// The number of lines that produced tokens.
	///
	/// # Behavior
	/// - Splits lines into chunks (based on CPU cores * factor)
	/// - Spawns one scoped thread per chunk
	/// - Collects partial transactions through an MPSC channel
	pub fn import_corpus<P: AsRef<Path>>(
		&self,
		filename: P,
		scopes: IngestScopes,
		exclusions: &Exclusions,
	) -> Result<usize, StoreError> {
		let lines = read_lines(&filename)?;
		if lines.is_empty() {
			return Ok(0);
		}

		let factor = 8;
		let chunks = num_cpus::get() * factor;
		let chunk_size = lines.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let tokenizer = &self.tokenizer;
		thread::scope(|s| {
			for chunk in lines.chunks(chunk_size) {
				let tx = tx.clone();
				s.spawn(move || {
					let mut partial = Transaction::new();
					let mut ingested = 0usize;
					for line in chunk {
						if let Some(tokens) = tokenizer.tokenize(line, exclusions) {
							partial.record_sequence(scopes, &tokens);
							ingested += 1;
						}
					}
					// The receiver outlives every worker.
					let _ = tx.send((ingested, partial));
				});
			}
		});
		drop(tx);

		let mut merged = Transaction::new();
		let mut ingested = 0;
		for (count, partial) in rx.iter() {
			merged.merge(partial);
			ingested += count;
		}

		self.store.commit(merged)?;
		info!(
			"Imported {ingested}/{} lines from {} into community {}",
			lines.len(),
			filename.as_ref().display(),
			scopes.community
		);
		Ok(ingested)
	}
}
