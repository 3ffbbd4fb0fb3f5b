use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::io::{sibling_path, write_atomically};
use super::journal::{Journal, JournalOp};
use super::pair_table::{PairTable, TotalTable};
use super::scope::{AuthorKey, CommunityId, CommunityKey, Scope, ScopeKey};
use super::transaction::Transaction;

/// Persistent mapping `(scope, first, second) -> frequency` plus the
/// denormalized `(scope, first) -> total` it must always agree with.
///
/// # Contract
/// - `commit` applies a whole [`Transaction`] or nothing
/// - `erase_community` removes every entry of a community, author scopes
///   included, atomically with respect to `commit`
/// - Readers never observe a partially applied transaction
/// - For a persistent store, a write is durable once the call returns `Ok`
pub trait ChainStore: Send + Sync {
	/// Applies every insert-or-increment of `transaction` as one unit.
	fn commit(&self, transaction: Transaction) -> Result<(), StoreError>;

	/// Total completion count of `token` in `scope`, if any.
	fn total_completion_count(&self, scope: &Scope, token: &str) -> Result<Option<u64>, StoreError>;

	/// The completion of `token` at `offset`, ordered by descending frequency
	/// then ascending second token.
	fn next_token_at(&self, scope: &Scope, token: &str, offset: usize) -> Result<Option<(String, u64)>, StoreError>;

	/// Removes all pair and total entries of the community and its authors.
	fn erase_community(&self, community: CommunityId) -> Result<(), StoreError>;
}

/// A total entry that disagrees with the sum of its pair entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditFinding {
	pub scope: Scope,
	pub token: String,
	/// Stored total, `None` when missing.
	pub total: Option<u64>,
	/// Σ frequency of the pair entries starting with `token`.
	pub pair_sum: u64,
}

/// The four logical tables.
#[derive(Serialize, Deserialize, Debug, Default)]
struct Tables {
	community_pairs: BTreeMap<CommunityKey, PairTable>,
	community_totals: BTreeMap<CommunityKey, TotalTable>,
	author_pairs: BTreeMap<AuthorKey, PairTable>,
	author_totals: BTreeMap<AuthorKey, TotalTable>,
}

impl Tables {
	fn pairs(&self, key: &ScopeKey) -> Option<&PairTable> {
		match key {
			ScopeKey::Community(k) => self.community_pairs.get(k),
			ScopeKey::Author(k) => self.author_pairs.get(k),
		}
	}

	fn pairs_mut(&mut self, key: ScopeKey) -> &mut PairTable {
		match key {
			ScopeKey::Community(k) => self.community_pairs.entry(k).or_default(),
			ScopeKey::Author(k) => self.author_pairs.entry(k).or_default(),
		}
	}

	fn totals(&self, key: &ScopeKey) -> Option<&TotalTable> {
		match key {
			ScopeKey::Community(k) => self.community_totals.get(k),
			ScopeKey::Author(k) => self.author_totals.get(k),
		}
	}

	fn totals_mut(&mut self, key: ScopeKey) -> &mut TotalTable {
		match key {
			ScopeKey::Community(k) => self.community_totals.entry(k).or_default(),
			ScopeKey::Author(k) => self.author_totals.entry(k).or_default(),
		}
	}

	fn total(&self, scope: &Scope, token: &str) -> Option<u64> {
		self.totals(&scope.key())?.get(token).copied()
	}

	/// Rejects the transaction if any increment would overflow.
	/// Runs before any write so a rejection leaves the tables untouched.
	fn check(&self, transaction: &Transaction) -> Result<(), StoreError> {
		for (scope, first, second, count) in transaction.pair_increments() {
			let current = self.pairs(&scope.key()).and_then(|t| t.frequency(first, second)).unwrap_or(0);
			if current.checked_add(count).is_none() {
				return Err(StoreError::FrequencyOverflow { scope: *scope, token: first.to_owned() });
			}
		}
		for (scope, first, count) in transaction.total_increments() {
			let current = self.total(scope, first).unwrap_or(0);
			if current.checked_add(count).is_none() {
				return Err(StoreError::FrequencyOverflow { scope: *scope, token: first.to_owned() });
			}
		}
		Ok(())
	}

	fn apply(&mut self, op: &JournalOp) {
		match op {
			JournalOp::Commit(transaction) => {
				for (scope, first, second, count) in transaction.pair_increments() {
					self.pairs_mut(scope.key()).add_pair(first, second, count);
				}
				for (scope, first, count) in transaction.total_increments() {
					*self.totals_mut(scope.key()).entry(first.to_owned()).or_insert(0) += count;
				}
			}
			JournalOp::EraseCommunity(community) => {
				let community = CommunityKey::new(*community);
				self.community_pairs.remove(&community);
				self.community_totals.remove(&community);
				remove_authors_of(&mut self.author_pairs, &community);
				remove_authors_of(&mut self.author_totals, &community);
			}
		}
	}

	fn audit_scope(scope: Scope, pairs: Option<&PairTable>, totals: Option<&TotalTable>, findings: &mut Vec<AuditFinding>) {
		let mut sums: HashMap<&str, u64> = HashMap::new();
		if let Some(pairs) = pairs {
			sums.extend(pairs.frequency_sums());
		}
		for (token, pair_sum) in &sums {
			let total = totals.and_then(|t| t.get(*token).copied());
			if total != Some(*pair_sum) {
				findings.push(AuditFinding { scope, token: (*token).to_owned(), total, pair_sum: *pair_sum });
			}
		}
		if let Some(totals) = totals {
			for (token, total) in totals {
				if !sums.contains_key(token.as_str()) {
					findings.push(AuditFinding { scope, token: token.clone(), total: Some(*total), pair_sum: 0 });
				}
			}
		}
	}
}

/// Author keys sort by community first, so one community is a contiguous range.
fn remove_authors_of<V>(table: &mut BTreeMap<AuthorKey, V>, community: &CommunityKey) {
	let keys: Vec<AuthorKey> = table
		.range(AuthorKey::first_of(community)..)
		.map(|(key, _)| key)
		.take_while(|key| key.belongs_to(community))
		.cloned()
		.collect();
	for key in keys {
		table.remove(&key);
	}
}

/// Everything behind the store lock.
#[derive(Debug, Default)]
struct Inner {
	tables: Tables,
	/// Sequence number of the last applied operation.
	sequence: u64,
	journal: Option<Journal>,
}

impl Inner {
	/// Journals `op`, then applies it. A failed journal write applies nothing.
	fn record(&mut self, op: JournalOp) -> Result<(), StoreError> {
		let sequence = self.sequence + 1;
		if let Some(journal) = &mut self.journal {
			journal.append(sequence, &op)?;
		}
		self.tables.apply(&op);
		self.sequence = sequence;
		Ok(())
	}
}

/// Memory-resident [`ChainStore`], made durable by a journal and `postcard`
/// snapshots when opened on a path.
///
/// # Durability
/// - Every commit and erasure is appended to `<path>.journal` and synced
///   before it is applied, so an acknowledged write survives a crash
/// - [`MemoryChainStore::flush`] writes the snapshot and empties the journal
/// - [`MemoryChainStore::open`] loads the snapshot, then replays the journal
///   entries it does not cover yet
///
/// A single `RwLock` is the transaction boundary: commits, erasures and
/// flushes hold the write lock for the whole batch, readers take the read
/// lock per lookup.
#[derive(Debug, Default)]
pub struct MemoryChainStore {
	inner: RwLock<Inner>,
	snapshot_path: Option<PathBuf>,
}

impl MemoryChainStore {
	/// Returns an empty store that is never written to disk.
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads the snapshot at `path` if it exists and replays the journal
	/// next to it. Later writes are journaled before being applied.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
		let path = path.as_ref();
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)?;
		}

		let (mut sequence, mut tables) = if path.exists() {
			let bytes = std::fs::read(path)?;
			let snapshot: (u64, Tables) = postcard::from_bytes(&bytes)?;
			info!("Loaded chain snapshot from {}", path.display());
			snapshot
		} else {
			info!("No chain snapshot at {}, starting empty", path.display());
			(0, Tables::default())
		};

		let (journal, entries) = Journal::open(&sibling_path(path, "journal")?)?;
		let mut replayed = 0;
		for (entry_sequence, op) in entries {
			// Entries already folded into the snapshot by an interrupted flush.
			if entry_sequence <= sequence {
				continue;
			}
			tables.apply(&op);
			sequence = entry_sequence;
			replayed += 1;
		}
		if replayed > 0 {
			info!("Replayed {replayed} journal entries from {}", journal.path().display());
		}

		let inner = Inner { tables, sequence, journal: Some(journal) };
		Ok(Self { inner: RwLock::new(inner), snapshot_path: Some(path.to_owned()) })
	}

	/// Writes the current tables to the snapshot path, if any, then empties
	/// the journal.
	///
	/// The snapshot records the sequence number it covers. If the process
	/// dies between the rename and the journal truncation, `open` skips the
	/// entries the snapshot already holds.
	pub fn flush(&self) -> Result<(), StoreError> {
		let Some(path) = &self.snapshot_path else {
			return Ok(());
		};
		let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
		let bytes = postcard::to_stdvec(&(inner.sequence, &inner.tables))?;
		write_atomically(path, &bytes)?;
		if let Some(journal) = &mut inner.journal {
			journal.truncate()?;
		}
		info!("Saved chain snapshot to {} ({} bytes)", path.display(), bytes.len());
		Ok(())
	}

	/// Frequency of the pair entry `first -> second` in `scope`.
	pub fn pair_frequency(&self, scope: &Scope, first: &str, second: &str) -> Result<Option<u64>, StoreError> {
		let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
		Ok(inner.tables.pairs(&scope.key()).and_then(|t| t.frequency(first, second)))
	}

	/// True when `scope` holds no pair and no total entry.
	pub fn scope_is_empty(&self, scope: &Scope) -> Result<bool, StoreError> {
		let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
		let key = scope.key();
		let no_pairs = inner.tables.pairs(&key).is_none_or(PairTable::is_empty);
		let no_totals = inner.tables.totals(&key).is_none_or(TotalTable::is_empty);
		Ok(no_pairs && no_totals)
	}

	/// Recomputes every total from its pair entries and reports each mismatch.
	///
	/// An empty result means the pair/total invariant holds for every scope.
	pub fn audit(&self) -> Result<Vec<AuditFinding>, StoreError> {
		let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
		let tables = &inner.tables;
		let mut findings = Vec::new();

		let mut community_keys: Vec<&CommunityKey> =
			tables.community_pairs.keys().chain(tables.community_totals.keys()).collect();
		community_keys.sort();
		community_keys.dedup();
		for key in community_keys {
			if let Some(scope) = key.scope() {
				Tables::audit_scope(scope, tables.community_pairs.get(key), tables.community_totals.get(key), &mut findings);
			}
		}

		let mut author_keys: Vec<&AuthorKey> = tables.author_pairs.keys().chain(tables.author_totals.keys()).collect();
		author_keys.sort();
		author_keys.dedup();
		for key in author_keys {
			if let Some(scope) = key.scope() {
				Tables::audit_scope(scope, tables.author_pairs.get(key), tables.author_totals.get(key), &mut findings);
			}
		}

		Ok(findings)
	}
}

impl ChainStore for MemoryChainStore {
	fn commit(&self, transaction: Transaction) -> Result<(), StoreError> {
		if transaction.is_empty() {
			return Ok(());
		}
		let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
		inner.tables.check(&transaction)?;
		inner.record(JournalOp::Commit(transaction))
	}

	fn total_completion_count(&self, scope: &Scope, token: &str) -> Result<Option<u64>, StoreError> {
		let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
		Ok(inner.tables.total(scope, token))
	}

	fn next_token_at(&self, scope: &Scope, token: &str, offset: usize) -> Result<Option<(String, u64)>, StoreError> {
		let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
		Ok(inner
			.tables
			.pairs(&scope.key())
			.and_then(|t| t.nth_completion(token, offset))
			.map(|(next, frequency)| (next.to_owned(), frequency)))
	}

	fn erase_community(&self, community: CommunityId) -> Result<(), StoreError> {
		let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
		inner.record(JournalOp::EraseCommunity(community))?;
		info!("Erased chain data of community {community}");
		Ok(())
	}
}
