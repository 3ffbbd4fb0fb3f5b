use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use super::scope::CommunityId;
use super::transaction::Transaction;

const SCHEMA_VERSION: u8 = 1;

/// Bytes of the little-endian length written before each entry.
const LENGTH_PREFIX: usize = 4;

/// A store mutation, written to the journal before it is applied.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) enum JournalOp {
	Commit(Transaction),
	EraseCommunity(CommunityId),
}

#[derive(Serialize)]
struct EntryRef<'a> {
	schema_version: u8,
	sequence: u64,
	op: &'a JournalOp,
}

#[derive(Deserialize)]
struct Entry {
	schema_version: u8,
	sequence: u64,
	op: JournalOp,
}

/// Append-only log of the mutations applied since the last snapshot.
///
/// # Format
/// Each entry is a `u32` little-endian length followed by a `postcard`
/// payload carrying a schema version, a sequence number and the operation.
///
/// # Invariants
/// - `append` returns only once the entry is synced to disk
/// - `len` is the size of the well-formed prefix of the file
#[derive(Debug)]
pub(crate) struct Journal {
	path: PathBuf,
	file: File,
	len: u64,
}

impl Journal {
	/// Opens (or creates) the journal and returns its entries in write order.
	///
	/// An incomplete last entry is cut off: it was being written when the
	/// process died, so its commit was never acknowledged.
	pub(crate) fn open(path: &Path) -> Result<(Self, Vec<(u64, JournalOp)>), StoreError> {
		let mut file = OpenOptions::new().read(true).append(true).create(true).open(path)?;
		let mut bytes = Vec::new();
		file.read_to_end(&mut bytes)?;

		let mut entries = Vec::new();
		let mut cursor = 0;
		while let Some(payload) = next_frame(&bytes[cursor..]) {
			let entry: Entry = postcard::from_bytes(payload)?;
			if entry.schema_version != SCHEMA_VERSION {
				return Err(StoreError::UnsupportedJournalVersion(entry.schema_version));
			}
			entries.push((entry.sequence, entry.op));
			cursor += LENGTH_PREFIX + payload.len();
		}

		if cursor < bytes.len() {
			warn!("Dropping {} bytes of incomplete entry at the end of {}", bytes.len() - cursor, path.display());
			file.set_len(cursor as u64)?;
			file.sync_data()?;
		}

		Ok((Self { path: path.to_owned(), file, len: cursor as u64 }, entries))
	}

	/// Appends one entry and syncs it.
	///
	/// On failure the file is cut back to its previous length, so a later
	/// append never follows a partial entry.
	pub(crate) fn append(&mut self, sequence: u64, op: &JournalOp) -> Result<(), StoreError> {
		let payload = postcard::to_stdvec(&EntryRef { schema_version: SCHEMA_VERSION, sequence, op })?;
		let len = u32::try_from(payload.len()).map_err(|_| StoreError::EntryTooLarge(payload.len()))?;

		let mut frame = Vec::with_capacity(LENGTH_PREFIX + payload.len());
		frame.extend_from_slice(&len.to_le_bytes());
		frame.extend_from_slice(&payload);

		let written = self.file.write_all(&frame).and_then(|()| self.file.sync_data());
		if let Err(err) = written {
			if let Err(truncate_err) = self.file.set_len(self.len) {
				warn!("Could not cut back {} after a failed append: {truncate_err}", self.path.display());
			}
			return Err(err.into());
		}
		self.len += frame.len() as u64;
		Ok(())
	}

	/// Empties the journal once a snapshot covers every entry.
	pub(crate) fn truncate(&mut self) -> Result<(), StoreError> {
		self.file.set_len(0)?;
		self.file.sync_data()?;
		self.len = 0;
		Ok(())
	}

	pub(crate) fn path(&self) -> &Path {
		&self.path
	}
}

/// Payload of the first complete frame of `bytes`, if any.
fn next_frame(bytes: &[u8]) -> Option<&[u8]> {
	let prefix: [u8; LENGTH_PREFIX] = bytes.get(..LENGTH_PREFIX)?.try_into().ok()?;
	let len = u32::from_le_bytes(prefix) as usize;
	bytes.get(LENGTH_PREFIX..LENGTH_PREFIX + len)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::scope::Scope;

	fn commit(first: &str, second: &str) -> JournalOp {
		let mut transaction = Transaction::new();
		transaction.record_pair(Scope::Community(1), first, second);
		JournalOp::Commit(transaction)
	}

	#[test]
	fn entries_come_back_in_order() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("chain.bin.journal");

		{
			let (mut journal, entries) = Journal::open(&path).unwrap();
			assert!(entries.is_empty());
			journal.append(1, &commit("a", "b")).unwrap();
			journal.append(2, &JournalOp::EraseCommunity(1)).unwrap();
		}

		let (_, entries) = Journal::open(&path).unwrap();
		assert_eq!(entries, vec![(1, commit("a", "b")), (2, JournalOp::EraseCommunity(1))]);
	}

	#[test]
	fn incomplete_last_entry_is_dropped() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("chain.bin.journal");
		{
			let (mut journal, _) = Journal::open(&path).unwrap();
			journal.append(1, &commit("a", "b")).unwrap();
			journal.append(2, &commit("c", "d")).unwrap();
		}
		let full = std::fs::metadata(&path).unwrap().len();
		OpenOptions::new().write(true).open(&path).unwrap().set_len(full - 2).unwrap();

		let (mut journal, entries) = Journal::open(&path).unwrap();
		assert_eq!(entries, vec![(1, commit("a", "b"))]);

		// The next entry lands right after the last complete one.
		journal.append(3, &commit("e", "f")).unwrap();
		let (_, entries) = Journal::open(&path).unwrap();
		assert_eq!(entries, vec![(1, commit("a", "b")), (3, commit("e", "f"))]);
	}

	#[test]
	fn truncate_empties_the_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("chain.bin.journal");
		let (mut journal, _) = Journal::open(&path).unwrap();
		journal.append(1, &commit("a", "b")).unwrap();
		journal.truncate().unwrap();

		assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
		let (_, entries) = Journal::open(&path).unwrap();
		assert!(entries.is_empty());
	}
}
