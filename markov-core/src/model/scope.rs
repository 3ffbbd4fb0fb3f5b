use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a community (server, workspace, guild...).
pub type CommunityId = u64;

/// Identifier of a message author inside a community.
pub type AuthorId = u64;

/// Partition a chain belongs to.
///
/// The author chain is stored and queried independently of the community
/// chain: nothing is inherited at read time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
	Community(CommunityId),
	Author(CommunityId, AuthorId),
}

impl Scope {
	/// Builds the author scope when `author` is given, the community scope otherwise.
	pub fn for_member(community: CommunityId, author: Option<AuthorId>) -> Self {
		match author {
			Some(author) => Scope::Author(community, author),
			None => Scope::Community(community),
		}
	}

	pub(crate) fn key(&self) -> ScopeKey {
		match self {
			Scope::Community(community) => ScopeKey::Community(CommunityKey::new(*community)),
			Scope::Author(community, author) => ScopeKey::Author(AuthorKey::new(*community, *author)),
		}
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Scope::Community(community) => write!(f, "community {community}"),
			Scope::Author(community, author) => write!(f, "author {author} in community {community}"),
		}
	}
}

/// The pair of scopes a single message feeds: its community and its author.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngestScopes {
	pub community: CommunityId,
	pub author: AuthorId,
}

impl IngestScopes {
	pub fn new(community: CommunityId, author: AuthorId) -> Self {
		Self { community, author }
	}

	pub fn community_scope(&self) -> Scope {
		Scope::Community(self.community)
	}

	pub fn author_scope(&self) -> Scope {
		Scope::Author(self.community, self.author)
	}
}

/// Encodes an unsigned identifier as a minimal big-endian byte string.
///
/// `0` encodes to the empty string. The width of stored identifiers is
/// therefore independent of any native integer type of the backend.
pub(crate) fn encode_uint(value: u64) -> Vec<u8> {
	let bytes = value.to_be_bytes();
	let skip = bytes.iter().take_while(|b| **b == 0).count();
	bytes[skip..].to_vec()
}

/// Inverse of [`encode_uint`]. Returns `None` for strings longer than 8 bytes.
pub(crate) fn decode_uint(bytes: &[u8]) -> Option<u64> {
	if bytes.len() > 8 {
		return None;
	}
	Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct CommunityKey(Vec<u8>);

impl CommunityKey {
	pub(crate) fn new(community: CommunityId) -> Self {
		Self(encode_uint(community))
	}

	pub(crate) fn scope(&self) -> Option<Scope> {
		Some(Scope::Community(decode_uint(&self.0)?))
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct AuthorKey {
	community: Vec<u8>,
	author: Vec<u8>,
}

impl AuthorKey {
	pub(crate) fn new(community: CommunityId, author: AuthorId) -> Self {
		Self { community: encode_uint(community), author: encode_uint(author) }
	}

	/// Smallest key of `community`: the empty string encodes author `0`.
	pub(crate) fn first_of(community: &CommunityKey) -> Self {
		Self { community: community.0.clone(), author: Vec::new() }
	}

	pub(crate) fn belongs_to(&self, community: &CommunityKey) -> bool {
		self.community == community.0
	}

	/// Decodes the key back into a scope (used by audit reports).
	pub(crate) fn scope(&self) -> Option<Scope> {
		Some(Scope::Author(decode_uint(&self.community)?, decode_uint(&self.author)?))
	}
}

/// Storage key of a scope, discriminated by scope kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ScopeKey {
	Community(CommunityKey),
	Author(AuthorKey),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encodes_minimal_big_endian() {
		assert_eq!(encode_uint(0), Vec::<u8>::new());
		assert_eq!(encode_uint(1), vec![1]);
		assert_eq!(encode_uint(255), vec![255]);
		assert_eq!(encode_uint(256), vec![1, 0]);
		assert_eq!(encode_uint(u64::MAX), vec![255; 8]);
	}

	#[test]
	fn decode_reverses_encode() {
		for value in [0, 1, 255, 256, 551742410770612234, u64::MAX] {
			assert_eq!(decode_uint(&encode_uint(value)), Some(value));
		}
		assert_eq!(decode_uint(&[1; 9]), None);
	}

	#[test]
	fn author_key_is_bound_to_its_community() {
		let key = AuthorKey::new(7, 9);
		assert!(key.belongs_to(&CommunityKey::new(7)));
		assert!(!key.belongs_to(&CommunityKey::new(8)));
		assert_eq!(key.scope(), Some(Scope::Author(7, 9)));
	}

	#[test]
	fn member_scope_selection() {
		assert_eq!(Scope::for_member(3, None), Scope::Community(3));
		assert_eq!(Scope::for_member(3, Some(4)), Scope::Author(3, 4));
	}
}
