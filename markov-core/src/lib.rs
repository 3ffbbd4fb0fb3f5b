//! Token-chain storage and generation library.
//!
//! This crate provides a first-order Markov chain engine over chat messages:
//! - Tokenization and normalization of raw message text
//! - A transactional pair/total store, partitioned by community and author
//! - Weighted random walk generation over the stored chain
//! - Detokenization back into readable text
//!
//! The high-level entry point is [`model::engine::MarkovEngine`]. Storage
//! internals are reachable through the [`model::chain_store::ChainStore`]
//! trait so that another backend can be plugged in.

/// Engine configuration (token limits, iteration cap, exclusion cap).
pub mod config;

/// Error taxonomy for storage, generation and exclusion lists.
pub mod error;

/// Tokenizer, chain store, generator and the engine facade.
pub mod model;

/// I/O utilities (corpus loading, snapshot and journal paths).
///
/// Not exposed
pub(crate) mod io;

pub use config::ChainConfig;
pub use error::{ConsistencyError, ExclusionError, GENERIC_FAILURE_MESSAGE, GenerationError, StoreError};
pub use model::engine::MarkovEngine;
pub use model::scope::{AuthorId, CommunityId, Scope};
