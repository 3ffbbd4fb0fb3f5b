//! Top-level module for the token chain engine.
//!
//! This module provides:
//! - Tokenization and detokenization (`tokenizer`, `detokenizer`)
//! - Scopes and identifier encoding (`scope`)
//! - Exclusion lists injected per call (`exclusions`)
//! - The transactional pair/total store (`transaction`, `chain_store`)
//! - The weighted random walk (`generator`)
//! - A high-level facade (`engine`)

/// High-level facade: ingest, generate, erase, bulk import.
pub mod engine;

/// Weighted random walk over a chain store.
pub mod generator;

/// Chain store trait and its journaled, snapshot-backed implementation.
pub mod chain_store;

/// All-or-nothing batches of insert-or-increment writes.
pub mod transaction;

/// Community and author scopes, and their storage keys.
pub mod scope;

/// Bounded blacklist/ignore string lists.
pub mod exclusions;

/// Raw text to sentinel-framed tokens.
pub mod tokenizer;

/// Tokens back to readable text.
pub mod detokenizer;

/// Pair entries of one scope, grouped by first token.
///
/// Not exposed
mod pair_table;

/// Write-ahead log of store mutations.
///
/// Not exposed
mod journal;

/// Outgoing edges of one first token, kept in enumeration order.
///
/// Not exposed
mod state;
