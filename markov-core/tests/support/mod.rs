#![allow(dead_code)]

use rand::RngCore;

use markov_core::model::exclusions::Exclusions;
use markov_core::{ChainConfig, MarkovEngine};

/// Random source whose every range draw lands on the low end.
pub struct LowestDraw;

impl RngCore for LowestDraw {
	fn next_u32(&mut self) -> u32 {
		0
	}

	fn next_u64(&mut self) -> u64 {
		0
	}

	fn fill_bytes(&mut self, dst: &mut [u8]) {
		dst.fill(0);
	}
}

/// Random source whose every range draw lands on the high end.
pub struct HighestDraw;

impl RngCore for HighestDraw {
	fn next_u32(&mut self) -> u32 {
		u32::MAX
	}

	fn next_u64(&mut self) -> u64 {
		u64::MAX
	}

	fn fill_bytes(&mut self, dst: &mut [u8]) {
		dst.fill(u8::MAX);
	}
}

pub fn engine() -> MarkovEngine {
	MarkovEngine::in_memory(ChainConfig::default())
}

pub fn ingest_all(engine: &MarkovEngine, community: u64, author: u64, messages: &[&str]) {
	for message in messages {
		engine.ingest(message, community, author, &Exclusions::default()).unwrap();
	}
}
