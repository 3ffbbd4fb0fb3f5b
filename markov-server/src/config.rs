use std::path::{Path, PathBuf};

use serde::Deserialize;

use markov_core::ChainConfig;

/// Environment variable pointing to the JSON configuration file.
pub const CONFIG_ENV: &str = "MARKOV_CONFIG";

/// Server settings. Every field is optional in the JSON document.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Where the chain snapshot is loaded from and saved to.
	/// `None` keeps everything in memory.
	pub snapshot_path: Option<PathBuf>,
	/// Accept cross-origin requests from any origin.
	pub permissive_cors: bool,
	/// A generation request that takes longer is answered with a generic failure.
	pub generation_timeout_ms: u64,
	pub chain: ChainConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			snapshot_path: Some(PathBuf::from("./data/chain.bin")),
			permissive_cors: false,
			generation_timeout_ms: 3000,
			chain: ChainConfig::default(),
		}
	}
}

impl ServerConfig {
	/// Reads the file named by `MARKOV_CONFIG`, or returns the defaults
	/// when the variable is unset.
	pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
		match std::env::var_os(CONFIG_ENV) {
			Some(path) => Self::from_file(path),
			None => Ok(Self::default()),
		}
	}

	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
		let content = std::fs::read_to_string(path)?;
		Ok(serde_json::from_str(&content)?)
	}
}
