use std::fs;
use std::path::PathBuf;

use log::warn;
use lyrics_gen_core::{GeneratorConfig, normalize_folder};
use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "LYRICS_GEN_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "lyrics-gen.json";

/// Server settings.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	/// Folder holding the lyric corpora.
	#[serde(default = "default_data_dir")]
	pub data_dir: String,
	/// Folder where trained models are saved.
	#[serde(default = "default_model_dir")]
	pub model_dir: String,
	/// Defaults for every trained generator.
	#[serde(default)]
	pub generator: GeneratorConfig,
}

fn default_host() -> String {
	"127.0.0.1".to_owned()
}

fn default_port() -> u16 {
	5000
}

fn default_data_dir() -> String {
	"./data".to_owned()
}

fn default_model_dir() -> String {
	"./models".to_owned()
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			data_dir: default_data_dir(),
			model_dir: default_model_dir(),
			generator: GeneratorConfig::default(),
		}
	}
}

impl ServerConfig {
	pub fn data_path(&self) -> PathBuf {
		normalize_folder(&self.data_dir)
	}

	pub fn model_path(&self) -> PathBuf {
		normalize_folder(&self.model_dir)
	}
}

/// Configuration file path: `$LYRICS_GEN_CONFIG`, else `./lyrics-gen.json`.
pub fn config_path() -> PathBuf {
	std::env::var_os(CONFIG_ENV)
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Loads the configuration (defaults if the file is missing or invalid).
pub fn load_config() -> ServerConfig {
	let path = config_path();
	match fs::read_to_string(&path) {
		Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
			warn!("invalid configuration {}: {}, using defaults", path.display(), e);
			ServerConfig::default()
		}),
		Err(e) => {
			warn!("cannot read configuration {}: {}, using defaults", path.display(), e);
			ServerConfig::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use lyrics_gen_core::Tokenizer;

	#[test]
	fn missing_file_yields_defaults() {
		let dir = tempfile::tempdir().unwrap();
		// SAFETY: no other test of this crate reads or writes the variable
		unsafe { std::env::set_var(CONFIG_ENV, dir.path().join("absent.json")) };
		let config = load_config();
		unsafe { std::env::remove_var(CONFIG_ENV) };
		assert_eq!(config.port, 5000);
		assert_eq!(config.model_dir, "./models");
		assert_eq!(config.generator, GeneratorConfig::default());
	}

	#[test]
	fn partial_file_keeps_defaults() {
		let config: ServerConfig =
			serde_json::from_str(r#"{ "port": 8080, "generator": { "order": 3, "tokenizer": "whitespace" } }"#).unwrap();
		assert_eq!(config.port, 8080);
		assert_eq!(config.host, "127.0.0.1");
		assert_eq!(config.data_dir, "./data");
		assert_eq!(config.generator.order, 3);
		assert_eq!(config.generator.tokenizer, Tokenizer::Whitespace);
		assert!(config.generator.backoff);
	}
}
