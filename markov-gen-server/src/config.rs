use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Name of the environment variable pointing at a JSON config file.
pub const CONFIG_ENV: &str = "MARKOV_GEN_CONFIG";

/// Server settings.
///
/// Every field is optional in the file; missing fields take the defaults
/// (`127.0.0.1:5000`, corpora in `./data`, order 2).
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Directory scanned for corpus files.
	pub data_dir: String,
	/// Order used when a load request does not give one.
	pub order: usize,
	/// Upper bound of `/v1/batch`.
	pub max_batch: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			data_dir: "./data".to_owned(),
			order: 2,
			max_batch: 1000,
		}
	}
}

impl ServerConfig {
	pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self, Box<dyn std::error::Error>> {
		let path = config_path.as_ref();
		let contents = fs::read_to_string(path)
			.map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
		let config: ServerConfig = serde_json::from_str(&contents)
			.map_err(|e| format!("Failed to deserialize JSON from {}: {}", path.display(), e))?;
		if config.order < 1 {
			return Err("order must be >= 1".into());
		}
		Ok(config)
	}

	/// Loads the file named by `MARKOV_GEN_CONFIG`, or the defaults when unset.
	pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
		match env::var(CONFIG_ENV) {
			Ok(path) => Self::load(path),
			Err(_) => Ok(Self::default()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_file_keeps_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.json");
		fs::write(&path, r#"{"port": 8080, "order": 3}"#).unwrap();
		let config = ServerConfig::load(&path).unwrap();
		assert_eq!(config.port, 8080);
		assert_eq!(config.order, 3);
		assert_eq!(config.host, "127.0.0.1");
		assert_eq!(config.data_dir, "./data");
	}

	#[test]
	fn rejects_zero_order() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.json");
		fs::write(&path, r#"{"order": 0}"#).unwrap();
		assert!(ServerConfig::load(&path).is_err());
	}

	#[test]
	fn missing_file_is_an_error() {
		assert!(ServerConfig::load("/definitely/not/here.json").is_err());
	}
}
