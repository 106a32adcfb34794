use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub vault: Vault,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Browser origins allowed to call the API, such as `http://localhost:3000`.
	#[serde(default = "default_cors_origins")]
	pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// External markdown vault that therapy companion records are exported into.
#[derive(Debug, Deserialize)]
pub struct Vault {
	/// Optional. A blank value is normalized to `None`, which disables vault writes.
	pub root: Option<PathBuf>,
	#[serde(default = "default_living_context_dir")]
	pub living_context_dir: String,
	#[serde(default = "default_session_summary_dir")]
	pub session_summary_dir: String,
}
impl Default for Vault {
	fn default() -> Self {
		Self {
			root: None,
			living_context_dir: default_living_context_dir(),
			session_summary_dir: default_session_summary_dir(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_cors_origins() -> Vec<String> {
	vec!["http://localhost:3000".to_string(), "http://localhost:3001".to_string()]
}

fn default_living_context_dir() -> String {
	"Therapy Companion/Living Context".to_string()
}

fn default_session_summary_dir() -> String {
	"Therapy Companion/Session Summaries".to_string()
}
