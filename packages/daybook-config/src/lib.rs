mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Postgres, Security, Service, Storage, Vault};

use std::{
	fs,
	net::SocketAddr,
	path::{Component, Path},
};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(path, &raw)
}

pub fn parse(path: &Path, raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let http_addr: SocketAddr = cfg.service.http_bind.parse().map_err(|_| Error::Validation {
		message: "service.http_bind must be a socket address such as 127.0.0.1:8000.".to_string(),
	})?;

	if cfg.security.bind_localhost_only && !http_addr.ip().is_loopback() {
		return Err(Error::Validation {
			message: "service.http_bind must be a loopback address when security.bind_localhost_only is true."
				.to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for origin in &cfg.service.cors_origins {
		if !is_cors_origin(origin) {
			return Err(Error::Validation {
				message: format!(
					"service.cors_origins entry {origin:?} must be a scheme and host such as http://localhost:3000."
				),
			});
		}
	}

	for (label, dir) in [
		("vault.living_context_dir", &cfg.vault.living_context_dir),
		("vault.session_summary_dir", &cfg.vault.session_summary_dir),
	] {
		if dir.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
		if !is_vault_relative(dir) {
			return Err(Error::Validation {
				message: format!("{label} must be a relative path that stays inside the vault."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.vault
		.root
		.as_deref()
		.map(|root| root.to_string_lossy().trim().is_empty())
		.unwrap_or(false)
	{
		cfg.vault.root = None;
	}

	for origin in &mut cfg.service.cors_origins {
		*origin = origin.trim().trim_end_matches('/').to_string();
	}

	cfg.vault.living_context_dir = cfg.vault.living_context_dir.trim().to_string();
	cfg.vault.session_summary_dir = cfg.vault.session_summary_dir.trim().to_string();
}

fn is_vault_relative(dir: &str) -> bool {
	Path::new(dir).components().all(|component| matches!(component, Component::Normal(_)))
}

fn is_cors_origin(origin: &str) -> bool {
	let Some((scheme, authority)) = origin.split_once("://") else {
		return false;
	};

	matches!(scheme, "http" | "https")
		&& !authority.is_empty()
		&& !authority.contains(['/', '*'])
		&& authority.chars().all(|ch| ch.is_ascii_graphic())
}
