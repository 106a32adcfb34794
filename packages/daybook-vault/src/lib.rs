pub mod fs;

mod error;

pub use error::{Error, Result};
pub use fs::{LocalFs, VaultFs};

use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
	sync::Arc,
};

use time::{Date, OffsetDateTime};

use daybook_domain::{dates, markdown};

const MAX_NAME_ATTEMPTS: u32 = 10_000;
const MAX_WRITE_RACES: u32 = 3;

/// Where a record landed in the vault. Both fields are `None` when no vault is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
	pub obsidian_path: Option<String>,
	pub synced_at: Option<OffsetDateTime>,
}
#[derive(Clone)]
pub struct Vault {
	root: Option<PathBuf>,
	fs: Arc<dyn VaultFs>,
}
impl Vault {
	pub fn new(cfg: &daybook_config::Vault) -> Self {
		Self::with_fs(cfg.root.clone(), Arc::new(LocalFs))
	}

	pub fn with_fs(root: Option<PathBuf>, fs: Arc<dyn VaultFs>) -> Self {
		Self { root, fs }
	}

	pub fn disabled() -> Self {
		Self::with_fs(None, Arc::new(LocalFs))
	}

	pub fn root(&self) -> Option<&Path> {
		self.root.as_deref()
	}

	/// Writes `markdown` to a fresh dated file under `root/subdir`.
	pub fn sync(&self, subdir: &str, date: Date, markdown: &str) -> Result<SyncOutcome> {
		let Some(root) = self.root.as_deref() else {
			tracing::debug!(subdir, "Vault root is not configured. Skipping vault write.");

			return Ok(SyncOutcome::default());
		};
		let folder = root.join(subdir);

		self.fs
			.create_dir_all(&folder)
			.map_err(|err| Error::CreateDir { path: folder.clone(), source: err })?;

		let mut first_attempt = 1;

		for _ in 0..MAX_WRITE_RACES {
			let (attempt, file_name, path) =
				next_free_name(self.fs.as_ref(), &folder, date, first_attempt)?;

			match self.fs.write_new(&path, markdown) {
				Ok(()) => {
					let relative = format!("{subdir}/{file_name}");

					tracing::info!(obsidian_path = %relative, "Wrote vault file.");

					return Ok(SyncOutcome {
						obsidian_path: Some(relative),
						synced_at: Some(OffsetDateTime::now_utc()),
					});
				},
				Err(err) if err.kind() == ErrorKind::AlreadyExists => {
					tracing::warn!(path = %path.display(), "Vault file appeared before write. Retrying.");

					first_attempt = attempt + 1;
				},
				Err(err) => return Err(Error::Write { path, source: err }),
			}
		}

		Err(Error::NameExhausted { folder, date: dates::format_iso_date(date) })
	}
}

/// Returns the first unused `{date}.md`, `{date}-2.md`, ... name in `folder`.
pub fn derive_filename(fs: &dyn VaultFs, folder: &Path, date: Date) -> Result<(String, PathBuf)> {
	let (_, file_name, path) = next_free_name(fs, folder, date, 1)?;

	Ok((file_name, path))
}

fn next_free_name(
	fs: &dyn VaultFs,
	folder: &Path,
	date: Date,
	first_attempt: u32,
) -> Result<(u32, String, PathBuf)> {
	for attempt in first_attempt..=MAX_NAME_ATTEMPTS {
		let file_name = markdown::dated_file_name(date, attempt);
		let path = folder.join(&file_name);

		if !fs.exists(&path) {
			return Ok((attempt, file_name, path));
		}
	}

	Err(Error::NameExhausted {
		folder: folder.to_path_buf(),
		date: dates::format_iso_date(date),
	})
}
