use std::{
	fs::{self, OpenOptions},
	io::{self, Write},
	path::Path,
};

/// Filesystem operations the vault sync relies on.
pub trait VaultFs
where
	Self: Send + Sync,
{
	fn exists(&self, path: &Path) -> bool;

	fn create_dir_all(&self, path: &Path) -> io::Result<()>;

	/// Creates `path` and writes `contents`. Fails with `AlreadyExists` instead of overwriting.
	fn write_new(&self, path: &Path, contents: &str) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;
impl VaultFs for LocalFs {
	fn exists(&self, path: &Path) -> bool {
		path.exists()
	}

	fn create_dir_all(&self, path: &Path) -> io::Result<()> {
		fs::create_dir_all(path)
	}

	fn write_new(&self, path: &Path, contents: &str) -> io::Result<()> {
		let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
		let written = file.write_all(contents.as_bytes()).and_then(|()| file.sync_all());

		remove_on_error(path, written)
	}
}

/// Deletes a file this process just created when filling it failed, so the name is free again.
fn remove_on_error(path: &Path, written: io::Result<()>) -> io::Result<()> {
	let Err(err) = written else {
		return Ok(());
	};

	if let Err(cleanup) = fs::remove_file(path) {
		tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial vault file.");
	}

	Err(err)
}

#[cfg(test)]
mod tests {
	use std::{fs, io};

	use super::remove_on_error;

	#[test]
	fn failed_fill_removes_the_partial_file() {
		let dir = tempfile::TempDir::new().expect("Failed to create temp dir.");
		let path = dir.path().join("2026-02-22.md");

		fs::write(&path, "---\nupdated_at").expect("Failed to seed partial file.");

		let err = remove_on_error(&path, Err(io::Error::other("disk full")))
			.expect_err("Fill error must be returned.");

		assert_eq!(err.to_string(), "disk full");
		assert!(!path.exists());
	}

	#[test]
	fn successful_fill_keeps_the_file() {
		let dir = tempfile::TempDir::new().expect("Failed to create temp dir.");
		let path = dir.path().join("2026-02-22.md");

		fs::write(&path, "body").expect("Failed to seed file.");

		remove_on_error(&path, Ok(())).expect("Fill succeeded.");

		assert!(path.exists());
	}
}
