use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to create vault folder at {path:?}.")]
	CreateDir { path: PathBuf, source: std::io::Error },
	#[error("Failed to write vault file at {path:?}.")]
	Write { path: PathBuf, source: std::io::Error },
	#[error("No free file name left for {date} in {folder:?}.")]
	NameExhausted { folder: PathBuf, date: String },
}
