pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Vault write failed: {message}")]
	Vault { message: String },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}

	pub(crate) fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound { message: message.into() }
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<daybook_storage::Error> for Error {
	fn from(err: daybook_storage::Error) -> Self {
		match err {
			daybook_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			daybook_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			daybook_storage::Error::NotFound(message) => Self::NotFound { message },
			daybook_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<daybook_vault::Error> for Error {
	fn from(err: daybook_vault::Error) -> Self {
		let message = match &err {
			daybook_vault::Error::CreateDir { source, .. }
			| daybook_vault::Error::Write { source, .. } => format!("{err} {source}"),
			daybook_vault::Error::NameExhausted { .. } => err.to_string(),
		};

		Self::Vault { message }
	}
}
