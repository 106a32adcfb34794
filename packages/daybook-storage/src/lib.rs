pub mod companion;
pub mod daily_notes;
pub mod db;
pub mod events;
pub mod models;
pub mod schema;
pub mod tasks;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Escapes `%`, `_` and `\` so user text can be embedded in a `LIKE ... ESCAPE '\'` pattern.
pub fn escape_like(input: &str) -> String {
	let mut out = String::with_capacity(input.len());

	for ch in input.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
