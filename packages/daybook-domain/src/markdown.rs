//! Markdown files exported into the vault.

use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};

/// Front matter block, blank line, body, trailing newline.
pub fn render_with_front_matter(fields: &[(&str, String)], body: &str) -> String {
	let mut out = String::from("---\n");

	for (key, value) in fields {
		out.push_str(key);
		out.push_str(": ");
		out.push_str(value);
		out.push('\n');
	}

	out.push_str("---\n\n");
	out.push_str(body);
	out.push('\n');

	out
}

pub fn front_matter_timestamp(ts: OffsetDateTime) -> Result<String, time::error::Format> {
	ts.format(&Rfc3339)
}

/// `{date}.md` for the first attempt, `{date}-{n}.md` from the second attempt on.
pub fn dated_file_name(date: Date, attempt: u32) -> String {
	let base = crate::dates::format_iso_date(date);

	if attempt <= 1 { format!("{base}.md") } else { format!("{base}-{attempt}.md") }
}
