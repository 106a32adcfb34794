//! Daily note sections and their canonical markdown assembly.

use std::collections::BTreeMap;

/// Section name to section body. Non-preferred keys render in ascending key order.
pub type Sections = BTreeMap<String, String>;

/// Known sections, in render order, with their fixed headings.
pub const PREFERRED_SECTIONS: [(&str, &str); 4] = [
	("tasks", "## Tasks"),
	("calendar", "## Calendar"),
	("notes", "## Notes"),
	("completed", "## Completed"),
];

/// Renders sections into one markdown document.
///
/// Preferred sections come first, then the remaining keys with a title-cased heading. Empty
/// bodies are skipped and blocks are separated by a blank line.
pub fn assemble(sections: &Sections) -> String {
	let mut parts = Vec::with_capacity(sections.len());

	for (key, heading) in PREFERRED_SECTIONS {
		if let Some(body) = sections.get(key).filter(|body| !body.is_empty()) {
			parts.push(format!("{heading}\n{body}"));
		}
	}

	for (key, body) in sections {
		if body.is_empty() || is_preferred(key) {
			continue;
		}

		parts.push(format!("## {}\n{body}", title_case(key)));
	}

	parts.join("\n\n")
}

/// Shallow key-level merge. Patch values replace whole bodies; untouched keys survive.
pub fn merge_patch(existing: Option<Sections>, patch: &Sections) -> Sections {
	let mut merged = existing.unwrap_or_default();

	for (key, body) in patch {
		merged.insert(key.clone(), body.clone());
	}

	merged
}

/// Word-wise capitalization: a letter that follows another letter is lowercased, every other
/// letter is uppercased.
pub fn title_case(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut prev_is_alpha = false;

	for ch in input.chars() {
		if ch.is_alphabetic() {
			if prev_is_alpha {
				out.extend(ch.to_lowercase());
			} else {
				out.extend(ch.to_uppercase());
			}

			prev_is_alpha = true;
		} else {
			out.push(ch);

			prev_is_alpha = false;
		}
	}

	out
}

fn is_preferred(key: &str) -> bool {
	PREFERRED_SECTIONS.iter().any(|(preferred, _)| *preferred == key)
}
