use daybook_domain::{
	Sections,
	sections::{self, assemble, merge_patch, title_case},
};

fn sections_of(pairs: &[(&str, &str)]) -> Sections {
	pairs.iter().map(|(key, body)| (key.to_string(), body.to_string())).collect()
}

#[test]
fn renders_only_non_empty_sections() {
	let sections = sections_of(&[
		("tasks", "- [ ] Buy milk @medium"),
		("calendar", ""),
		("notes", ""),
		("completed", ""),
	]);

	assert_eq!(assemble(&sections), "## Tasks\n- [ ] Buy milk @medium");
}

#[test]
fn empty_mapping_renders_empty_document() {
	assert_eq!(assemble(&Sections::new()), "");
}

#[test]
fn preferred_sections_render_first_in_fixed_order() {
	let sections = sections_of(&[
		("completed", "- [x] Ship it @high"),
		("alpha", "first custom"),
		("notes", "Felt focused."),
		("tasks", "- [ ] Write report @low"),
		("calendar", "- 09:00: Standup"),
	]);

	assert_eq!(
		assemble(&sections),
		"## Tasks\n- [ ] Write report @low\n\n\
		 ## Calendar\n- 09:00: Standup\n\n\
		 ## Notes\nFelt focused.\n\n\
		 ## Completed\n- [x] Ship it @high\n\n\
		 ## Alpha\nfirst custom"
	);
}

#[test]
fn custom_sections_follow_stable_key_order() {
	let sections = sections_of(&[("zeta", "z"), ("gratitude", "g"), ("mood_log", "m")]);

	assert_eq!(assemble(&sections), "## Gratitude\ng\n\n## Mood_Log\nm\n\n## Zeta\nz");
}

#[test]
fn assembly_is_deterministic_regardless_of_insertion_order() {
	let forward = sections_of(&[("tasks", "a"), ("ideas", "b"), ("notes", "c"), ("log", "d")]);
	let mut reversed = Sections::new();

	for (key, body) in forward.iter().rev() {
		reversed.insert(key.clone(), body.clone());
	}

	let first = assemble(&forward);

	assert_eq!(first, assemble(&forward));
	assert_eq!(first, assemble(&reversed));
}

#[test]
fn whitespace_only_body_is_still_rendered() {
	let sections = sections_of(&[("notes", " ")]);

	assert_eq!(assemble(&sections), "## Notes\n ");
}

#[test]
fn merge_replaces_patched_keys_and_keeps_the_rest() {
	let existing = sections_of(&[("tasks", "A"), ("notes", "B")]);
	let patch = sections_of(&[("tasks", "C")]);
	let merged = merge_patch(Some(existing), &patch);

	assert_eq!(merged, sections_of(&[("tasks", "C"), ("notes", "B")]));
}

#[test]
fn merge_adds_new_keys_and_accepts_missing_existing() {
	let patch = sections_of(&[("gratitude", "Sunny walk")]);

	assert_eq!(merge_patch(None, &patch), patch);

	let merged = merge_patch(Some(sections_of(&[("tasks", "A")])), &patch);

	assert_eq!(merged.len(), 2);
	assert_eq!(merged["gratitude"], "Sunny walk");
}

#[test]
fn merge_with_empty_value_clears_section_from_document() {
	let existing = sections_of(&[("tasks", "A"), ("notes", "B")]);
	let merged = merge_patch(Some(existing), &sections_of(&[("notes", "")]));

	assert_eq!(merged["notes"], "");
	assert_eq!(assemble(&merged), "## Tasks\nA");
}

#[test]
fn title_case_capitalizes_each_word() {
	assert_eq!(title_case("gratitude"), "Gratitude");
	assert_eq!(title_case("follow_ups"), "Follow_Ups");
	assert_eq!(title_case("my NOTES"), "My Notes");
	assert_eq!(title_case("q3review"), "Q3Review");
	assert_eq!(title_case(""), "");
}

#[test]
fn preferred_headings_are_fixed_labels() {
	let labels = sections::PREFERRED_SECTIONS.iter().map(|(_, label)| *label).collect::<Vec<_>>();

	assert_eq!(labels, ["## Tasks", "## Calendar", "## Notes", "## Completed"]);
}
