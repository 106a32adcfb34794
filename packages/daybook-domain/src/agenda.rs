//! Pre-populated sections for a freshly created daily note.

use time::OffsetDateTime;

use crate::{Priority, Sections};

pub struct AgendaTask<'a> {
	pub title: &'a str,
	pub completed: bool,
	pub priority: Priority,
}

pub struct AgendaEvent<'a> {
	pub title: &'a str,
	pub all_day: bool,
	pub start_time: OffsetDateTime,
}

/// One `- [x] title @priority` line per task.
pub fn render_tasks(tasks: &[AgendaTask<'_>]) -> String {
	tasks
		.iter()
		.map(|task| {
			let mark = if task.completed { 'x' } else { ' ' };

			format!("- [{mark}] {} @{}", task.title, task.priority)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// One `- HH:MM: title` (or `- All day: title`) line per event, earliest first.
pub fn render_events(events: &[AgendaEvent<'_>]) -> String {
	let mut ordered = events.iter().collect::<Vec<_>>();

	ordered.sort_by_key(|event| event.start_time);

	ordered
		.into_iter()
		.map(|event| {
			if event.all_day {
				format!("- All day: {}", event.title)
			} else {
				format!(
					"- {:02}:{:02}: {}",
					event.start_time.hour(),
					event.start_time.minute(),
					event.title
				)
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn today_sections(tasks: &[AgendaTask<'_>], events: &[AgendaEvent<'_>]) -> Sections {
	Sections::from([
		("tasks".to_string(), render_tasks(tasks)),
		("calendar".to_string(), render_events(events)),
		("notes".to_string(), String::new()),
		("completed".to_string(), String::new()),
	])
}
