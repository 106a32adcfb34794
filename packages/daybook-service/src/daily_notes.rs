//! Daily notes keyed by calendar date.
//!
//! `content` is a cache of the assembled sections. Every path that writes `sections` also
//! rewrites `content` in the same statement, except a full replace that supplies `content`
//! explicitly.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json;
use time::{Date, OffsetDateTime};

use crate::{DaybookService, Error, Result};
use daybook_domain::{
	Priority, Sections,
	agenda::{self, AgendaEvent, AgendaTask},
	dates, sections,
};
use daybook_storage::{daily_notes, events, models::DailyNote, tasks};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListDailyNotesRequest {
	pub start_date: Option<String>,
	pub end_date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateDailyNoteRequest {
	pub date: String,
	pub title: Option<String>,
	pub sections: Option<Sections>,
	pub obsidian_path: Option<String>,
	#[serde(default)]
	pub obsidian_synced: bool,
}

/// Full replace. Any provided field overwrites the stored one, and an explicit `null` clears
/// `title`, `content` or `obsidian_path`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReplaceDailyNoteRequest {
	#[serde(
		default,
		deserialize_with = "crate::nullable::deserialize",
		skip_serializing_if = "Option::is_none"
	)]
	pub title: Option<Option<String>>,
	#[serde(
		default,
		deserialize_with = "crate::nullable::deserialize",
		skip_serializing_if = "Option::is_none"
	)]
	pub content: Option<Option<String>>,
	pub sections: Option<Sections>,
	#[serde(
		default,
		deserialize_with = "crate::nullable::deserialize",
		skip_serializing_if = "Option::is_none"
	)]
	pub obsidian_path: Option<Option<String>>,
	pub obsidian_synced: Option<bool>,
}

/// Partial update. `sections` is merged key by key into the stored sections.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatchDailyNoteRequest {
	pub sections: Option<Sections>,
	pub obsidian_path: Option<String>,
	pub obsidian_synced: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyNoteItem {
	pub date: String,
	pub title: Option<String>,
	pub content: Option<String>,
	pub sections: Option<Sections>,
	pub obsidian_path: Option<String>,
	pub obsidian_synced: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl From<DailyNote> for DailyNoteItem {
	fn from(note: DailyNote) -> Self {
		Self {
			date: dates::format_iso_date(note.date),
			title: note.title,
			content: note.content,
			sections: note.sections.map(|Json(sections)| sections),
			obsidian_path: note.obsidian_path,
			obsidian_synced: note.obsidian_synced,
			created_at: note.created_at,
			updated_at: note.updated_at,
		}
	}
}

impl DaybookService {
	/// Newest first. Both bounds are inclusive.
	pub async fn list_daily_notes(&self, req: ListDailyNotesRequest) -> Result<Vec<DailyNoteItem>> {
		let start = crate::parse_optional_date("start_date", req.start_date.as_deref())?;
		let end = crate::parse_optional_date("end_date", req.end_date.as_deref())?;
		let rows = daily_notes::list_daily_notes(&self.db.pool, start, end).await?;

		Ok(rows.into_iter().map(DailyNoteItem::from).collect())
	}

	/// Returns the note for the current UTC date, creating it from today's agenda if needed.
	pub async fn get_today(&self) -> Result<DailyNoteItem> {
		self.get_or_create_daily_note(OffsetDateTime::now_utc().date()).await
	}

	/// Returns the note for `date`, creating it from the tasks due and events scheduled that day
	/// when none exists. Concurrent callers converge on the same row.
	pub async fn get_or_create_daily_note(&self, date: Date) -> Result<DailyNoteItem> {
		if let Some(note) = daily_notes::get_daily_note(&self.db.pool, date).await? {
			return Ok(note.into());
		}

		let sections = self.agenda_sections(date).await?;
		let note = DailyNote {
			date,
			title: Some(default_title(date)),
			content: Some(sections::assemble(&sections)),
			sections: Some(Json(sections)),
			obsidian_path: None,
			obsidian_synced: false,
			created_at: OffsetDateTime::now_utc(),
			updated_at: None,
		};
		let inserted = daily_notes::insert_daily_note(&self.db.pool, &note).await?;
		let stored = daily_notes::get_daily_note(&self.db.pool, date)
			.await?
			.ok_or_else(|| Error::not_found("Daily note not found."))?;
		let item = DailyNoteItem::from(stored);

		if inserted {
			tracing::info!(date = %item.date, "Created daily note from agenda.");

			self.broadcast("daily_note_created", &item);
		}

		Ok(item)
	}

	pub async fn get_daily_note(&self, date: &str) -> Result<DailyNoteItem> {
		let date = crate::parse_date("date", date)?;
		let note = daily_notes::get_daily_note(&self.db.pool, date)
			.await?
			.ok_or_else(|| Error::not_found("Daily note not found."))?;

		Ok(note.into())
	}

	pub async fn create_daily_note(&self, req: CreateDailyNoteRequest) -> Result<DailyNoteItem> {
		let date = crate::parse_date("date", &req.date)?;
		let title = match req.title.filter(|title| !title.trim().is_empty()) {
			Some(title) => title,
			None => default_title(date),
		};
		let sections = req.sections.unwrap_or_default();
		let content = (!sections.is_empty()).then(|| sections::assemble(&sections));
		let note = DailyNote {
			date,
			title: Some(title),
			content,
			sections: Some(Json(sections)),
			obsidian_path: req.obsidian_path,
			obsidian_synced: req.obsidian_synced,
			created_at: OffsetDateTime::now_utc(),
			updated_at: None,
		};

		if !daily_notes::insert_daily_note(&self.db.pool, &note).await? {
			tracing::info!(date = %req.date, "Rejected duplicate daily note.");

			return Err(Error::Conflict {
				message: "Daily note already exists for this date.".to_string(),
			});
		}

		let item = DailyNoteItem::from(note);

		self.broadcast("daily_note_created", &item);

		Ok(item)
	}

	pub async fn replace_daily_note(
		&self,
		date: &str,
		req: ReplaceDailyNoteRequest,
	) -> Result<DailyNoteItem> {
		let date = crate::parse_date("date", date)?;
		let mut tx = self.db.pool.begin().await?;
		let mut note = daily_notes::get_daily_note_for_update(&mut *tx, date)
			.await?
			.ok_or_else(|| Error::not_found("Daily note not found."))?;

		match (req.sections, req.content) {
			(Some(sections), None) => {
				note.content = Some(sections::assemble(&sections));
				note.sections = Some(Json(sections));
			},
			(Some(sections), Some(content)) => {
				note.content = content;
				note.sections = Some(Json(sections));
			},
			(None, Some(content)) => note.content = content,
			(None, None) => {},
		}

		if let Some(title) = req.title {
			note.title = title;
		}
		if let Some(obsidian_path) = req.obsidian_path {
			note.obsidian_path = obsidian_path;
		}
		if let Some(obsidian_synced) = req.obsidian_synced {
			note.obsidian_synced = obsidian_synced;
		}

		note.updated_at = Some(OffsetDateTime::now_utc());

		daily_notes::update_daily_note(&mut *tx, &note).await?;

		tx.commit().await?;

		let item = DailyNoteItem::from(note);

		self.broadcast("daily_note_updated", &item);

		Ok(item)
	}

	pub async fn patch_daily_note(
		&self,
		date: &str,
		req: PatchDailyNoteRequest,
	) -> Result<DailyNoteItem> {
		let date = crate::parse_date("date", date)?;
		let mut tx = self.db.pool.begin().await?;
		let mut note = daily_notes::get_daily_note_for_update(&mut *tx, date)
			.await?
			.ok_or_else(|| Error::not_found("Daily note not found."))?;

		if let Some(patch) = req.sections.as_ref() {
			let existing = note.sections.take().map(|Json(sections)| sections);
			let merged = sections::merge_patch(existing, patch);

			note.content = Some(sections::assemble(&merged));
			note.sections = Some(Json(merged));
		}
		if let Some(obsidian_path) = req.obsidian_path {
			note.obsidian_path = Some(obsidian_path);
		}
		if let Some(obsidian_synced) = req.obsidian_synced {
			note.obsidian_synced = obsidian_synced;
		}

		note.updated_at = Some(OffsetDateTime::now_utc());

		daily_notes::update_daily_note(&mut *tx, &note).await?;

		tx.commit().await?;

		let item = DailyNoteItem::from(note);

		self.broadcast("daily_note_updated", &item);

		Ok(item)
	}

	pub async fn delete_daily_note(&self, date: &str) -> Result<()> {
		let date = crate::parse_date("date", date)?;

		if !daily_notes::delete_daily_note(&self.db.pool, date).await? {
			return Err(Error::not_found("Daily note not found."));
		}

		self.broadcast("daily_note_deleted", &json!({ "date": dates::format_iso_date(date) }));

		Ok(())
	}

	async fn agenda_sections(&self, date: Date) -> Result<Sections> {
		let due = tasks::list_tasks_due_on(&self.db.pool, date).await?;
		let (day_start, day_end) = dates::day_window(date);
		let scheduled = events::list_events_overlapping(&self.db.pool, day_start, day_end).await?;
		let agenda_tasks = due
			.iter()
			.map(|task| {
				let priority = task.priority.parse::<Priority>().map_err(|message| {
					Error::Storage { message: format!("Task {} has {message}", task.id) }
				})?;

				Ok(AgendaTask { title: &task.title, completed: task.completed, priority })
			})
			.collect::<Result<Vec<_>>>()?;
		let agenda_events = scheduled
			.iter()
			.map(|event| AgendaEvent {
				title: &event.title,
				all_day: event.all_day,
				start_time: event.start_time,
			})
			.collect::<Vec<_>>();

		Ok(agenda::today_sections(&agenda_tasks, &agenda_events))
	}
}

fn default_title(date: Date) -> String {
	format!("Daily Note - {}", dates::format_iso_date(date))
}
