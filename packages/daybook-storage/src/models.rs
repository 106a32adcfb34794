use std::collections::BTreeMap;

use serde_json::Value;
use sqlx::types::Json;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Task {
	pub id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub completed: bool,
	pub priority: String,
	pub due_date: Option<Date>,
	pub tags: Vec<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: Option<OffsetDateTime>,
}

/// Column-level patch for a task. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct TaskChanges<'a> {
	pub title: Option<&'a str>,
	pub description: Option<&'a str>,
	pub completed: Option<bool>,
	pub priority: Option<&'a str>,
	pub due_date: Option<Date>,
	pub tags: Option<&'a [String]>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Event {
	pub id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub start_time: OffsetDateTime,
	pub end_time: OffsetDateTime,
	pub all_day: bool,
	pub location: Option<String>,
	pub recurrence_rule: Option<String>,
	pub status: String,
	pub event_type: Option<String>,
	pub color: Option<String>,
	pub tags: Vec<String>,
	pub attendees: Value,
	pub reminders: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Default)]
pub struct EventFilter<'a> {
	/// Events ending at or after this instant.
	pub starts_after: Option<OffsetDateTime>,
	/// Events starting at or before this instant.
	pub ends_before: Option<OffsetDateTime>,
	pub event_type: Option<&'a str>,
	pub status: Option<&'a str>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyNote {
	pub date: Date,
	pub title: Option<String>,
	pub content: Option<String>,
	pub sections: Option<Json<BTreeMap<String, String>>>,
	pub obsidian_path: Option<String>,
	pub obsidian_synced: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LivingContext {
	pub id: String,
	pub content: String,
	pub updated_at: OffsetDateTime,
	pub derived_from_session_id: String,
	pub obsidian_path: Option<String>,
	pub obsidian_synced: bool,
	pub synced_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionSummary {
	pub id: String,
	pub content: String,
	pub generated_at: OffsetDateTime,
	pub covers_sessions_up_to: OffsetDateTime,
	pub obsidian_path: Option<String>,
	pub obsidian_synced: bool,
	pub synced_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
}

/// Vault pointer written back after a sync attempt.
#[derive(Debug, Clone, Default)]
pub struct VaultSync {
	pub obsidian_path: Option<String>,
	pub synced_at: Option<OffsetDateTime>,
}
impl VaultSync {
	pub fn synced(&self) -> bool {
		self.obsidian_path.is_some()
	}
}
