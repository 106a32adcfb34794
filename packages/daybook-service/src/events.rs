use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{DaybookService, Error, Result};
use daybook_domain::dates;
use daybook_storage::{
	events,
	models::{Event, EventFilter},
};

const MAX_TITLE_CHARS: usize = 255;
const DEFAULT_STATUS: &str = "confirmed";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateEventRequest {
	pub title: String,
	pub description: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub start_time: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub end_time: OffsetDateTime,
	#[serde(default)]
	pub all_day: bool,
	pub location: Option<String>,
	pub recurrence_rule: Option<String>,
	pub status: Option<String>,
	pub event_type: Option<String>,
	pub color: Option<String>,
	pub tags: Option<Vec<String>>,
	pub attendees: Option<Vec<Value>>,
	pub reminders: Option<Vec<Value>>,
}

/// Every field is optional. Absent or `null` fields keep their stored value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
	pub title: Option<String>,
	pub description: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub start_time: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub end_time: Option<OffsetDateTime>,
	pub all_day: Option<bool>,
	pub location: Option<String>,
	pub recurrence_rule: Option<String>,
	pub status: Option<String>,
	pub event_type: Option<String>,
	pub color: Option<String>,
	pub tags: Option<Vec<String>>,
	pub attendees: Option<Vec<Value>>,
	pub reminders: Option<Vec<Value>>,
}

/// Query filters. `start_date` and `end_date` take RFC 3339 timestamps or bare dates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListEventsRequest {
	pub start_date: Option<String>,
	pub end_date: Option<String>,
	pub event_type: Option<String>,
	pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventItem {
	pub id: Uuid,
	pub title: String,
	pub description: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub start_time: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
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
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl From<Event> for EventItem {
	fn from(event: Event) -> Self {
		Self {
			id: event.id,
			title: event.title,
			description: event.description,
			start_time: event.start_time,
			end_time: event.end_time,
			all_day: event.all_day,
			location: event.location,
			recurrence_rule: event.recurrence_rule,
			status: event.status,
			event_type: event.event_type,
			color: event.color,
			tags: event.tags,
			attendees: event.attendees,
			reminders: event.reminders,
			created_at: event.created_at,
			updated_at: event.updated_at,
		}
	}
}

impl DaybookService {
	pub async fn list_events(&self, req: ListEventsRequest) -> Result<Vec<EventItem>> {
		let starts_after = parse_optional_instant("start_date", req.start_date.as_deref())?;
		let ends_before = parse_optional_instant("end_date", req.end_date.as_deref())?;
		let filter = EventFilter {
			starts_after,
			ends_before,
			event_type: non_blank(req.event_type.as_deref()),
			status: non_blank(req.status.as_deref()),
		};
		let rows = events::list_events(&self.db.pool, &filter).await?;

		Ok(rows.into_iter().map(EventItem::from).collect())
	}

	pub async fn get_event(&self, id: &str) -> Result<EventItem> {
		let id = crate::parse_id("Event", id)?;
		let event = events::get_event(&self.db.pool, id)
			.await?
			.ok_or_else(|| Error::not_found("Event not found."))?;

		Ok(event.into())
	}

	/// Events overlapping the UTC day `date`, earliest first.
	pub async fn events_on_date(&self, date: &str) -> Result<Vec<EventItem>> {
		let date = crate::parse_date("date", date)?;
		let (day_start, day_end) = dates::day_window(date);
		let rows = events::list_events_overlapping(&self.db.pool, day_start, day_end).await?;

		Ok(rows.into_iter().map(EventItem::from).collect())
	}

	pub async fn create_event(&self, req: CreateEventRequest) -> Result<EventItem> {
		let title = validate_title(&req.title)?;

		validate_time_range(req.start_time, req.end_time)?;

		let status = match non_blank(req.status.as_deref()) {
			Some(status) => status.to_string(),
			None => DEFAULT_STATUS.to_string(),
		};
		let event = Event {
			id: Uuid::new_v4(),
			title,
			description: req.description,
			start_time: req.start_time,
			end_time: req.end_time,
			all_day: req.all_day,
			location: req.location,
			recurrence_rule: req.recurrence_rule,
			status,
			event_type: req.event_type,
			color: req.color,
			tags: req.tags.unwrap_or_default(),
			attendees: Value::Array(req.attendees.unwrap_or_default()),
			reminders: Value::Array(req.reminders.unwrap_or_default()),
			created_at: OffsetDateTime::now_utc(),
			updated_at: None,
		};

		events::insert_event(&self.db.pool, &event).await?;

		let item = EventItem::from(event);

		self.broadcast("event_created", &item);

		Ok(item)
	}

	/// Applies the provided fields and validates the resulting time range before writing.
	pub async fn update_event(&self, id: &str, req: UpdateEventRequest) -> Result<EventItem> {
		let id = crate::parse_id("Event", id)?;
		let mut tx = self.db.pool.begin().await?;
		let mut event = events::get_event_for_update(&mut *tx, id)
			.await?
			.ok_or_else(|| Error::not_found("Event not found."))?;

		if let Some(title) = req.title.as_deref() {
			event.title = validate_title(title)?;
		}
		if let Some(start_time) = req.start_time {
			event.start_time = start_time;
		}
		if let Some(end_time) = req.end_time {
			event.end_time = end_time;
		}

		validate_time_range(event.start_time, event.end_time)?;

		if let Some(status) = non_blank(req.status.as_deref()) {
			event.status = status.to_string();
		}
		if let Some(description) = req.description {
			event.description = Some(description);
		}
		if let Some(all_day) = req.all_day {
			event.all_day = all_day;
		}
		if let Some(location) = req.location {
			event.location = Some(location);
		}
		if let Some(recurrence_rule) = req.recurrence_rule {
			event.recurrence_rule = Some(recurrence_rule);
		}
		if let Some(event_type) = req.event_type {
			event.event_type = Some(event_type);
		}
		if let Some(color) = req.color {
			event.color = Some(color);
		}
		if let Some(tags) = req.tags {
			event.tags = tags;
		}
		if let Some(attendees) = req.attendees {
			event.attendees = Value::Array(attendees);
		}
		if let Some(reminders) = req.reminders {
			event.reminders = Value::Array(reminders);
		}

		event.updated_at = Some(OffsetDateTime::now_utc());

		events::update_event(&mut *tx, &event).await?;

		tx.commit().await?;

		let item = EventItem::from(event);

		self.broadcast("event_updated", &item);

		Ok(item)
	}

	pub async fn delete_event(&self, id: &str) -> Result<()> {
		let id = crate::parse_id("Event", id)?;

		if !events::delete_event(&self.db.pool, id).await? {
			return Err(Error::not_found("Event not found."));
		}

		self.broadcast("event_deleted", &json!({ "id": id }));

		Ok(())
	}
}

fn validate_title(raw: &str) -> Result<String> {
	let title = raw.trim();
	let chars = title.chars().count();

	if chars == 0 || chars > MAX_TITLE_CHARS {
		return Err(Error::invalid(format!(
			"title must be between 1 and {MAX_TITLE_CHARS} characters."
		)));
	}

	Ok(title.to_string())
}

fn validate_time_range(start_time: OffsetDateTime, end_time: OffsetDateTime) -> Result<()> {
	if end_time <= start_time {
		return Err(Error::invalid("end_time must be after start_time."));
	}

	Ok(())
}

fn parse_optional_instant(field: &str, raw: Option<&str>) -> Result<Option<OffsetDateTime>> {
	match non_blank(raw) {
		Some(value) => dates::parse_instant(value).map(Some).ok_or_else(|| {
			Error::invalid(format!(
				"{field} must be an RFC 3339 timestamp or a YYYY-MM-DD date; got {value:?}."
			))
		}),
		None => Ok(None),
	}
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
	raw.map(str::trim).filter(|value| !value.is_empty())
}
