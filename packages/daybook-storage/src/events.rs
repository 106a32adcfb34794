use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{Event, EventFilter},
};

pub async fn insert_event<'e, E>(executor: E, event: &Event) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO events (
	id,
	title,
	description,
	start_time,
	end_time,
	all_day,
	location,
	recurrence_rule,
	status,
	event_type,
	color,
	tags,
	attendees,
	reminders,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)",
	)
	.bind(event.id)
	.bind(event.title.as_str())
	.bind(event.description.as_deref())
	.bind(event.start_time)
	.bind(event.end_time)
	.bind(event.all_day)
	.bind(event.location.as_deref())
	.bind(event.recurrence_rule.as_deref())
	.bind(event.status.as_str())
	.bind(event.event_type.as_deref())
	.bind(event.color.as_deref())
	.bind(&event.tags)
	.bind(&event.attendees)
	.bind(&event.reminders)
	.bind(event.created_at)
	.bind(event.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Writes every mutable column of `event` back to its row.
pub async fn update_event<'e, E>(executor: E, event: &Event) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE events
SET
	title = $2,
	description = $3,
	start_time = $4,
	end_time = $5,
	all_day = $6,
	location = $7,
	recurrence_rule = $8,
	status = $9,
	event_type = $10,
	color = $11,
	tags = $12,
	attendees = $13,
	reminders = $14,
	updated_at = $15
WHERE id = $1",
	)
	.bind(event.id)
	.bind(event.title.as_str())
	.bind(event.description.as_deref())
	.bind(event.start_time)
	.bind(event.end_time)
	.bind(event.all_day)
	.bind(event.location.as_deref())
	.bind(event.recurrence_rule.as_deref())
	.bind(event.status.as_str())
	.bind(event.event_type.as_deref())
	.bind(event.color.as_deref())
	.bind(&event.tags)
	.bind(&event.attendees)
	.bind(&event.reminders)
	.bind(event.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_event<'e, E>(executor: E, id: Uuid) -> Result<Option<Event>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
		.bind(id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn get_event_for_update<'e, E>(executor: E, id: Uuid) -> Result<Option<Event>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
		.bind(id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn list_events<'e, E>(executor: E, filter: &EventFilter<'_>) -> Result<Vec<Event>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Event>(
		"\
SELECT *
FROM events
WHERE ($1::timestamptz IS NULL OR end_time >= $1)
	AND ($2::timestamptz IS NULL OR start_time <= $2)
	AND ($3::text IS NULL OR event_type = $3)
	AND ($4::text IS NULL OR status = $4)
ORDER BY start_time ASC, id ASC",
	)
	.bind(filter.starts_after)
	.bind(filter.ends_before)
	.bind(filter.event_type)
	.bind(filter.status)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Events overlapping `[window_start, window_end)`, including events that end exactly at
/// `window_start`.
pub async fn list_events_overlapping<'e, E>(
	executor: E,
	window_start: OffsetDateTime,
	window_end: OffsetDateTime,
) -> Result<Vec<Event>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Event>(
		"\
SELECT *
FROM events
WHERE start_time < $2 AND end_time >= $1
ORDER BY start_time ASC, id ASC",
	)
	.bind(window_start)
	.bind(window_end)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn delete_event<'e, E>(executor: E, id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result =
		sqlx::query("DELETE FROM events WHERE id = $1").bind(id).execute(executor).await?;

	Ok(result.rows_affected() > 0)
}
