use sqlx::PgExecutor;
use time::Date;

use crate::{Result, models::DailyNote};

/// Inserts `note` unless a note already exists for its date. Returns whether a row was written.
pub async fn insert_daily_note<'e, E>(executor: E, note: &DailyNote) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO daily_notes (
	date,
	title,
	content,
	sections,
	obsidian_path,
	obsidian_synced,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
ON CONFLICT (date) DO NOTHING",
	)
	.bind(note.date)
	.bind(note.title.as_deref())
	.bind(note.content.as_deref())
	.bind(note.sections.as_ref())
	.bind(note.obsidian_path.as_deref())
	.bind(note.obsidian_synced)
	.bind(note.created_at)
	.bind(note.updated_at)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn get_daily_note<'e, E>(executor: E, date: Date) -> Result<Option<DailyNote>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, DailyNote>(
		"\
SELECT
	date,
	title,
	content,
	sections,
	obsidian_path,
	obsidian_synced,
	created_at,
	updated_at
FROM daily_notes
WHERE date = $1",
	)
	.bind(date)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn get_daily_note_for_update<'e, E>(executor: E, date: Date) -> Result<Option<DailyNote>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, DailyNote>(
		"\
SELECT
	date,
	title,
	content,
	sections,
	obsidian_path,
	obsidian_synced,
	created_at,
	updated_at
FROM daily_notes
WHERE date = $1
FOR UPDATE",
	)
	.bind(date)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Newest first. Both bounds are inclusive.
pub async fn list_daily_notes<'e, E>(
	executor: E,
	start: Option<Date>,
	end: Option<Date>,
) -> Result<Vec<DailyNote>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DailyNote>(
		"\
SELECT
	date,
	title,
	content,
	sections,
	obsidian_path,
	obsidian_synced,
	created_at,
	updated_at
FROM daily_notes
WHERE ($1::date IS NULL OR date >= $1)
	AND ($2::date IS NULL OR date <= $2)
ORDER BY date DESC",
	)
	.bind(start)
	.bind(end)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Writes `title`, `content`, `sections` and the vault fields of `note` back in one statement.
pub async fn update_daily_note<'e, E>(executor: E, note: &DailyNote) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE daily_notes
SET
	title = $2,
	content = $3,
	sections = $4,
	obsidian_path = $5,
	obsidian_synced = $6,
	updated_at = $7
WHERE date = $1",
	)
	.bind(note.date)
	.bind(note.title.as_deref())
	.bind(note.content.as_deref())
	.bind(note.sections.as_ref())
	.bind(note.obsidian_path.as_deref())
	.bind(note.obsidian_synced)
	.bind(note.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn delete_daily_note<'e, E>(executor: E, date: Date) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result =
		sqlx::query("DELETE FROM daily_notes WHERE date = $1").bind(date).execute(executor).await?;

	Ok(result.rows_affected() > 0)
}
