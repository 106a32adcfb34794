//! Append-only therapy companion records.
//!
//! Rows are inserted once with vault fields unset, then receive their vault pointer inside the
//! same transaction. There is no update or delete path beyond that.

use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{
	Result,
	models::{LivingContext, SessionSummary, VaultSync},
};

/// Returns `false` when a record with the same id already exists.
pub async fn insert_living_context<'e, E>(executor: E, record: &LivingContext) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO living_contexts (
	id,
	content,
	updated_at,
	derived_from_session_id,
	obsidian_path,
	obsidian_synced,
	synced_at,
	created_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
ON CONFLICT (id) DO NOTHING",
	)
	.bind(record.id.as_str())
	.bind(record.content.as_str())
	.bind(record.updated_at)
	.bind(record.derived_from_session_id.as_str())
	.bind(record.obsidian_path.as_deref())
	.bind(record.obsidian_synced)
	.bind(record.synced_at)
	.bind(record.created_at)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn set_living_context_sync<'e, E>(executor: E, id: &str, sync: &VaultSync) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE living_contexts
SET obsidian_path = $2, obsidian_synced = $3, synced_at = $4
WHERE id = $1",
	)
	.bind(id)
	.bind(sync.obsidian_path.as_deref())
	.bind(sync.synced())
	.bind(sync.synced_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_living_context<'e, E>(executor: E, id: &str) -> Result<Option<LivingContext>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, LivingContext>(
		"\
SELECT
	id,
	content,
	updated_at,
	derived_from_session_id,
	obsidian_path,
	obsidian_synced,
	synced_at,
	created_at
FROM living_contexts
WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Newest first by `updated_at`, bounded by `[from, until)` when given.
pub async fn list_living_contexts<'e, E>(
	executor: E,
	from: Option<OffsetDateTime>,
	until: Option<OffsetDateTime>,
) -> Result<Vec<LivingContext>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, LivingContext>(
		"\
SELECT
	id,
	content,
	updated_at,
	derived_from_session_id,
	obsidian_path,
	obsidian_synced,
	synced_at,
	created_at
FROM living_contexts
WHERE ($1::timestamptz IS NULL OR updated_at >= $1)
	AND ($2::timestamptz IS NULL OR updated_at < $2)
ORDER BY updated_at DESC, id ASC",
	)
	.bind(from)
	.bind(until)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Returns `false` when a record with the same id already exists.
pub async fn insert_session_summary<'e, E>(executor: E, record: &SessionSummary) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO session_summaries (
	id,
	content,
	generated_at,
	covers_sessions_up_to,
	obsidian_path,
	obsidian_synced,
	synced_at,
	created_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
ON CONFLICT (id) DO NOTHING",
	)
	.bind(record.id.as_str())
	.bind(record.content.as_str())
	.bind(record.generated_at)
	.bind(record.covers_sessions_up_to)
	.bind(record.obsidian_path.as_deref())
	.bind(record.obsidian_synced)
	.bind(record.synced_at)
	.bind(record.created_at)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn set_session_summary_sync<'e, E>(
	executor: E,
	id: &str,
	sync: &VaultSync,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE session_summaries
SET obsidian_path = $2, obsidian_synced = $3, synced_at = $4
WHERE id = $1",
	)
	.bind(id)
	.bind(sync.obsidian_path.as_deref())
	.bind(sync.synced())
	.bind(sync.synced_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_session_summary<'e, E>(executor: E, id: &str) -> Result<Option<SessionSummary>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, SessionSummary>(
		"\
SELECT
	id,
	content,
	generated_at,
	covers_sessions_up_to,
	obsidian_path,
	obsidian_synced,
	synced_at,
	created_at
FROM session_summaries
WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Newest first by `generated_at`, bounded by `[from, until)` when given.
pub async fn list_session_summaries<'e, E>(
	executor: E,
	from: Option<OffsetDateTime>,
	until: Option<OffsetDateTime>,
) -> Result<Vec<SessionSummary>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, SessionSummary>(
		"\
SELECT
	id,
	content,
	generated_at,
	covers_sessions_up_to,
	obsidian_path,
	obsidian_synced,
	synced_at,
	created_at
FROM session_summaries
WHERE ($1::timestamptz IS NULL OR generated_at >= $1)
	AND ($2::timestamptz IS NULL OR generated_at < $2)
ORDER BY generated_at DESC, id ASC",
	)
	.bind(from)
	.bind(until)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
