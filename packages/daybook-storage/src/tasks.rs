use sqlx::PgExecutor;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
	Result,
	models::{Task, TaskChanges},
};

pub async fn insert_task<'e, E>(executor: E, task: &Task) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO tasks (
	id,
	title,
	description,
	completed,
	priority,
	due_date,
	tags,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(task.id)
	.bind(task.title.as_str())
	.bind(task.description.as_deref())
	.bind(task.completed)
	.bind(task.priority.as_str())
	.bind(task.due_date)
	.bind(&task.tags)
	.bind(task.created_at)
	.bind(task.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn list_tasks<'e, E>(executor: E) -> Result<Vec<Task>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Task>(
		"\
SELECT
	id,
	title,
	description,
	completed,
	priority,
	due_date,
	tags,
	created_at,
	updated_at
FROM tasks
ORDER BY created_at ASC, id ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn get_task<'e, E>(executor: E, id: Uuid) -> Result<Option<Task>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Task>(
		"\
SELECT
	id,
	title,
	description,
	completed,
	priority,
	due_date,
	tags,
	created_at,
	updated_at
FROM tasks
WHERE id = $1",
	)
	.bind(id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn list_tasks_due_on<'e, E>(executor: E, date: Date) -> Result<Vec<Task>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Task>(
		"\
SELECT
	id,
	title,
	description,
	completed,
	priority,
	due_date,
	tags,
	created_at,
	updated_at
FROM tasks
WHERE due_date = $1
ORDER BY created_at ASC, id ASC",
	)
	.bind(date)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Case-insensitive substring match on title or description. `pattern` must already be escaped
/// with [`crate::escape_like`].
pub async fn search_tasks<'e, E>(executor: E, escaped_query: &str) -> Result<Vec<Task>>
where
	E: PgExecutor<'e>,
{
	let pattern = format!("%{escaped_query}%");
	let rows = sqlx::query_as::<_, Task>(
		"\
SELECT
	id,
	title,
	description,
	completed,
	priority,
	due_date,
	tags,
	created_at,
	updated_at
FROM tasks
WHERE title ILIKE $1 ESCAPE '\\'
	OR description ILIKE $1 ESCAPE '\\'
ORDER BY created_at ASC, id ASC",
	)
	.bind(pattern)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn update_task<'e, E>(
	executor: E,
	id: Uuid,
	changes: &TaskChanges<'_>,
	now: OffsetDateTime,
) -> Result<Option<Task>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Task>(
		"\
UPDATE tasks
SET
	title = COALESCE($2, title),
	description = COALESCE($3, description),
	completed = COALESCE($4, completed),
	priority = COALESCE($5, priority),
	due_date = COALESCE($6, due_date),
	tags = COALESCE($7, tags),
	updated_at = $8
WHERE id = $1
RETURNING
	id,
	title,
	description,
	completed,
	priority,
	due_date,
	tags,
	created_at,
	updated_at",
	)
	.bind(id)
	.bind(changes.title)
	.bind(changes.description)
	.bind(changes.completed)
	.bind(changes.priority)
	.bind(changes.due_date)
	.bind(changes.tags)
	.bind(now)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn delete_task<'e, E>(executor: E, id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM tasks WHERE id = $1").bind(id).execute(executor).await?;

	Ok(result.rows_affected() > 0)
}
