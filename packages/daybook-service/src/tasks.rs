use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{DaybookService, Error, Result};
use daybook_domain::{Priority, dates};
use daybook_storage::{
	escape_like,
	models::{Task, TaskChanges},
	tasks,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateTaskRequest {
	pub title: String,
	pub description: Option<String>,
	#[serde(default)]
	pub completed: bool,
	pub priority: String,
	pub due_date: Option<String>,
	pub tags: Option<Vec<String>>,
}

/// Every field is optional. Absent or `null` fields keep their stored value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
	pub title: Option<String>,
	pub description: Option<String>,
	pub completed: Option<bool>,
	pub priority: Option<String>,
	pub due_date: Option<String>,
	pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskItem {
	pub id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub completed: bool,
	pub priority: String,
	pub due_date: Option<String>,
	pub tags: Vec<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
}
impl From<Task> for TaskItem {
	fn from(task: Task) -> Self {
		Self {
			id: task.id,
			title: task.title,
			description: task.description,
			completed: task.completed,
			priority: task.priority,
			due_date: task.due_date.map(dates::format_iso_date),
			tags: task.tags,
			created_at: task.created_at,
			updated_at: task.updated_at,
		}
	}
}

impl DaybookService {
	pub async fn list_tasks(&self) -> Result<Vec<TaskItem>> {
		let rows = tasks::list_tasks(&self.db.pool).await?;

		Ok(rows.into_iter().map(TaskItem::from).collect())
	}

	pub async fn get_task(&self, id: &str) -> Result<TaskItem> {
		let id = crate::parse_id("Task", id)?;
		let task = tasks::get_task(&self.db.pool, id)
			.await?
			.ok_or_else(|| Error::not_found("Task not found."))?;

		Ok(task.into())
	}

	pub async fn create_task(&self, req: CreateTaskRequest) -> Result<TaskItem> {
		let title = req.title.trim();

		if title.is_empty() {
			return Err(Error::invalid("title must not be empty."));
		}

		let priority = parse_priority(&req.priority)?;
		let due_date = crate::parse_optional_date("due_date", req.due_date.as_deref())?;
		let task = Task {
			id: Uuid::new_v4(),
			title: title.to_string(),
			description: req.description,
			completed: req.completed,
			priority: priority.as_str().to_string(),
			due_date,
			tags: req.tags.unwrap_or_default(),
			created_at: OffsetDateTime::now_utc(),
			updated_at: None,
		};

		tasks::insert_task(&self.db.pool, &task).await?;

		let item = TaskItem::from(task);

		self.broadcast("task_created", &item);

		Ok(item)
	}

	pub async fn update_task(&self, id: &str, req: UpdateTaskRequest) -> Result<TaskItem> {
		let id = crate::parse_id("Task", id)?;
		let title = req.title.as_deref().map(str::trim);

		if title.is_some_and(str::is_empty) {
			return Err(Error::invalid("title must not be empty."));
		}

		let priority = req.priority.as_deref().map(parse_priority).transpose()?;
		let due_date = crate::parse_optional_date("due_date", req.due_date.as_deref())?;
		let changes = TaskChanges {
			title,
			description: req.description.as_deref(),
			completed: req.completed,
			priority: priority.map(Priority::as_str),
			due_date,
			tags: req.tags.as_deref(),
		};
		let task = tasks::update_task(&self.db.pool, id, &changes, OffsetDateTime::now_utc())
			.await?
			.ok_or_else(|| Error::not_found("Task not found."))?;
		let item = TaskItem::from(task);

		self.broadcast("task_updated", &item);

		Ok(item)
	}

	pub async fn delete_task(&self, id: &str) -> Result<()> {
		let id = crate::parse_id("Task", id)?;

		if !tasks::delete_task(&self.db.pool, id).await? {
			return Err(Error::not_found("Task not found."));
		}

		self.broadcast("task_deleted", &json!({ "id": id }));

		Ok(())
	}

	/// Case-insensitive substring search over task titles and descriptions.
	pub async fn search_tasks(&self, query: &str) -> Result<Vec<TaskItem>> {
		let query = query.trim();

		if query.is_empty() {
			return Err(Error::invalid("q must not be empty."));
		}

		let rows = tasks::search_tasks(&self.db.pool, &escape_like(query)).await?;

		Ok(rows.into_iter().map(TaskItem::from).collect())
	}
}

fn parse_priority(raw: &str) -> Result<Priority> {
	raw.trim().to_ascii_lowercase().parse::<Priority>().map_err(Error::invalid)
}
