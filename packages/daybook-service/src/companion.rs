//! Append-only therapy companion records exported into the vault.
//!
//! A create runs inside one transaction: insert the row, write the vault file, store the vault
//! pointer, commit. The primary key makes a second delivery of the same id a conflict, and a
//! failed vault write rolls the insert back so the origin can retry with the same id.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{DaybookService, Error, Result};
use daybook_domain::{dates, markdown};
use daybook_storage::{
	companion,
	models::{LivingContext, SessionSummary, VaultSync},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateLivingContextRequest {
	pub id: String,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	pub derived_from_session_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSessionSummaryRequest {
	pub id: String,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub generated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub covers_sessions_up_to: OffsetDateTime,
}

/// Filters on calendar dates. `end_date` is inclusive through the end of that day.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DateRangeRequest {
	pub start_date: Option<String>,
	pub end_date: Option<String>,
}

/// Confirmation returned to the origin system. The body is left out on purpose: the origin
/// already holds it and only stores the vault pointer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncResponse {
	pub id: String,
	pub obsidian_path: Option<String>,
	#[serde(with = "crate::time_serde::option")]
	pub synced_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LivingContextItem {
	pub id: String,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	pub derived_from_session_id: String,
	pub obsidian_path: Option<String>,
	pub obsidian_synced: bool,
	#[serde(with = "crate::time_serde::option")]
	pub synced_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<LivingContext> for LivingContextItem {
	fn from(record: LivingContext) -> Self {
		Self {
			id: record.id,
			content: record.content,
			updated_at: record.updated_at,
			derived_from_session_id: record.derived_from_session_id,
			obsidian_path: record.obsidian_path,
			obsidian_synced: record.obsidian_synced,
			synced_at: record.synced_at,
			created_at: record.created_at,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummaryItem {
	pub id: String,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub generated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub covers_sessions_up_to: OffsetDateTime,
	pub obsidian_path: Option<String>,
	pub obsidian_synced: bool,
	#[serde(with = "crate::time_serde::option")]
	pub synced_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<SessionSummary> for SessionSummaryItem {
	fn from(record: SessionSummary) -> Self {
		Self {
			id: record.id,
			content: record.content,
			generated_at: record.generated_at,
			covers_sessions_up_to: record.covers_sessions_up_to,
			obsidian_path: record.obsidian_path,
			obsidian_synced: record.obsidian_synced,
			synced_at: record.synced_at,
			created_at: record.created_at,
		}
	}
}

impl DaybookService {
	pub async fn create_living_context(
		&self,
		req: CreateLivingContextRequest,
	) -> Result<SyncResponse> {
		if req.id.trim().is_empty() {
			return Err(Error::invalid("id must not be empty."));
		}

		let record = LivingContext {
			id: req.id,
			content: req.content,
			updated_at: req.updated_at,
			derived_from_session_id: req.derived_from_session_id,
			obsidian_path: None,
			obsidian_synced: false,
			synced_at: None,
			created_at: OffsetDateTime::now_utc(),
		};
		let mut tx = self.db.pool.begin().await?;

		if !companion::insert_living_context(&mut *tx, &record).await? {
			tracing::info!(id = %record.id, "Rejected duplicate living context.");

			return Err(Error::Conflict {
				message: "Living context version already synced.".to_string(),
			});
		}

		let markdown = markdown::render_with_front_matter(
			&[
				("updated_at", front_matter_timestamp(record.updated_at)?),
				("derived_from_session", record.derived_from_session_id.clone()),
			],
			&record.content,
		);
		let sync = self.write_to_vault(
			&self.cfg.vault.living_context_dir,
			dates::date_bucket(record.updated_at),
			markdown,
		)
		.await?;

		companion::set_living_context_sync(&mut *tx, &record.id, &sync).await?;

		tx.commit().await?;

		Ok(SyncResponse {
			id: record.id,
			obsidian_path: sync.obsidian_path,
			synced_at: sync.synced_at,
		})
	}

	pub async fn list_living_contexts(
		&self,
		req: DateRangeRequest,
	) -> Result<Vec<LivingContextItem>> {
		let (from, until) = date_range_bounds(&req)?;
		let rows = companion::list_living_contexts(&self.db.pool, from, until).await?;

		Ok(rows.into_iter().map(LivingContextItem::from).collect())
	}

	pub async fn get_living_context(&self, id: &str) -> Result<LivingContextItem> {
		let record = companion::get_living_context(&self.db.pool, id)
			.await?
			.ok_or_else(|| Error::not_found("Living context not found."))?;

		Ok(record.into())
	}

	pub async fn create_session_summary(
		&self,
		req: CreateSessionSummaryRequest,
	) -> Result<SyncResponse> {
		if req.id.trim().is_empty() {
			return Err(Error::invalid("id must not be empty."));
		}

		let record = SessionSummary {
			id: req.id,
			content: req.content,
			generated_at: req.generated_at,
			covers_sessions_up_to: req.covers_sessions_up_to,
			obsidian_path: None,
			obsidian_synced: false,
			synced_at: None,
			created_at: OffsetDateTime::now_utc(),
		};
		let mut tx = self.db.pool.begin().await?;

		if !companion::insert_session_summary(&mut *tx, &record).await? {
			tracing::info!(id = %record.id, "Rejected duplicate session summary.");

			return Err(Error::Conflict { message: "Session summary already synced.".to_string() });
		}

		let markdown = markdown::render_with_front_matter(
			&[
				("generated_at", front_matter_timestamp(record.generated_at)?),
				("covers_sessions_up_to", front_matter_timestamp(record.covers_sessions_up_to)?),
			],
			&record.content,
		);
		let sync = self.write_to_vault(
			&self.cfg.vault.session_summary_dir,
			dates::date_bucket(record.generated_at),
			markdown,
		)
		.await?;

		companion::set_session_summary_sync(&mut *tx, &record.id, &sync).await?;

		tx.commit().await?;

		Ok(SyncResponse {
			id: record.id,
			obsidian_path: sync.obsidian_path,
			synced_at: sync.synced_at,
		})
	}

	pub async fn list_session_summaries(
		&self,
		req: DateRangeRequest,
	) -> Result<Vec<SessionSummaryItem>> {
		let (from, until) = date_range_bounds(&req)?;
		let rows = companion::list_session_summaries(&self.db.pool, from, until).await?;

		Ok(rows.into_iter().map(SessionSummaryItem::from).collect())
	}

	pub async fn get_session_summary(&self, id: &str) -> Result<SessionSummaryItem> {
		let record = companion::get_session_summary(&self.db.pool, id)
			.await?
			.ok_or_else(|| Error::not_found("Session summary not found."))?;

		Ok(record.into())
	}

	/// Runs the blocking vault write off the async workers.
	async fn write_to_vault(
		&self,
		subdir: &str,
		bucket: Date,
		markdown: String,
	) -> Result<VaultSync> {
		let vault = self.vault.clone();
		let folder = subdir.to_string();
		let outcome = tokio::task::spawn_blocking(move || vault.sync(&folder, bucket, &markdown))
			.await
			.map_err(|err| Error::Vault { message: format!("Vault write task failed: {err}.") })?
			.map_err(|err| {
				tracing::error!(subdir, error = ?err, "Vault write failed. Rolling back record.");

				Error::from(err)
			})?;

		Ok(VaultSync { obsidian_path: outcome.obsidian_path, synced_at: outcome.synced_at })
	}
}

fn front_matter_timestamp(ts: OffsetDateTime) -> Result<String> {
	markdown::front_matter_timestamp(ts)
		.map_err(|err| Error::invalid(format!("Timestamp cannot be rendered: {err}.")))
}

fn date_range_bounds(
	req: &DateRangeRequest,
) -> Result<(Option<OffsetDateTime>, Option<OffsetDateTime>)> {
	let start = crate::parse_optional_date("start_date", req.start_date.as_deref())?;
	let end = crate::parse_optional_date("end_date", req.end_date.as_deref())?;

	Ok((start.map(|date| dates::day_window(date).0), end.map(|date| dates::day_window(date).1)))
}
