pub mod companion;
pub mod daily_notes;
pub mod events;
pub mod tasks;
pub mod time_serde;

mod error;
mod nullable;

pub use companion::{
	CreateLivingContextRequest, CreateSessionSummaryRequest, DateRangeRequest, LivingContextItem,
	SessionSummaryItem, SyncResponse,
};
pub use daily_notes::{
	CreateDailyNoteRequest, DailyNoteItem, ListDailyNotesRequest, PatchDailyNoteRequest,
	ReplaceDailyNoteRequest,
};
pub use error::{Error, Result};
pub use events::{CreateEventRequest, EventItem, ListEventsRequest, UpdateEventRequest};
pub use tasks::{CreateTaskRequest, TaskItem, UpdateTaskRequest};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use time::Date;
use uuid::Uuid;

use daybook_config::Config;
use daybook_domain::dates;
use daybook_storage::db::Db;
use daybook_vault::Vault;

/// Receives a notification after every committed mutation.
///
/// Implementations must not block. Delivery is best effort and never fails the write that
/// triggered it.
pub trait LiveUpdateSink
where
	Self: Send + Sync,
{
	fn publish(&self, event_type: &str, data: Value);
}

pub struct NoopLiveUpdates;
impl LiveUpdateSink for NoopLiveUpdates {
	fn publish(&self, _event_type: &str, _data: Value) {}
}

pub struct DaybookService {
	pub cfg: Config,
	pub db: Db,
	pub vault: Vault,
	pub live: Arc<dyn LiveUpdateSink>,
}
impl DaybookService {
	pub fn new(cfg: Config, db: Db, vault: Vault, live: Arc<dyn LiveUpdateSink>) -> Self {
		Self { cfg, db, vault, live }
	}

	pub fn without_live_updates(cfg: Config, db: Db, vault: Vault) -> Self {
		Self::new(cfg, db, vault, Arc::new(NoopLiveUpdates))
	}

	pub(crate) fn broadcast<T>(&self, event_type: &str, payload: &T)
	where
		T: Serialize,
	{
		match serde_json::to_value(payload) {
			Ok(data) => self.live.publish(event_type, data),
			Err(err) => {
				tracing::warn!(event_type, error = %err, "Failed to encode live update payload.");
			},
		}
	}
}

pub(crate) fn parse_date(field: &str, raw: &str) -> Result<Date> {
	dates::parse_iso_date(raw)
		.ok_or_else(|| Error::invalid(format!("{field} must be a YYYY-MM-DD date; got {raw:?}.")))
}

pub(crate) fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<Date>> {
	match raw.map(str::trim).filter(|value| !value.is_empty()) {
		Some(value) => parse_date(field, value).map(Some),
		None => Ok(None),
	}
}

pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<Uuid> {
	Uuid::parse_str(raw.trim())
		.map_err(|_| Error::invalid(format!("{kind} id must be a UUID; got {raw:?}.")))
}
