use std::{
	io,
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
};

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tempfile::TempDir;
use time::{OffsetDateTime, macros::date};

use daybook_config::{Config, Postgres, Security, Service, Storage, Vault as VaultConfig};
use daybook_domain::{Sections, sections};
use daybook_service::{
	CreateDailyNoteRequest, CreateEventRequest, CreateLivingContextRequest,
	CreateSessionSummaryRequest, CreateTaskRequest, DaybookService, Error, LiveUpdateSink,
	ListEventsRequest, PatchDailyNoteRequest, ReplaceDailyNoteRequest,
};
use daybook_storage::db::Db;
use daybook_testkit::TestDatabase;
use daybook_vault::{LocalFs, Vault, VaultFs};

#[derive(Default)]
struct RecordingSink {
	published: Mutex<Vec<(String, Value)>>,
}
impl RecordingSink {
	fn event_types(&self) -> Vec<String> {
		self.published
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.map(|(event_type, _)| event_type.clone())
			.collect()
	}
}
impl LiveUpdateSink for RecordingSink {
	fn publish(&self, event_type: &str, data: Value) {
		self.published
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push((event_type.to_string(), data));
	}
}

struct ReadOnlyVault;
impl VaultFs for ReadOnlyVault {
	fn exists(&self, _path: &Path) -> bool {
		false
	}

	fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
		Ok(())
	}

	fn write_new(&self, _path: &Path, _contents: &str) -> io::Result<()> {
		Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only vault"))
	}
}

fn test_config(dsn: String, vault_root: Option<PathBuf>) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			cors_origins: vec!["http://localhost:3000".to_string()],
		},
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 2 } },
		vault: VaultConfig { root: vault_root, ..VaultConfig::default() },
		security: Security { bind_localhost_only: true },
	}
}

/// A service whose pool never connects. Only usable for paths that fail validation first.
fn offline_service() -> DaybookService {
	let dsn = "postgres://daybook@127.0.0.1:1/unused".to_string();
	let pool = PgPoolOptions::new().connect_lazy(&dsn).expect("Failed to build lazy pool.");

	DaybookService::without_live_updates(test_config(dsn, None), Db { pool }, Vault::disabled())
}

async fn service_with(
	test_db: &TestDatabase,
	vault: Vault,
	live: Arc<dyn LiveUpdateSink>,
) -> DaybookService {
	let cfg = test_config(test_db.dsn().to_string(), vault.root().map(Path::to_path_buf));
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	DaybookService::new(cfg, db, vault, live)
}

async fn test_db() -> Option<TestDatabase> {
	let Some(base_dsn) = daybook_testkit::env_dsn() else {
		eprintln!("Skipping service tests; set DAYBOOK_PG_DSN to run this test.");

		return None;
	};

	Some(TestDatabase::new(&base_dsn).await.expect("Failed to create test database."))
}

fn event_request(title: &str, start: OffsetDateTime, end: OffsetDateTime) -> CreateEventRequest {
	CreateEventRequest {
		title: title.to_string(),
		description: None,
		start_time: start,
		end_time: end,
		all_day: false,
		location: None,
		recurrence_rule: None,
		status: None,
		event_type: None,
		color: None,
		tags: None,
		attendees: None,
		reminders: None,
	}
}

fn living_context(id: &str) -> CreateLivingContextRequest {
	CreateLivingContextRequest {
		id: id.to_string(),
		content: "Feeling steadier this week.".to_string(),
		updated_at: time::macros::datetime!(2026-02-22 21:15 -05:00),
		derived_from_session_id: "session-42".to_string(),
	}
}

fn sections_of(pairs: &[(&str, &str)]) -> Sections {
	pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
}

#[tokio::test]
async fn inverted_event_range_is_rejected_before_storage() {
	let service = offline_service();
	let start = time::macros::datetime!(2026-02-22 10:00 UTC);
	let err = service
		.create_event(event_request("Standup", start, start))
		.await
		.expect_err("Expected end_time validation to fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn request_validation_runs_before_storage() {
	let service = offline_service();
	let blank_task = CreateTaskRequest {
		title: "  ".to_string(),
		description: None,
		completed: false,
		priority: "medium".to_string(),
		due_date: None,
		tags: None,
	};
	let bad_priority = CreateTaskRequest {
		title: "Buy milk".to_string(),
		priority: "urgent".to_string(),
		..blank_task.clone()
	};

	assert!(matches!(service.create_task(blank_task).await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(service.create_task(bad_priority).await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(service.search_tasks("   ").await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(service.get_task("not-a-uuid").await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(
		service.get_daily_note("22/02/2026").await,
		Err(Error::InvalidRequest { .. })
	));
	assert!(matches!(
		service.events_on_date("2026-13-01").await,
		Err(Error::InvalidRequest { .. })
	));
	assert!(matches!(
		service
			.list_events(ListEventsRequest {
				start_date: Some("next week".to_string()),
				..ListEventsRequest::default()
			})
			.await,
		Err(Error::InvalidRequest { .. })
	));
	assert!(matches!(
		service.create_living_context(living_context(" ")).await,
		Err(Error::InvalidRequest { .. })
	));
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn living_context_sync_is_idempotent_per_id() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let vault_dir = TempDir::new().expect("Failed to create vault dir.");
	let vault = Vault::with_fs(Some(vault_dir.path().to_path_buf()), Arc::new(LocalFs));
	let service = service_with(&test_db, vault, Arc::new(RecordingSink::default())).await;
	let id = "6F9619FF-8B86-D011-B42D-00C04FC964FF";
	let first = service.create_living_context(living_context(id)).await.expect("First sync.");

	assert_eq!(first.id, id);
	assert_eq!(
		first.obsidian_path.as_deref(),
		Some("Therapy Companion/Living Context/2026-02-22.md")
	);
	assert!(first.synced_at.is_some());

	let written = std::fs::read_to_string(
		vault_dir.path().join("Therapy Companion/Living Context/2026-02-22.md"),
	)
	.expect("Vault file must exist.");

	assert_eq!(
		written,
		"---\nupdated_at: 2026-02-22T21:15:00-05:00\nderived_from_session: session-42\n---\n\nFeeling steadier this week.\n"
	);

	let second = service.create_living_context(living_context(id)).await;

	assert!(matches!(second, Err(Error::Conflict { .. })));

	let stored = service.get_living_context(id).await.expect("Stored record.");

	assert!(stored.obsidian_synced);
	assert_eq!(stored.obsidian_path, first.obsidian_path);

	let listed = service.list_living_contexts(Default::default()).await.expect("List.");

	assert_eq!(listed.len(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn concurrent_duplicate_living_context_syncs_once() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let vault_dir = TempDir::new().expect("Failed to create vault dir.");
	let vault = Vault::with_fs(Some(vault_dir.path().to_path_buf()), Arc::new(LocalFs));
	let service =
		Arc::new(service_with(&test_db, vault, Arc::new(RecordingSink::default())).await);
	let id = "lc-concurrent";
	let attempts = 8;
	let handles = (0..attempts)
		.map(|_| {
			let service = service.clone();

			tokio::spawn(async move { service.create_living_context(living_context(id)).await })
		})
		.collect::<Vec<_>>();
	let mut synced = 0;
	let mut conflicts = 0;

	for handle in handles {
		match handle.await.expect("Sync task panicked.") {
			Ok(_) => synced += 1,
			Err(Error::Conflict { .. }) => conflicts += 1,
			Err(err) => panic!("Unexpected error: {err:?}"),
		}
	}

	assert_eq!(synced, 1);
	assert_eq!(conflicts, attempts - 1);

	let listed = service.list_living_contexts(Default::default()).await.expect("List.");

	assert_eq!(listed.len(), 1);

	let files = std::fs::read_dir(vault_dir.path().join("Therapy Companion/Living Context"))
		.expect("Vault folder must exist.")
		.count();

	assert_eq!(files, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn living_context_without_vault_is_stored_unsynced() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let service =
		service_with(&test_db, Vault::disabled(), Arc::new(RecordingSink::default())).await;
	let response = service.create_living_context(living_context("lc-1")).await.expect("Sync.");

	assert_eq!(response.obsidian_path, None);
	assert_eq!(response.synced_at, None);

	let stored = service.get_living_context("lc-1").await.expect("Stored record.");

	assert!(!stored.obsidian_synced);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn vault_failure_leaves_no_row_and_allows_retry() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let broken = Vault::with_fs(Some(PathBuf::from("/vault")), Arc::new(ReadOnlyVault));
	let service = service_with(&test_db, broken, Arc::new(RecordingSink::default())).await;
	let err = service
		.create_living_context(living_context("lc-retry"))
		.await
		.expect_err("Vault write must fail.");

	assert!(matches!(err, Error::Vault { .. }), "Unexpected error: {err:?}");
	assert!(matches!(service.get_living_context("lc-retry").await, Err(Error::NotFound { .. })));

	let healthy = service_with(&test_db, Vault::disabled(), Arc::new(RecordingSink::default())).await;

	healthy.create_living_context(living_context("lc-retry")).await.expect("Retry must succeed.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn same_day_summaries_get_suffixed_files() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let vault_dir = TempDir::new().expect("Failed to create vault dir.");
	let vault = Vault::with_fs(Some(vault_dir.path().to_path_buf()), Arc::new(LocalFs));
	let service = service_with(&test_db, vault, Arc::new(RecordingSink::default())).await;
	let mut paths = Vec::new();

	for (index, hour) in [8_u8, 12, 18].into_iter().enumerate() {
		let generated_at = time::macros::datetime!(2026-02-22 0:00 UTC)
			.replace_hour(hour)
			.expect("Valid hour.");
		let response = service
			.create_session_summary(CreateSessionSummaryRequest {
				id: format!("summary-{index}"),
				content: format!("Summary {index}"),
				generated_at,
				covers_sessions_up_to: generated_at,
			})
			.await
			.expect("Failed to sync summary.");

		paths.push(response.obsidian_path.expect("Vault is configured."));
	}

	assert_eq!(
		paths,
		vec![
			"Therapy Companion/Session Summaries/2026-02-22.md",
			"Therapy Companion/Session Summaries/2026-02-22-2.md",
			"Therapy Companion/Session Summaries/2026-02-22-3.md",
		]
	);

	let newest_first = service.list_session_summaries(Default::default()).await.expect("List.");

	assert_eq!(newest_first[0].id, "summary-2");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn rejected_event_leaves_no_row() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let service =
		service_with(&test_db, Vault::disabled(), Arc::new(RecordingSink::default())).await;
	let start = time::macros::datetime!(2026-02-22 10:00 UTC);
	let before = time::macros::datetime!(2026-02-22 9:00 UTC);

	assert!(service.create_event(event_request("Backwards", start, before)).await.is_err());

	let listed = service.list_events(ListEventsRequest::default()).await.expect("List.");

	assert!(listed.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn daily_note_is_created_once_from_agenda() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let sink = Arc::new(RecordingSink::default());
	let service = service_with(&test_db, Vault::disabled(), sink.clone()).await;
	let day = date!(2026 - 02 - 22);

	for (title, priority, due_date) in [
		("Buy milk", "medium", Some("2026-02-22")),
		("Call mom", "high", Some("2026-02-22")),
		("Someday", "low", None),
	] {
		service
			.create_task(CreateTaskRequest {
				title: title.to_string(),
				description: None,
				completed: false,
				priority: priority.to_string(),
				due_date: due_date.map(str::to_string),
				tags: None,
			})
			.await
			.expect("Failed to create task.");
	}

	service
		.create_event(event_request(
			"Standup",
			time::macros::datetime!(2026-02-22 9:05 UTC),
			time::macros::datetime!(2026-02-22 9:20 UTC),
		))
		.await
		.expect("Failed to create event.");

	let created = service.get_or_create_daily_note(day).await.expect("First call.");
	let note_sections = created.sections.clone().expect("Sections are stored.");

	assert_eq!(note_sections["tasks"], "- [ ] Buy milk @medium\n- [ ] Call mom @high");
	assert_eq!(note_sections["calendar"], "- 09:05: Standup");
	assert_eq!(created.content.as_deref(), Some(sections::assemble(&note_sections).as_str()));
	assert_eq!(created.title.as_deref(), Some("Daily Note - 2026-02-22"));

	let again = service.get_or_create_daily_note(day).await.expect("Second call.");

	assert_eq!(again.created_at, created.created_at);
	assert_eq!(again.content, created.content);
	assert_eq!(
		sink.event_types().iter().filter(|kind| kind.as_str() == "daily_note_created").count(),
		1
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[test]
fn replace_request_keeps_null_apart_from_absent() {
	let req: ReplaceDailyNoteRequest =
		serde_json::from_value(serde_json::json!({ "obsidian_path": null, "content": "body" }))
			.expect("Replace request must parse.");

	assert_eq!(req.obsidian_path, Some(None));
	assert_eq!(req.content, Some(Some("body".to_string())));
	assert_eq!(req.title, None);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn put_with_null_clears_title_and_vault_pointer() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let service =
		service_with(&test_db, Vault::disabled(), Arc::new(RecordingSink::default())).await;

	service
		.create_daily_note(CreateDailyNoteRequest {
			date: "2026-02-22".to_string(),
			title: Some("T".to_string()),
			sections: Some(sections_of(&[("notes", "kept")])),
			obsidian_path: Some("Daily/2026-02-22.md".to_string()),
			obsidian_synced: true,
		})
		.await
		.expect("Create.");

	let req: ReplaceDailyNoteRequest = serde_json::from_value(
		serde_json::json!({ "obsidian_path": null, "title": null, "obsidian_synced": false }),
	)
	.expect("Replace request must parse.");
	let replaced = service.replace_daily_note("2026-02-22", req).await.expect("Replace.");

	assert_eq!(replaced.obsidian_path, None);
	assert_eq!(replaced.title, None);
	assert!(!replaced.obsidian_synced);
	assert_eq!(replaced.content.as_deref(), Some("## Notes\nkept"));

	let stored = service.get_daily_note("2026-02-22").await.expect("Stored note.");

	assert_eq!(stored.obsidian_path, None);
	assert_eq!(stored.title, None);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn patch_merges_sections_and_put_keeps_explicit_content() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let service =
		service_with(&test_db, Vault::disabled(), Arc::new(RecordingSink::default())).await;
	let create = CreateDailyNoteRequest {
		date: "2026-02-20".to_string(),
		title: None,
		sections: Some(sections_of(&[("tasks", "A"), ("notes", "B")])),
		obsidian_path: None,
		obsidian_synced: false,
	};

	service.create_daily_note(create.clone()).await.expect("Create.");

	assert!(matches!(service.create_daily_note(create).await, Err(Error::Conflict { .. })));

	let patched = service
		.patch_daily_note(
			"2026-02-20",
			PatchDailyNoteRequest {
				sections: Some(sections_of(&[("tasks", "C"), ("follow_ups", "D")])),
				..PatchDailyNoteRequest::default()
			},
		)
		.await
		.expect("Patch.");

	assert_eq!(
		patched.sections,
		Some(sections_of(&[("tasks", "C"), ("notes", "B"), ("follow_ups", "D")]))
	);
	assert_eq!(patched.content.as_deref(), Some("## Tasks\nC\n\n## Notes\nB\n\n## Follow_Ups\nD"));

	let replaced = service
		.replace_daily_note(
			"2026-02-20",
			ReplaceDailyNoteRequest {
				content: Some(Some("hand written".to_string())),
				sections: Some(sections_of(&[("notes", "E")])),
				..ReplaceDailyNoteRequest::default()
			},
		)
		.await
		.expect("Replace.");

	assert_eq!(replaced.content.as_deref(), Some("hand written"));
	assert_eq!(replaced.sections, Some(sections_of(&[("notes", "E")])));

	let reassembled = service
		.replace_daily_note(
			"2026-02-20",
			ReplaceDailyNoteRequest {
				sections: Some(sections_of(&[("calendar", "F")])),
				..ReplaceDailyNoteRequest::default()
			},
		)
		.await
		.expect("Replace.");

	assert_eq!(reassembled.content.as_deref(), Some("## Calendar\nF"));

	service.delete_daily_note("2026-02-20").await.expect("Delete.");

	assert!(matches!(service.get_daily_note("2026-02-20").await, Err(Error::NotFound { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DAYBOOK_PG_DSN to run."]
async fn task_mutations_publish_live_updates() {
	let Some(test_db) = test_db().await else {
		return;
	};
	let sink = Arc::new(RecordingSink::default());
	let service = service_with(&test_db, Vault::disabled(), sink.clone()).await;
	let task = service
		.create_task(CreateTaskRequest {
			title: "Write report".to_string(),
			description: Some("Quarterly numbers".to_string()),
			completed: false,
			priority: "High".to_string(),
			due_date: None,
			tags: Some(vec!["work".to_string()]),
		})
		.await
		.expect("Create.");

	assert_eq!(task.priority, "high");

	let id = task.id.to_string();
	let updated = service
		.update_task(
			&id,
			daybook_service::UpdateTaskRequest { completed: Some(true), ..Default::default() },
		)
		.await
		.expect("Update.");

	assert!(updated.completed);
	assert_eq!(updated.title, "Write report");
	assert_eq!(service.search_tasks("QUARTERLY").await.expect("Search.").len(), 1);

	service.delete_task(&id).await.expect("Delete.");

	assert!(matches!(service.delete_task(&id).await, Err(Error::NotFound { .. })));
	assert_eq!(sink.event_types(), vec!["task_created", "task_updated", "task_deleted"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
