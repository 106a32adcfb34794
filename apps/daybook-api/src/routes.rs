use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderValue, Method, StatusCode, header},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::{live, state::AppState};
use daybook_service::{
	CreateDailyNoteRequest, CreateEventRequest, CreateLivingContextRequest,
	CreateSessionSummaryRequest, CreateTaskRequest, DailyNoteItem, DateRangeRequest, Error,
	EventItem, ListDailyNotesRequest, ListEventsRequest, LivingContextItem, PatchDailyNoteRequest,
	ReplaceDailyNoteRequest, SessionSummaryItem, SyncResponse, TaskItem, UpdateEventRequest,
	UpdateTaskRequest,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
	#[serde(default)]
	pub q: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			Error::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			Error::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "CONFLICT", message, None),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage error.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal storage error.",
					None,
				)
			},
			Error::Vault { message } => {
				tracing::error!(error = %message, "Vault write failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"VAULT_WRITE_FAILED",
					"Failed to write the record to the vault.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	let cors = cors_layer(&state.service.cfg.service.cors_origins);

	Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.route("/ws", get(live::ws_handler))
		.route("/api/tasks", get(list_tasks).post(create_task))
		.route("/api/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
		.route("/api/search", get(search_tasks))
		.route("/api/events", get(list_events).post(create_event))
		.route("/api/events/date/{date}", get(events_on_date))
		.route("/api/events/{id}", get(get_event).put(update_event).delete(delete_event))
		.route("/api/daily-notes", get(list_daily_notes).post(create_daily_note))
		.route("/api/daily-notes/today", get(get_today))
		.route(
			"/api/daily-notes/{date}",
			get(get_daily_note)
				.put(replace_daily_note)
				.patch(patch_daily_note)
				.delete(delete_daily_note),
		)
		.route(
			"/api/therapy-companion/living-context",
			get(list_living_contexts).post(create_living_context),
		)
		.route("/api/therapy-companion/living-context/{id}", get(get_living_context))
		.route(
			"/api/therapy-companion/summaries",
			get(list_session_summaries).post(create_session_summary),
		)
		.route("/api/therapy-companion/summaries/{id}", get(get_session_summary))
		.layer(cors)
		.with_state(state)
}

/// Credentialed CORS for the configured browser origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
	let origins = origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(err) => {
				tracing::warn!(origin, error = %err, "Ignoring invalid CORS origin.");

				None
			},
		})
		.collect::<Vec<_>>();

	CorsLayer::new()
		.allow_origin(origins)
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
		.allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
		.allow_credentials(true)
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

async fn root() -> Json<Value> {
	Json(json!({ "name": daybook_cli::SERVICE_NAME, "version": daybook_cli::VERSION }))
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "healthy" }))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskItem>>, ApiError> {
	let response = state.service.list_tasks().await?;

	Ok(Json(response))
}

async fn get_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<TaskItem>, ApiError> {
	let response = state.service.get_task(&id).await?;

	Ok(Json(response))
}

async fn create_task(
	State(state): State<AppState>,
	Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskItem>), ApiError> {
	let response = state.service.create_task(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn update_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskItem>, ApiError> {
	let response = state.service.update_task(&id, payload).await?;

	Ok(Json(response))
}

async fn delete_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_task(&id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn search_tasks(
	State(state): State<AppState>,
	Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<TaskItem>>, ApiError> {
	let response = state.service.search_tasks(&query.q).await?;

	Ok(Json(response))
}

async fn list_events(
	State(state): State<AppState>,
	Query(query): Query<ListEventsRequest>,
) -> Result<Json<Vec<EventItem>>, ApiError> {
	let response = state.service.list_events(query).await?;

	Ok(Json(response))
}

async fn events_on_date(
	State(state): State<AppState>,
	Path(date): Path<String>,
) -> Result<Json<Vec<EventItem>>, ApiError> {
	let response = state.service.events_on_date(&date).await?;

	Ok(Json(response))
}

async fn get_event(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<EventItem>, ApiError> {
	let response = state.service.get_event(&id).await?;

	Ok(Json(response))
}

async fn create_event(
	State(state): State<AppState>,
	Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventItem>), ApiError> {
	let response = state.service.create_event(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn update_event(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<EventItem>, ApiError> {
	let response = state.service.update_event(&id, payload).await?;

	Ok(Json(response))
}

async fn delete_event(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_event(&id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn list_daily_notes(
	State(state): State<AppState>,
	Query(query): Query<ListDailyNotesRequest>,
) -> Result<Json<Vec<DailyNoteItem>>, ApiError> {
	let response = state.service.list_daily_notes(query).await?;

	Ok(Json(response))
}

async fn get_today(State(state): State<AppState>) -> Result<Json<DailyNoteItem>, ApiError> {
	let response = state.service.get_today().await?;

	Ok(Json(response))
}

async fn get_daily_note(
	State(state): State<AppState>,
	Path(date): Path<String>,
) -> Result<Json<DailyNoteItem>, ApiError> {
	let response = state.service.get_daily_note(&date).await?;

	Ok(Json(response))
}

async fn create_daily_note(
	State(state): State<AppState>,
	Json(payload): Json<CreateDailyNoteRequest>,
) -> Result<(StatusCode, Json<DailyNoteItem>), ApiError> {
	let response = state.service.create_daily_note(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn replace_daily_note(
	State(state): State<AppState>,
	Path(date): Path<String>,
	Json(payload): Json<ReplaceDailyNoteRequest>,
) -> Result<Json<DailyNoteItem>, ApiError> {
	let response = state.service.replace_daily_note(&date, payload).await?;

	Ok(Json(response))
}

async fn patch_daily_note(
	State(state): State<AppState>,
	Path(date): Path<String>,
	Json(payload): Json<PatchDailyNoteRequest>,
) -> Result<Json<DailyNoteItem>, ApiError> {
	let response = state.service.patch_daily_note(&date, payload).await?;

	Ok(Json(response))
}

async fn delete_daily_note(
	State(state): State<AppState>,
	Path(date): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_daily_note(&date).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn list_living_contexts(
	State(state): State<AppState>,
	Query(query): Query<DateRangeRequest>,
) -> Result<Json<Vec<LivingContextItem>>, ApiError> {
	let response = state.service.list_living_contexts(query).await?;

	Ok(Json(response))
}

async fn get_living_context(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<LivingContextItem>, ApiError> {
	let response = state.service.get_living_context(&id).await?;

	Ok(Json(response))
}

async fn create_living_context(
	State(state): State<AppState>,
	Json(payload): Json<CreateLivingContextRequest>,
) -> Result<(StatusCode, Json<SyncResponse>), ApiError> {
	let response = state.service.create_living_context(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn list_session_summaries(
	State(state): State<AppState>,
	Query(query): Query<DateRangeRequest>,
) -> Result<Json<Vec<SessionSummaryItem>>, ApiError> {
	let response = state.service.list_session_summaries(query).await?;

	Ok(Json(response))
}

async fn get_session_summary(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<SessionSummaryItem>, ApiError> {
	let response = state.service.get_session_summary(&id).await?;

	Ok(Json(response))
}

async fn create_session_summary(
	State(state): State<AppState>,
	Json(payload): Json<CreateSessionSummaryRequest>,
) -> Result<(StatusCode, Json<SyncResponse>), ApiError> {
	let response = state.service.create_session_summary(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}
