use axum::extract::{DefaultBodyLimit, Extension, Multipart, Path, State};
use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use studygroup_domain::files::FileAttachment;
use studygroup_domain::messages::Message;
use studygroup_domain::polls::{Poll, PollCreate};
use studygroup_domain::resources::{Resource, ResourceCreate};
use studygroup_domain::tasks::{Task, TaskCreate, TaskStatus};
use validator::Validate;

use crate::gateway::events::ServerEvent;
use crate::middleware::AuthContext;
use crate::{error::ApiError, state::AppState, validation};

/// Group-scoped content endpoints. Messages are bridged into the group's
/// realtime room on write; resources and tasks reach the room through the
/// creator's gateway hint instead.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/v1/groups/:group_id/messages",
            post(send_message).get(list_messages),
        )
        .route(
            "/v1/groups/:group_id/resources",
            post(add_resource).get(list_resources),
        )
        .route("/v1/groups/:group_id/tasks", post(add_task).get(list_tasks))
        .route(
            "/v1/groups/:group_id/tasks/:task_id/status",
            post(update_task_status),
        )
        .route("/v1/groups/:group_id/polls", post(create_poll).get(list_polls))
        .route("/v1/groups/:group_id/polls/:poll_id/vote", post(vote))
        .route(
            "/v1/groups/:group_id/files",
            post(upload_file)
                .get(list_files)
                .route_layer(DefaultBodyLimit::max(state.config.max_upload_bytes as usize)),
        )
}

#[derive(Debug, Deserialize, Validate)]
struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    text: String,
}

async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    validation::validate(&payload)?;
    let actor = auth.actor()?;
    let message = state.messages.send(&actor, &group_id, &payload.text).await?;
    state
        .rooms
        .publish(
            &group_id,
            ServerEvent::NewMessage {
                message: message.clone(),
            },
        )
        .await;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let actor = auth.actor()?;
    let messages = state.messages.history(&actor, &group_id).await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize, Validate)]
struct AddResourceRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(min = 1))]
    url: String,
    #[validate(length(min = 1, max = 50))]
    kind: String,
}

async fn add_resource(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
    Json(payload): Json<AddResourceRequest>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    validation::validate(&payload)?;
    let actor = auth.actor()?;
    let resource = state
        .resources
        .add(
            &actor,
            &group_id,
            ResourceCreate {
                title: payload.title,
                url: payload.url,
                kind: payload.kind,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

async fn list_resources(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let actor = auth.actor()?;
    let resources = state.resources.list(&actor, &group_id).await?;
    Ok(Json(resources))
}

#[derive(Debug, Deserialize, Validate)]
struct AddTaskRequest {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    assignees: Vec<String>,
    due_date_ms: Option<i64>,
}

async fn add_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
    Json(payload): Json<AddTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    validation::validate(&payload)?;
    let actor = auth.actor()?;
    let task = state
        .tasks
        .add(
            &actor,
            &group_id,
            TaskCreate {
                title: payload.title,
                description: payload.description,
                assignees: payload.assignees,
                due_date_ms: payload.due_date_ms,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let actor = auth.actor()?;
    let tasks = state.tasks.list(&actor, &group_id).await?;
    Ok(Json(tasks))
}

#[derive(Debug, Deserialize)]
struct UpdateTaskStatusRequest {
    status: TaskStatus,
}

async fn update_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((group_id, task_id)): Path<(String, String)>,
    Json(payload): Json<UpdateTaskStatusRequest>,
) -> Result<Json<Task>, ApiError> {
    let actor = auth.actor()?;
    let task = state
        .tasks
        .update_status(&actor, &group_id, &task_id, payload.status)
        .await?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize, Validate)]
struct CreatePollRequest {
    #[validate(length(min = 1, max = 500))]
    question: String,
    options: Vec<String>,
    expires_at_ms: Option<i64>,
}

async fn create_poll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
    Json(payload): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<Poll>), ApiError> {
    validation::validate(&payload)?;
    let actor = auth.actor()?;
    let poll = state
        .polls
        .create(
            &actor,
            &group_id,
            PollCreate {
                question: payload.question,
                options: payload.options,
                expires_at_ms: payload.expires_at_ms,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

async fn list_polls(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Poll>>, ApiError> {
    let actor = auth.actor()?;
    let polls = state.polls.list(&actor, &group_id).await?;
    Ok(Json(polls))
}

#[derive(Debug, Deserialize)]
struct VoteRequest {
    option_index: usize,
}

async fn vote(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((group_id, poll_id)): Path<(String, String)>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Poll>, ApiError> {
    let actor = auth.actor()?;
    let poll = state
        .polls
        .vote(&actor, &group_id, &poll_id, payload.option_index)
        .await?;
    Ok(Json(poll))
}

async fn upload_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileAttachment>), ApiError> {
    let actor = auth.actor()?;
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        tracing::debug!(error = %err, "multipart read failed");
        ApiError::Validation("invalid multipart payload".into())
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|err| {
            tracing::debug!(error = %err, "multipart body read failed");
            ApiError::PayloadTooLarge
        })?;
        let attachment = state
            .files
            .store(&actor, &group_id, &original_name, &mime_type, bytes.to_vec())
            .await?;
        return Ok((StatusCode::CREATED, Json(attachment)));
    }
    Err(ApiError::Validation("missing 'file' field".into()))
}

async fn list_files(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<FileAttachment>>, ApiError> {
    let actor = auth.actor()?;
    let files = state.files.list(&actor, &group_id).await?;
    Ok(Json(files))
}
