mod content;

use axum::extract::{Extension, Path, State};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use studygroup_domain::groups::Group;
use validator::Validate;

use crate::gateway;
use crate::middleware::AuthContext;
use crate::{error::ApiError, middleware as app_middleware, observability, state::AppState, validation};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/groups", post(create_group).get(list_my_groups))
        .route("/v1/groups/join", post(join_group))
        .route("/v1/groups/:group_id", get(get_group).delete(delete_group))
        .route("/v1/groups/:group_id/leave", post(leave_group))
        .route(
            "/v1/courses/:course_id/group",
            post(create_course_group).get(get_course_group),
        )
        .route("/v1/courses/:course_id/group/join", post(join_course_group))
        .merge(content::router(&state))
        .route_layer(middleware::from_fn(app_middleware::require_auth_middleware));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/ws", get(gateway::gateway_ws))
        .merge(protected)
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(app_middleware::metrics_layer));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer());
    }

    app.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

async fn metrics() -> impl IntoResponse {
    observability::render_metrics().unwrap_or_default()
}

#[derive(Debug, Deserialize, Validate)]
struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    name: String,
    #[validate(length(max = 500))]
    description: Option<String>,
}

async fn create_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    validation::validate(&payload)?;
    let actor = auth.actor()?;
    let group = state
        .groups
        .create_group(&actor, &payload.name, payload.description.as_deref().unwrap_or(""))
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn list_my_groups(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let actor = auth.actor()?;
    let groups = state.groups.list_groups_by_user(&actor.user_id).await?;
    Ok(Json(groups))
}

#[derive(Debug, Deserialize)]
struct JoinGroupRequest {
    join_code: Option<String>,
    invite_token: Option<String>,
}

async fn join_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<JoinGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let actor = auth.actor()?;
    let group = state
        .groups
        .join_group(&actor, payload.join_code, payload.invite_token)
        .await?;
    Ok(Json(group))
}

async fn get_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let actor = auth.actor()?;
    let group = state.groups.get_group(&actor, &group_id).await?;
    Ok(Json(group))
}

async fn delete_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = auth.actor()?;
    state.groups.delete_group(&actor, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn leave_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let actor = auth.actor()?;
    state.groups.leave_group(&actor, &group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
struct CreateCourseGroupRequest {
    #[validate(length(min = 1, max = 100))]
    name: String,
    #[validate(length(max = 500))]
    description: Option<String>,
}

async fn create_course_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(course_id): Path<String>,
    Json(payload): Json<CreateCourseGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    validation::validate(&payload)?;
    let actor = auth.actor()?;
    let group = state
        .groups
        .create_course_group(
            &actor,
            &course_id,
            &payload.name,
            payload.description.as_deref().unwrap_or(""),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_course_group(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = state.groups.get_course_group_by_course(&course_id).await?;
    Ok(Json(group))
}

async fn join_course_group(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(course_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let actor = auth.actor()?;
    let group = state.groups.join_course_group(&actor, &course_id).await?;
    Ok(Json(group))
}
