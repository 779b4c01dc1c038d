use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resumes::form::ResumeForm;
use crate::resumes::query::{ListParams, ListQuery};
use crate::resumes::wire::{encode_choices, encode_resume};
use crate::routes::base_url::BaseUrl;
use crate::state::AppState;

/// Malformed ids are reported as missing records, not as bad requests.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Resume {raw} not found")))
}

/// GET /api/v1/resumes?search=&ordering=
pub async fn list_resumes(
    State(state): State<AppState>,
    base_url: BaseUrl,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Value>>, AppError> {
    let query = ListQuery::from_params(&params);
    let resumes = state.store.list(&query).await?;
    Ok(Json(
        resumes
            .iter()
            .map(|r| encode_resume(r, base_url.as_deref()))
            .collect(),
    ))
}

/// POST /api/v1/resumes
pub async fn create_resume(
    State(state): State<AppState>,
    base_url: BaseUrl,
    form: ResumeForm,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let submission = form.into_new_submission()?;
    let resume = state.store.create(submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(encode_resume(&resume, base_url.as_deref())),
    ))
}

/// GET /api/v1/resumes/:id
pub async fn get_resume(
    State(state): State<AppState>,
    base_url: BaseUrl,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let resume = state.store.retrieve(parse_id(&id)?).await?;
    Ok(Json(encode_resume(&resume, base_url.as_deref())))
}

/// PUT|PATCH /api/v1/resumes/:id
/// Both verbs only touch the fields present in the body.
pub async fn update_resume(
    State(state): State<AppState>,
    base_url: BaseUrl,
    Path(id): Path<String>,
    form: ResumeForm,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let submission = form.into_submission()?;
    let resume = state.store.update(id, submission).await?;
    Ok(Json(encode_resume(&resume, base_url.as_deref())))
}

/// DELETE /api/v1/resumes/:id
pub async fn delete_resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/choices
pub async fn resume_choices() -> Json<Value> {
    Json(encode_choices())
}
