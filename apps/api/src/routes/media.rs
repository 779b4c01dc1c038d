use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::{content_type_for, validate_key};

/// GET /media/*key
/// Streams a stored file back with a content type guessed from its extension.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_key(&key)?;
    let data = state.storage.get(&key).await?;
    Ok(([(CONTENT_TYPE, content_type_for(&key))], data))
}
