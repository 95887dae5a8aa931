//! Document handlers

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use core_kernel::DocumentId;

use crate::dto::documents::DocumentResponse;
use crate::error::ApiError;
use crate::{organization_id, AppState};

/// Gets a document's balance and status
pub async fn get_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let organization_id = organization_id(&headers)?;
    let document_id = DocumentId::from_uuid(id);

    let document = state
        .store
        .get_document(organization_id, document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document {document_id} not found")))?;

    Ok(Json(document.into()))
}
