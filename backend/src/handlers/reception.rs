//! HTTP handlers for warehouse reception reports

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{ReceptionPhoto, ReceptionPhotos, ReceptionReport, UserRole};
use crate::services::storage::{FileStorage, StagedFile};
use crate::services::ReceptionService;
use crate::AppState;
use shared::validate_photo_filename;

/// Parts of a reception multipart body
#[derive(Default)]
struct ReceptionUpload {
    notes: Option<String>,
    photos: ReceptionPhotos<StagedFile>,
}

/// Submit a reception report with its three photos (multipart)
pub async fn submit_reception_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(laptop_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ReceptionReport>)> {
    // Nothing gets staged for callers who could never submit
    current_user
        .0
        .require_role(&[UserRole::Warehouse], "submit reception reports")?;

    let storage = state.storage.clone();
    let mut upload = ReceptionUpload::default();
    if let Err(e) = read_upload(&storage, &mut multipart, &mut upload).await {
        storage.discard(&upload.photos.into_present()).await;
        return Err(e);
    }

    let service = ReceptionService::new(state.db, storage);
    let report = service
        .submit_report(&current_user.0, laptop_id, upload.notes, upload.photos)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Stage every photo part; empty file inputs count as missing
async fn read_upload(
    storage: &FileStorage,
    multipart: &mut Multipart,
    upload: &mut ReceptionUpload,
) -> AppResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation("body", e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "notes" {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::validation("notes", e.to_string()))?;
            upload.notes = Some(text);
            continue;
        }

        let Some(photo) = ReceptionPhoto::from_field_name(&name) else {
            tracing::debug!(field = %name, "Ignoring unknown multipart field");
            continue;
        };
        if !upload.photos.missing().contains(&photo) {
            return Err(AppError::validation(
                photo.field_name(),
                "Photo was uploaded more than once",
            ));
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(photo.field_name(), e.to_string()))?;
        if bytes.is_empty() {
            continue;
        }

        let extension = validate_photo_filename(&file_name)
            .map_err(|msg| AppError::validation(photo.field_name(), msg))?;
        let staged = storage.save_upload(&bytes, &extension).await?;
        upload.photos.set(photo, staged);
    }

    Ok(())
}

/// Approve a pending reception report
pub async fn approve_reception_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<ReceptionReport>> {
    let service = ReceptionService::new(state.db, state.storage);
    let report = service.approve_report(&current_user.0, report_id).await?;
    Ok(Json(report))
}

/// List reception reports of a laptop
pub async fn list_reception_reports(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(laptop_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReceptionReport>>> {
    let service = ReceptionService::new(state.db, state.storage);
    let reports = service.list_for_laptop(&current_user.0, laptop_id).await?;
    Ok(Json(reports))
}
