//! Warehouse reception reports
//!
//! Submission takes photos already written to staging. The report row is
//! inserted in a transaction and the photos are published only after it
//! commits. A failure before the commit discards the staged files; a
//! failure while publishing removes what was already published and
//! withdraws the row.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AuditAction, AuditEntity, CompleteReceptionPhotos, ReceptionPhotos, ReceptionReport,
    ReceptionReportRow, ReceptionReportStatus, UserRole, RECEPTION_REPORT_COLUMNS,
};
use crate::services::laptop::check_laptop_access;
use crate::services::records;
use crate::services::storage::{FileStorage, StagedFile};
use crate::services::AuditService;
use shared::{check_approval, check_reception_eligibility, status_after_approval};

/// Reception report service
#[derive(Clone)]
pub struct ReceptionService {
    db: PgPool,
    storage: FileStorage,
}

impl ReceptionService {
    pub fn new(db: PgPool, storage: FileStorage) -> Self {
        Self { db, storage }
    }

    /// File a reception report for a laptop
    pub async fn submit_report(
        &self,
        actor: &Actor,
        laptop_id: Uuid,
        notes: Option<String>,
        photos: ReceptionPhotos<StagedFile>,
    ) -> AppResult<ReceptionReport> {
        let precheck = actor
            .require_role(&[UserRole::Warehouse], "submit reception reports")
            .and_then(|_| photos.check_complete());
        if let Err(e) = precheck {
            self.storage.discard(&photos.into_present()).await;
            return Err(e.into());
        }

        let photos = photos
            .complete()?
            .map(|_, file| (self.storage.public_url(&file), file));

        let inserted = async {
            let mut tx = self.db.begin().await?;
            let report = self.insert_report(&mut tx, actor, laptop_id, notes, &photos).await?;
            tx.commit().await?;
            Ok::<_, AppError>(report)
        }
        .await;
        let report = match inserted {
            Ok(report) => report,
            Err(e) => {
                self.storage.discard(&staged_files(photos)).await;
                return Err(e);
            }
        };

        if let Err(e) = self.publish_photos(photos).await {
            self.withdraw_report(report.id).await;
            return Err(e);
        }

        tracing::info!(report_id = %report.id, %laptop_id, "Reception report submitted");
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::ReceptionReportCreated,
                AuditEntity::ReceptionReport,
                report.id,
                serde_json::json!({
                    "laptop_id": laptop_id,
                    "shipment_id": report.shipment_id,
                }),
            )
            .await;

        Ok(report)
    }

    /// Move every staged photo to its public location, all or nothing
    async fn publish_photos(
        &self,
        photos: CompleteReceptionPhotos<(String, StagedFile)>,
    ) -> AppResult<()> {
        let mut published = Vec::new();
        let mut pending = photos.into_vec().into_iter();

        while let Some((photo, (url, file))) = pending.next() {
            if let Err(e) = self.storage.promote(&file).await {
                tracing::warn!(photo = photo.field_name(), error = %e, "Failed to publish photo");
                self.unpublish(&published).await;
                let rest: Vec<StagedFile> = std::iter::once(file)
                    .chain(pending.map(|(_, (_, file))| file))
                    .collect();
                self.storage.discard(&rest).await;
                return Err(e);
            }
            published.push(url);
        }

        Ok(())
    }

    /// Compensate for a committed report whose photos could not be published
    async fn withdraw_report(&self, report_id: Uuid) {
        let deleted = sqlx::query("DELETE FROM reception_reports WHERE id = $1")
            .bind(report_id)
            .execute(&self.db)
            .await;
        if let Err(e) = deleted {
            tracing::error!(%report_id, error = %e, "Report left without its photos");
        }
    }

    async fn unpublish(&self, urls: &[String]) {
        for url in urls {
            if let Err(e) = self.storage.delete_file(url).await {
                tracing::warn!(%url, error = %e, "Failed to remove published photo");
            }
        }
    }

    async fn insert_report(
        &self,
        conn: &mut PgConnection,
        actor: &Actor,
        laptop_id: Uuid,
        notes: Option<String>,
        photos: &CompleteReceptionPhotos<(String, StagedFile)>,
    ) -> AppResult<ReceptionReport> {
        let laptop = records::lock_laptop(conn, laptop_id).await?;
        let has_pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reception_reports WHERE laptop_id = $1 AND status = $2)",
        )
        .bind(laptop_id)
        .bind(ReceptionReportStatus::Pending.as_str())
        .fetch_one(&mut *conn)
        .await?;
        check_reception_eligibility(laptop.status, has_pending)?;

        // The inbound shipment that brought the laptop here, if any
        let shipment_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT sl.shipment_id
            FROM shipment_laptops sl
            JOIN shipments s ON s.id = sl.shipment_id
            WHERE sl.laptop_id = $1 AND s.shipment_type <> 'warehouse_to_engineer'
            ORDER BY sl.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(laptop_id)
        .fetch_optional(&mut *conn)
        .await?;

        let report: ReceptionReport = sqlx::query_as::<_, ReceptionReportRow>(&format!(
            r#"
            INSERT INTO reception_reports (
                laptop_id, shipment_id, warehouse_user_id, notes,
                photo_serial_number, photo_external_condition, photo_working_condition, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            RECEPTION_REPORT_COLUMNS
        ))
        .bind(laptop_id)
        .bind(shipment_id)
        .bind(actor.user_id)
        .bind(notes.filter(|n| !n.trim().is_empty()))
        .bind(&photos.serial_number.0)
        .bind(&photos.external_condition.0)
        .bind(&photos.working_condition.0)
        .bind(ReceptionReportStatus::Pending.as_str())
        .fetch_one(&mut *conn)
        .await?
        .try_into()?;

        Ok(report)
    }

    /// Approve a pending report and book the laptop into the warehouse
    pub async fn approve_report(&self, actor: &Actor, report_id: Uuid) -> AppResult<ReceptionReport> {
        actor.require_role(&[UserRole::Logistics], "approve reception reports")?;

        let mut tx = self.db.begin().await?;

        let report: ReceptionReport = sqlx::query_as::<_, ReceptionReportRow>(&format!(
            "SELECT {} FROM reception_reports WHERE id = $1 FOR UPDATE",
            RECEPTION_REPORT_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception report".to_string()))?
        .try_into()?;
        check_approval(report.status)?;

        let approved: ReceptionReport = sqlx::query_as::<_, ReceptionReportRow>(&format!(
            r#"
            UPDATE reception_reports
            SET status = $2, approved_by = $3, approved_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RECEPTION_REPORT_COLUMNS
        ))
        .bind(report_id)
        .bind(ReceptionReportStatus::Approved.as_str())
        .bind(actor.user_id)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        // A laptop that already left on another shipment keeps its status
        let laptop = records::lock_laptop(&mut tx, report.laptop_id).await?;
        let laptop_moved = laptop.status.can_be_received();
        if laptop_moved {
            sqlx::query("UPDATE laptops SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(laptop.id)
                .bind(status_after_approval().as_str())
                .execute(&mut *tx)
                .await?;
        } else {
            tracing::warn!(
                %report_id,
                laptop_id = %laptop.id,
                status = %laptop.status,
                "Approved report for a laptop no longer at the warehouse"
            );
        }

        tx.commit().await?;

        tracing::info!(%report_id, laptop_id = %laptop.id, "Reception report approved");
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::ReceptionReportApproved,
                AuditEntity::ReceptionReport,
                report_id,
                serde_json::json!({
                    "laptop_id": laptop.id,
                    "laptop_status_updated": laptop_moved,
                }),
            )
            .await;

        Ok(approved)
    }

    /// Reports filed for a laptop, newest first
    pub async fn list_for_laptop(
        &self,
        actor: &Actor,
        laptop_id: Uuid,
    ) -> AppResult<Vec<ReceptionReport>> {
        let mut conn = self.db.acquire().await?;

        let laptop = records::find_laptop(&mut conn, laptop_id).await?;
        check_laptop_access(actor, &laptop)?;

        let rows = sqlx::query_as::<_, ReceptionReportRow>(&format!(
            "SELECT {} FROM reception_reports WHERE laptop_id = $1 ORDER BY created_at DESC",
            RECEPTION_REPORT_COLUMNS
        ))
        .bind(laptop_id)
        .fetch_all(&mut *conn)
        .await?;

        crate::models::convert_rows(rows)
    }
}

fn staged_files(photos: CompleteReceptionPhotos<(String, StagedFile)>) -> Vec<StagedFile> {
    photos.into_vec().into_iter().map(|(_, (_, file))| file).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReceptionPhoto;
    use crate::test_support::{actor, lazy_state};
    use tempfile::TempDir;

    fn files_under(dir: &std::path::Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        files_under(&path)
                    } else {
                        1
                    }
                })
                .sum(),
            Err(_) => 0,
        }
    }

    #[tokio::test]
    async fn test_incomplete_photos_leave_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let state = lazy_state(&dir.path().to_string_lossy());
        let service = ReceptionService::new(state.db.clone(), state.storage.clone());

        let mut photos = ReceptionPhotos::default();
        photos.set(
            ReceptionPhoto::SerialNumber,
            state.storage.save_upload(b"serial", "jpg").await.unwrap(),
        );
        photos.set(
            ReceptionPhoto::ExternalCondition,
            state.storage.save_upload(b"outside", "png").await.unwrap(),
        );
        assert_eq!(files_under(dir.path()), 2);

        let result = service
            .submit_report(&actor(UserRole::Warehouse), Uuid::new_v4(), None, photos)
            .await;

        match result {
            Err(AppError::Validation { field, .. }) => {
                assert_eq!(field, ReceptionPhoto::WorkingCondition.field_name())
            }
            other => panic!("expected a validation error, got {:?}", other.map(|r| r.id)),
        }
        assert_eq!(files_under(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_wrong_role_discards_staged_photos() {
        let dir = TempDir::new().unwrap();
        let state = lazy_state(&dir.path().to_string_lossy());
        let service = ReceptionService::new(state.db.clone(), state.storage.clone());

        let mut photos = ReceptionPhotos::default();
        for photo in ReceptionPhoto::ALL {
            photos.set(photo, state.storage.save_upload(b"bytes", "jpg").await.unwrap());
        }

        let result = service
            .submit_report(&actor(UserRole::Client), Uuid::new_v4(), None, photos)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(files_under(dir.path()), 0);
    }
}
