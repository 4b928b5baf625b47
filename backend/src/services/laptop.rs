//! Laptop inventory: registration and reads

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Actor, AuditAction, AuditEntity, Laptop, LaptopFilter, LaptopRow, LaptopStatus,
    NewLaptopInput, UserRole, LAPTOP_COLUMNS,
};
use crate::services::records;
use crate::services::AuditService;
use shared::{Pagination, PaginatedResponse, PaginationMeta};

/// Laptop service for the inventory
#[derive(Clone)]
pub struct LaptopService {
    db: PgPool,
}

/// Clients only see laptops owned by their company
pub fn check_laptop_access(actor: &Actor, laptop: &Laptop) -> AppResult<()> {
    match (actor.role, laptop.client_company_id) {
        (UserRole::Client, None) => Err(AppError::Forbidden(
            "Record belongs to another company".to_string(),
        )),
        (_, Some(company)) => Ok(actor.require_company(company)?),
        (_, None) => Ok(()),
    }
}

impl LaptopService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a standalone laptop as `available`
    pub async fn create_laptop(&self, actor: &Actor, input: NewLaptopInput) -> AppResult<Laptop> {
        actor.require_role(
            &[UserRole::Logistics, UserRole::Warehouse],
            "register laptops",
        )?;
        input.details.check()?;

        let mut conn = self.db.acquire().await?;
        let laptop = records::insert_laptop(
            &mut conn,
            &input.details,
            LaptopStatus::Available,
            input.client_company_id,
            None,
        )
        .await?;

        tracing::info!(laptop_id = %laptop.id, serial = %laptop.serial_number, "Laptop registered");
        AuditService::new(self.db.clone())
            .record_best_effort(
                actor,
                AuditAction::LaptopCreated,
                AuditEntity::Laptop,
                laptop.id,
                serde_json::json!({
                    "serial_number": laptop.serial_number,
                    "client_company_id": laptop.client_company_id,
                }),
            )
            .await;

        Ok(laptop)
    }

    pub async fn get_laptop(&self, actor: &Actor, laptop_id: Uuid) -> AppResult<Laptop> {
        let mut conn = self.db.acquire().await?;
        let laptop = records::find_laptop(&mut conn, laptop_id).await?;
        check_laptop_access(actor, &laptop)?;
        Ok(laptop)
    }

    /// List laptops by status and company, newest first
    pub async fn list_laptops(
        &self,
        actor: &Actor,
        filter: LaptopFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Laptop>> {
        let status = filter.status()?;
        let company = actor.company_scope().or(filter.client_company_id);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM laptops
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR client_company_id = $2)
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(company)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, LaptopRow>(&format!(
            r#"
            SELECT {}
            FROM laptops
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR client_company_id = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            LAPTOP_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(company)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: crate::models::convert_rows(rows)?,
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn laptop(company: Option<Uuid>) -> Laptop {
        Laptop {
            id: Uuid::new_v4(),
            serial_number: "SN-1".to_string(),
            brand: None,
            model: None,
            cpu: None,
            ram_gb: None,
            ssd_gb: None,
            status: LaptopStatus::Available,
            client_company_id: company,
            software_engineer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn actor(role: UserRole, company: Option<Uuid>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role,
            client_company_id: company,
        }
    }

    #[test]
    fn test_client_sees_only_own_laptops() {
        let company = Uuid::new_v4();
        let client = actor(UserRole::Client, Some(company));

        assert!(check_laptop_access(&client, &laptop(Some(company))).is_ok());
        assert!(check_laptop_access(&client, &laptop(Some(Uuid::new_v4()))).is_err());
        assert!(check_laptop_access(&client, &laptop(None)).is_err());
    }

    #[test]
    fn test_staff_see_everything() {
        let warehouse = actor(UserRole::Warehouse, None);
        assert!(check_laptop_access(&warehouse, &laptop(None)).is_ok());
        assert!(check_laptop_access(&warehouse, &laptop(Some(Uuid::new_v4()))).is_ok());
    }
}
