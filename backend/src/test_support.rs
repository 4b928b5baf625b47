//! Fixtures shared by the database-backed service tests

use std::sync::Arc;

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::{
    Config, DatabaseConfig, JwtConfig, NotificationConfig, ServerConfig, UploadConfig,
};
use crate::models::{Actor, UserRole};
use crate::services::{FileStorage, NotificationService};
use crate::AppState;

pub const JWT_SECRET: &str = "test-secret";

pub fn actor(role: UserRole) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        role,
        client_company_id: (role == UserRole::Client).then(Uuid::new_v4),
    }
}

pub fn notification_config(enabled: bool) -> NotificationConfig {
    NotificationConfig {
        enabled,
        from_address: "no-reply@test".to_string(),
        warehouse_email: "warehouse@test".to_string(),
        logistics_email: "logistics@test".to_string(),
    }
}

pub fn notifications(pool: &PgPool, enabled: bool) -> NotificationService {
    NotificationService::new(pool.clone(), notification_config(enabled))
}

pub fn config(upload_root: &str) -> Config {
    Config {
        environment: "test".to_string(),
        log_format: "pretty".to_string(),
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/laptop_tracking_test".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        uploads: UploadConfig {
            root_dir: upload_root.to_string(),
            public_prefix: "/uploads".to_string(),
            max_photo_bytes: 1024,
        },
        notifications: notification_config(false),
    }
}

/// State over a pool that never connects unless a query runs
pub fn lazy_state(upload_root: &str) -> AppState {
    let config = config(upload_root);
    let db = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    let storage = FileStorage::new(&config.uploads);
    AppState {
        db,
        config: Arc::new(config),
        storage,
    }
}

pub fn single_body(company: Uuid, serial_number: &str) -> serde_json::Value {
    json!({
        "shipment_type": "single_full_journey",
        "client_company_id": company,
        "jira_ticket_number": "SCOP-1042",
        "serial_number": serial_number,
        "brand": "Apple",
        "contact_name": "Dana Whitfield",
        "contact_email": "dana@client.example.com",
        "contact_phone": "+1 555 0100",
        "pickup_address": "500 Market Street",
        "pickup_city": "San Francisco",
        "pickup_state": "CA",
        "pickup_zip": "94105",
        "pickup_date": "2024-03-05"
    })
}

pub fn bulk_body(company: Uuid, laptop_count: i32) -> serde_json::Value {
    json!({
        "shipment_type": "bulk_to_warehouse",
        "client_company_id": company,
        "jira_ticket_number": "SCOP-2001",
        "laptop_count": laptop_count
    })
}

pub fn engineer_body(company: Uuid, laptop_id: Uuid, engineer_id: Uuid) -> serde_json::Value {
    json!({
        "shipment_type": "warehouse_to_engineer",
        "client_company_id": company,
        "laptop_id": laptop_id,
        "software_engineer_id": engineer_id,
        "jira_ticket_number": "SCOP-3003",
        "delivery": {
            "engineer_name": "Ravi Patel",
            "engineer_email": "ravi@client.example.com",
            "address": "12 Elm Road",
            "city": "Austin",
            "state": "TX",
            "zip": "73301"
        }
    })
}

/// File an inspection directly so a laptop qualifies for an engineer shipment
pub async fn insert_reception_report(pool: &PgPool, laptop_id: Uuid) {
    sqlx::query(
        r#"
        INSERT INTO reception_reports (
            laptop_id, warehouse_user_id,
            photo_serial_number, photo_external_condition, photo_working_condition
        )
        VALUES ($1, $2, '/uploads/reception/a.jpg', '/uploads/reception/b.jpg', '/uploads/reception/c.jpg')
        "#,
    )
    .bind(laptop_id)
    .bind(Uuid::new_v4())
    .execute(pool)
    .await
    .unwrap();
}
