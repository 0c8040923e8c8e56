//! Incident queries
//!
//! Default listing order puts CRITICAL incidents first, newest first
//! within each band.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use driftwatch_common::db::models::{Incident, Severity};
use driftwatch_common::{Error, Result};

/// Fields accepted when creating an incident.
///
/// Scripted records supply their own id; API callers leave it unset and
/// get a fresh UUID.
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub id: Option<String>,
    pub title: String,
    pub severity: Severity,
    pub location: String,
    pub status: Option<String>,
}

/// Partial update; unset fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct IncidentPatch {
    pub title: Option<String>,
    pub severity: Option<Severity>,
    pub location: Option<String>,
    pub status: Option<String>,
}

fn incident_from_row(row: &SqliteRow) -> Result<Incident> {
    let severity: String = row.get("severity");
    Ok(Incident {
        id: row.get("id"),
        title: row.get("title"),
        severity: severity.parse()?,
        location: row.get("location"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub async fn create(pool: &SqlitePool, new: NewIncident) -> Result<Incident> {
    let id = new.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let status = new.status.unwrap_or_else(|| "ACTIVE".to_string());
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO incidents (id, title, severity, location, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.title)
    .bind(new.severity.as_str())
    .bind(&new.location)
    .bind(&status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get(pool, &id).await
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Incident> {
    let row = sqlx::query(
        "SELECT id, title, severity, location, status, created_at, updated_at
         FROM incidents WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("incident {}", id)))?;

    incident_from_row(&row)
}

pub async fn exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM incidents WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// List incidents, optionally filtered by severity.
pub async fn list(pool: &SqlitePool, severity: Option<Severity>) -> Result<Vec<Incident>> {
    let rows = match severity {
        Some(sev) => {
            sqlx::query(
                "SELECT id, title, severity, location, status, created_at, updated_at
                 FROM incidents WHERE severity = ?
                 ORDER BY created_at DESC",
            )
            .bind(sev.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, title, severity, location, status, created_at, updated_at
                 FROM incidents
                 ORDER BY CASE severity WHEN 'CRITICAL' THEN 0 ELSE 1 END, created_at DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(incident_from_row).collect()
}

/// Apply a partial update and return the updated row.
///
/// An all-unset patch still touches `updated_at` and returns the
/// current row.
pub async fn update(pool: &SqlitePool, id: &str, patch: IncidentPatch) -> Result<Incident> {
    let result = sqlx::query(
        r#"
        UPDATE incidents SET
            title = COALESCE(?, title),
            severity = COALESCE(?, severity),
            location = COALESCE(?, location),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(patch.title.as_deref())
    .bind(patch.severity.map(|s| s.as_str()))
    .bind(patch.location.as_deref())
    .bind(patch.status.as_deref())
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("incident {}", id)));
    }

    get(pool, id).await
}
