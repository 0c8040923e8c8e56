//! Demo state queries
//!
//! The replay controls live in a single pinned row (id = 1). Readers
//! re-create the row if a reset removed it, so there is never a window
//! where the controls are unreadable.

use chrono::Utc;
use sqlx::SqlitePool;

use driftwatch_common::db::models::DemoState;
use driftwatch_common::Result;

async fn ensure_row(pool: &SqlitePool) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO demo_state (id) VALUES (1)")
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_state(pool: &SqlitePool) -> Result<DemoState> {
    ensure_row(pool).await?;

    let (speed, is_paused, current_position): (f64, bool, i64) = sqlx::query_as(
        "SELECT speed, is_paused, current_position FROM demo_state WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;

    Ok(DemoState {
        speed,
        is_paused,
        current_position,
    })
}

pub async fn set_speed(pool: &SqlitePool, speed: f64) -> Result<()> {
    ensure_row(pool).await?;
    sqlx::query("UPDATE demo_state SET speed = ?, updated_at = ? WHERE id = 1")
        .bind(speed)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_paused(pool: &SqlitePool, paused: bool) -> Result<()> {
    ensure_row(pool).await?;
    sqlx::query("UPDATE demo_state SET is_paused = ?, updated_at = ? WHERE id = 1")
        .bind(paused)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_position(pool: &SqlitePool, position: i64) -> Result<()> {
    ensure_row(pool).await?;
    sqlx::query("UPDATE demo_state SET current_position = ?, updated_at = ? WHERE id = 1")
        .bind(position)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete every row in FK-safe order and recreate a default demo row.
pub async fn reset_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM comments").execute(pool).await?;
    sqlx::query("DELETE FROM posts").execute(pool).await?;
    sqlx::query("DELETE FROM incidents").execute(pool).await?;
    sqlx::query("DELETE FROM demo_state").execute(pool).await?;

    ensure_row(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftwatch_common::db::init_memory_database;
    use driftwatch_common::db::models::Severity;

    #[tokio::test]
    async fn test_defaults_present() {
        let pool = init_memory_database().await.unwrap();
        let state = get_state(&pool).await.unwrap();
        assert_eq!(state.speed, 1.0);
        assert!(!state.is_paused);
        assert_eq!(state.current_position, 0);
    }

    #[tokio::test]
    async fn test_controls_round_trip() {
        let pool = init_memory_database().await.unwrap();

        set_speed(&pool, 2.5).await.unwrap();
        set_paused(&pool, true).await.unwrap();
        set_position(&pool, 7).await.unwrap();

        let state = get_state(&pool).await.unwrap();
        assert_eq!(state.speed, 2.5);
        assert!(state.is_paused);
        assert_eq!(state.current_position, 7);
    }

    #[tokio::test]
    async fn test_reset_clears_everything_and_restores_defaults() {
        let pool = init_memory_database().await.unwrap();

        crate::db::incidents::create(
            &pool,
            crate::db::incidents::NewIncident {
                id: Some("inc-1".to_string()),
                title: "Flood".to_string(),
                severity: Severity::Critical,
                location: "Riverside".to_string(),
                status: None,
            },
        )
        .await
        .unwrap();
        set_speed(&pool, 4.0).await.unwrap();

        reset_all(&pool).await.unwrap();

        assert_eq!(crate::db::posts::count(&pool).await.unwrap(), 0);
        assert!(crate::db::incidents::list(&pool, None).await.unwrap().is_empty());

        let state = get_state(&pool).await.unwrap();
        assert_eq!(state.speed, 1.0);
        assert!(!state.is_paused);
    }
}
