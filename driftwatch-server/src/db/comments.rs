//! Comment queries

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use driftwatch_common::db::models::Comment;
use driftwatch_common::Result;

fn comment_from_row(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author: row.get("author"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

pub async fn insert(pool: &SqlitePool, comment: &Comment) -> Result<()> {
    sqlx::query(
        "INSERT INTO comments (id, post_id, author, content, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.post_id)
    .bind(&comment.author)
    .bind(&comment.content)
    .bind(comment.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Comments on one post, newest first.
pub async fn list_for_post(pool: &SqlitePool, post_id: &str) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        "SELECT id, post_id, author, content, created_at
         FROM comments WHERE post_id = ? ORDER BY created_at DESC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(comment_from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use driftwatch_common::db::init_memory_database;
    use driftwatch_common::db::models::{Post, Severity};

    async fn seed_post(pool: &SqlitePool) {
        crate::db::incidents::create(
            pool,
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

        crate::db::posts::insert(
            pool,
            &Post {
                id: "p1".to_string(),
                incident_id: "inc-1".to_string(),
                parent_id: None,
                content: "Water levels rising slowly.".to_string(),
                author: "river_watch".to_string(),
                timestamp: Utc::now(),
                mutation_score: 0.0,
                mutation_category: None,
                credible_votes: 0,
                total_votes: 0,
            },
        )
        .await
        .unwrap();
    }

    fn comment(id: &str, minutes: i64) -> Comment {
        Comment {
            id: id.to_string(),
            post_id: "p1".to_string(),
            author: "reader".to_string(),
            content: format!("comment {id}"),
            created_at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let pool = init_memory_database().await.unwrap();
        seed_post(&pool).await;

        insert(&pool, &comment("c-old", 0)).await.unwrap();
        insert(&pool, &comment("c-new", 5)).await.unwrap();

        let comments = list_for_post(&pool, "p1").await.unwrap();
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c-new", "c-old"]);
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let pool = init_memory_database().await.unwrap();

        let orphan = Comment {
            id: "c1".to_string(),
            post_id: "missing".to_string(),
            author: "reader".to_string(),
            content: "hello".to_string(),
            created_at: Utc::now(),
        };
        assert!(insert(&pool, &orphan).await.is_err());
    }
}
