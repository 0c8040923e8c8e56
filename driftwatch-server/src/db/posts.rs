//! Post queries
//!
//! Posts are immutable after insert except for the vote counters, which
//! update through a single SQL increment so concurrent votes never lose
//! a count.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use driftwatch_common::db::models::Post;
use driftwatch_common::{Error, Result};

const POST_COLUMNS: &str = "id, incident_id, parent_id, content, author, timestamp, \
                            mutation_score, mutation_category, credible_votes, total_votes";

fn post_from_row(row: &SqliteRow) -> Result<Post> {
    let category: Option<String> = row.get("mutation_category");
    Ok(Post {
        id: row.get("id"),
        incident_id: row.get("incident_id"),
        parent_id: row.get("parent_id"),
        content: row.get("content"),
        author: row.get("author"),
        timestamp: row.get("timestamp"),
        mutation_score: row.get("mutation_score"),
        mutation_category: category.as_deref().map(str::parse).transpose()?,
        credible_votes: row.get("credible_votes"),
        total_votes: row.get("total_votes"),
    })
}

/// Insert a fully constructed post row.
pub async fn insert(pool: &SqlitePool, post: &Post) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO posts (id, incident_id, parent_id, content, author, timestamp,
                           mutation_score, mutation_category, credible_votes, total_votes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.id)
    .bind(&post.incident_id)
    .bind(post.parent_id.as_deref())
    .bind(&post.content)
    .bind(&post.author)
    .bind(post.timestamp)
    .bind(post.mutation_score)
    .bind(post.mutation_category.map(|c| c.as_str()))
    .bind(post.credible_votes)
    .bind(post.total_votes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Post> {
    find(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("post {}", id)))
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(post_from_row).transpose()
}

/// Posts of one incident in arrival order.
pub async fn list_for_incident(pool: &SqlitePool, incident_id: &str) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE incident_id = ? ORDER BY timestamp ASC"
    ))
    .bind(incident_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(post_from_row).collect()
}

/// Every stored post, for the similarity scan.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Post>> {
    let rows = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts"))
        .fetch_all(pool)
        .await?;

    rows.iter().map(post_from_row).collect()
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Record one vote and return the updated post.
///
/// Both counters move in the same statement; there is no window where
/// another voter can observe or overwrite a half-applied vote.
pub async fn record_vote(pool: &SqlitePool, id: &str, is_credible: bool) -> Result<Post> {
    let credible_delta: i64 = if is_credible { 1 } else { 0 };

    let result = sqlx::query(
        "UPDATE posts SET total_votes = total_votes + 1, credible_votes = credible_votes + ?
         WHERE id = ?",
    )
    .bind(credible_delta)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("post {}", id)));
    }

    get(pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use driftwatch_common::db::init_memory_database;
    use driftwatch_common::db::models::Severity;
    use driftwatch_common::MutationCategory;

    async fn seed_incident(pool: &SqlitePool) {
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
    }

    fn post(id: &str, parent_id: Option<&str>, minutes: i64) -> Post {
        Post {
            id: id.to_string(),
            incident_id: "inc-1".to_string(),
            parent_id: parent_id.map(String::from),
            content: format!("content of {id}"),
            author: "tester".to_string(),
            timestamp: Utc::now() + Duration::minutes(minutes),
            mutation_score: if parent_id.is_some() { 12.5 } else { 0.0 },
            mutation_category: parent_id.map(|_| MutationCategory::Moderate),
            credible_votes: 0,
            total_votes: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let pool = init_memory_database().await.unwrap();
        seed_incident(&pool).await;

        insert(&pool, &post("p1", None, 0)).await.unwrap();
        insert(&pool, &post("p2", Some("p1"), 1)).await.unwrap();

        let p1 = get(&pool, "p1").await.unwrap();
        assert_eq!(p1.mutation_score, 0.0);
        assert!(p1.mutation_category.is_none());

        let p2 = get(&pool, "p2").await.unwrap();
        assert_eq!(p2.parent_id.as_deref(), Some("p1"));
        assert_eq!(p2.mutation_category, Some(MutationCategory::Moderate));
    }

    #[tokio::test]
    async fn test_list_for_incident_in_arrival_order() {
        let pool = init_memory_database().await.unwrap();
        seed_incident(&pool).await;

        // Insert out of timestamp order
        insert(&pool, &post("late", None, 10)).await.unwrap();
        insert(&pool, &post("early", None, 0)).await.unwrap();

        let posts = list_for_incident(&pool, "inc-1").await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_vote_updates_both_counters() {
        let pool = init_memory_database().await.unwrap();
        seed_incident(&pool).await;
        insert(&pool, &post("p1", None, 0)).await.unwrap();

        let after_credible = record_vote(&pool, "p1", true).await.unwrap();
        assert_eq!(after_credible.credible_votes, 1);
        assert_eq!(after_credible.total_votes, 1);

        let after_doubt = record_vote(&pool, "p1", false).await.unwrap();
        assert_eq!(after_doubt.credible_votes, 1);
        assert_eq!(after_doubt.total_votes, 2);
    }

    #[tokio::test]
    async fn test_vote_on_missing_post_is_not_found() {
        let pool = init_memory_database().await.unwrap();
        let err = record_vote(&pool, "nope", true).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_count_and_list_all() {
        let pool = init_memory_database().await.unwrap();
        seed_incident(&pool).await;
        assert_eq!(count(&pool).await.unwrap(), 0);

        insert(&pool, &post("p1", None, 0)).await.unwrap();
        insert(&pool, &post("p2", Some("p1"), 1)).await.unwrap();

        assert_eq!(count(&pool).await.unwrap(), 2);
        assert_eq!(list_all(&pool).await.unwrap().len(), 2);
    }
}
