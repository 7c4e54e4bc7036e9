use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Event;
use crate::repositories::EventRepository;
use crate::utils::AppError;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        let created = sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, creator_id, title, description, location, latitude, longitude,
                start_date, end_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *"#,
        )
        .bind(event.id)
        .bind(event.creator_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                title = $1, description = $2, location = $3, latitude = $4, longitude = $5,
                start_date = $6, end_date = $7, updated_at = $8
               WHERE id = $9
               RETURNING *"#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(event.updated_at)
        .bind(event.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    async fn list_future(
        &self,
        now: DateTime<Utc>,
        title: Option<&str>,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            r#"SELECT * FROM events
               WHERE COALESCE(end_date, start_date) >= $1
                 AND ($2::text IS NULL OR position(lower($2::text) in lower(title)) > 0)
               ORDER BY start_date ASC, created_at ASC
               LIMIT $4
               OFFSET $3"#,
        )
        .bind(now)
        .bind(title)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn count_future(&self, now: DateTime<Utc>) -> Result<i64, AppError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM events WHERE COALESCE(end_date, start_date) >= $1")
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    async fn list_starting_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as::<_, Event>(
            r#"SELECT * FROM events
               WHERE start_date >= $1 AND start_date < $2
               ORDER BY start_date ASC"#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}
