use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Attendance;
use crate::repositories::AttendanceRepository;
use crate::utils::AppError;

pub struct PostgresAttendanceRepo {
    pool: PgPool,
}

impl PostgresAttendanceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PostgresAttendanceRepo {
    async fn create(&self, attendance: &Attendance) -> Result<Attendance, AppError> {
        let created = sqlx::query_as::<_, Attendance>(
            r#"INSERT INTO attendances (id, user_id, event_id, guests, message, created_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(attendance.id)
        .bind(attendance.user_id)
        .bind(attendance.event_id)
        .bind(attendance.guests)
        .bind(&attendance.message)
        .bind(attendance.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Attendance>, AppError> {
        let rows = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendances WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
