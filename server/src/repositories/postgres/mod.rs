use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::utils::AppError;

mod attendance_repo;
mod event_repo;
mod profile_repo;
mod session_repo;
mod user_repo;

pub use attendance_repo::PostgresAttendanceRepo;
pub use event_repo::PostgresEventRepo;
pub use profile_repo::PostgresProfileRepo;
pub use session_repo::PostgresSessionRepo;
pub use user_repo::PostgresUserRepo;

pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(format!("migrations failed: {e}")))?;
    info!("Migrations run successfully");

    Ok(pool)
}
