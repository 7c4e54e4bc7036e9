use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{MemberSummary, Profile};
use crate::repositories::ProfileRepository;
use crate::utils::AppError;

pub struct PostgresProfileRepo {
    pool: PgPool,
}

impl PostgresProfileRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepo {
    async fn create(&self, profile: &Profile) -> Result<Profile, AppError> {
        sqlx::query_as::<_, Profile>(
            r#"INSERT INTO profiles (
                user_id, url, about, about_markup_type, role, twitter_id, skills,
                location, latitude, longitude, allow_org_emails, signup_date,
                last_email_sent, num_emails_sent, allowed_emails
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *"#,
        )
        .bind(profile.user_id)
        .bind(&profile.url)
        .bind(&profile.about)
        .bind(&profile.about_markup_type)
        .bind(&profile.role)
        .bind(&profile.twitter_id)
        .bind(&profile.skills)
        .bind(&profile.location)
        .bind(profile.latitude)
        .bind(profile.longitude)
        .bind(profile.allow_org_emails)
        .bind(profile.signup_date)
        .bind(profile.last_email_sent)
        .bind(profile.num_emails_sent)
        .bind(profile.allowed_emails)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_insert(e, "Profile"))
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn update(&self, profile: &Profile) -> Result<Profile, AppError> {
        sqlx::query_as::<_, Profile>(
            r#"UPDATE profiles SET
                url = $1, about = $2, about_markup_type = $3, role = $4, twitter_id = $5,
                skills = $6, location = $7, latitude = $8, longitude = $9,
                allow_org_emails = $10
               WHERE user_id = $11
               RETURNING *"#,
        )
        .bind(&profile.url)
        .bind(&profile.about)
        .bind(&profile.about_markup_type)
        .bind(&profile.role)
        .bind(&profile.twitter_id)
        .bind(&profile.skills)
        .bind(&profile.location)
        .bind(profile.latitude)
        .bind(profile.longitude)
        .bind(profile.allow_org_emails)
        .bind(profile.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))
    }

    async fn record_email_sent(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Profile, AppError> {
        sqlx::query_as::<_, Profile>(
            r#"UPDATE profiles
               SET last_email_sent = $2, num_emails_sent = num_emails_sent + 1
               WHERE user_id = $1
               RETURNING *"#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))
    }

    async fn count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn list_members(&self) -> Result<Vec<MemberSummary>, AppError> {
        let members = sqlx::query_as::<_, MemberSummary>(
            r#"SELECT u.username, p.role, p.location, p.latitude, p.longitude
               FROM profiles p
               JOIN users u ON u.id = p.user_id
               ORDER BY u.username ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }
}
