use std::sync::Arc;

use tera::Tera;
use tracing::info;

use crate::config::Config;
use crate::geo::{DisabledGeocoder, Geocoder, HttpGeocoder};
use crate::repositories::memory::MemoryStore;
use crate::repositories::postgres::{
    self, PostgresAttendanceRepo, PostgresEventRepo, PostgresProfileRepo, PostgresSessionRepo,
    PostgresUserRepo,
};
use crate::repositories::{
    AttendanceRepository, EventRepository, ProfileRepository, SessionRepository, UserRepository,
};
use crate::services::{ConsoleMailer, HttpMailer, Mailer};
use crate::signals::Signals;
use crate::templates;
use crate::utils::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub events: Arc<dyn EventRepository>,
    pub attendances: Arc<dyn AttendanceRepository>,
    pub geocoder: Arc<dyn Geocoder>,
    pub mailer: Arc<dyn Mailer>,
    pub templates: Arc<Tera>,
    pub signals: Signals,
}

impl AppState {
    /// State backed by a fresh in-memory store, with the given outbound
    /// services.
    pub fn in_memory(
        config: Config,
        geocoder: Arc<dyn Geocoder>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, AppError> {
        let store = Arc::new(MemoryStore::new());
        Ok(Self {
            config,
            users: store.clone(),
            sessions: store.clone(),
            profiles: store.clone(),
            events: store.clone(),
            attendances: store,
            geocoder,
            mailer,
            templates: Arc::new(templates::load()?),
            signals: Signals::new(),
        })
    }
}

/// Wires storage and outbound services from configuration.
pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let geocoder: Arc<dyn Geocoder> = match &config.geocoder_api_key {
        Some(key) => Arc::new(HttpGeocoder::new(
            config.geocoder_url.clone(),
            key.clone(),
            config.geocoder_timeout,
        )?),
        None => {
            info!("Geocoding disabled: GEOCODER_API_KEY not set");
            Arc::new(DisabledGeocoder)
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail_service_url {
        Some(url) => Arc::new(HttpMailer::new(
            url.clone(),
            config.mail_service_token.clone(),
            config.mail_from.clone(),
        )),
        None => {
            info!("MAIL_SERVICE_URL not set, messages will only be logged");
            Arc::new(ConsoleMailer)
        }
    };

    if config.uses_memory_store() {
        info!("Using in-memory storage, nothing will be persisted");
        return AppState::in_memory(config.clone(), geocoder, mailer);
    }

    let pool = postgres::connect(&config.database_url).await?;

    Ok(AppState {
        config: config.clone(),
        users: Arc::new(PostgresUserRepo::new(pool.clone())),
        sessions: Arc::new(PostgresSessionRepo::new(pool.clone())),
        profiles: Arc::new(PostgresProfileRepo::new(pool.clone())),
        events: Arc::new(PostgresEventRepo::new(pool.clone())),
        attendances: Arc::new(PostgresAttendanceRepo::new(pool)),
        geocoder,
        mailer,
        templates: Arc::new(templates::load()?),
        signals: Signals::new(),
    })
}
