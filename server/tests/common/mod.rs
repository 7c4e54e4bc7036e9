#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use tower::ServiceExt;

use anthill_server::config::Config;
use anthill_server::geo::{GeocodedLocation, Geocoder};
use anthill_server::models::{Coordinates, Event, EventFields, User};
use anthill_server::routes::create_routes;
use anthill_server::services::Mailer;
use anthill_server::state::AppState;
use anthill_server::utils::AppError;

pub const PASSWORD: &str = "correct horse";

/// Knows a handful of cities, nothing else.
pub struct StubGeocoder;

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, query: &str) -> Option<GeocodedLocation> {
        let (lat, lon, address) = match query.to_lowercase().as_str() {
            "washington, dc" => (38.8951, -77.0364, "Washington, DC, USA"),
            "baltimore" => (39.2904, -76.6122, "Baltimore, MD, USA"),
            "chicago" => (41.8781, -87.6298, "Chicago, IL, USA"),
            _ => return None,
        };
        Some(GeocodedLocation {
            coordinates: Coordinates::new(lat, lon),
            address: address.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
    pub failing: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalServiceError("relay down".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Vec<String>,
    pub content_type: Option<String>,
    pub headers: axum::http::HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `anthill_session=...` pair from the response, ready to send back.
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookie
            .iter()
            .filter_map(|c| c.split(';').next())
            .find(|pair| pair.starts_with("anthill_session=") && pair.len() > "anthill_session=".len())
            .map(str::to_string)
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::for_memory())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_geocoder(config, Arc::new(StubGeocoder))
    }

    pub fn with_geocoder(config: Config, geocoder: Arc<dyn Geocoder>) -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::in_memory(config, geocoder, mailer.clone())
            .expect("state builds");
        let state = Arc::new(state);
        Self {
            router: create_routes(state.clone()),
            state,
            mailer,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        form: Option<&[(&str, &str)]>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(fields) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(serde_urlencoded::to_string(fields).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let headers = response.headers().clone();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            location: headers
                .get(header::LOCATION)
                .map(|v| v.to_str().unwrap().to_string()),
            set_cookie: headers
                .get_all(header::SET_COOKIE)
                .iter()
                .map(|v| v.to_str().unwrap().to_string())
                .collect(),
            content_type: headers
                .get(header::CONTENT_TYPE)
                .map(|v| v.to_str().unwrap().to_string()),
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, form: &[(&str, &str)]) -> TestResponse {
        self.request(Method::POST, uri, cookie, Some(form)).await
    }

    /// Signs up through the form and returns the session cookie.
    pub async fn register(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        let response = self
            .post(
                "/accounts/register",
                None,
                &[
                    ("username", username),
                    ("email", &email),
                    ("password", PASSWORD),
                    ("password_confirm", PASSWORD),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
        response.session_cookie().expect("session cookie set")
    }

    pub async fn user(&self, username: &str) -> User {
        self.state
            .users
            .find_by_username(username)
            .await
            .unwrap()
            .expect("user exists")
    }

    /// Stores an event directly, bypassing the form and the geocoder.
    pub async fn seed_event(
        &self,
        creator: &User,
        title: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        location: Option<(&str, f64, f64)>,
    ) -> Event {
        let mut event = Event::new(
            creator.id,
            EventFields {
                title: title.to_string(),
                description: String::new(),
                location: location.map(|(l, _, _)| l.to_string()).unwrap_or_default(),
                start_date: start,
                end_date: end,
            },
        );
        if let Some((_, lat, lon)) = location {
            event.latitude = Some(lat);
            event.longitude = Some(lon);
        }
        self.state.events.create(&event).await.unwrap()
    }

    pub async fn seed_future_event(&self, creator: &User, title: &str) -> Event {
        self.seed_event(creator, title, Utc::now() + Duration::days(10), None, None)
            .await
    }

    pub async fn seed_finished_event(&self, creator: &User, title: &str) -> Event {
        self.seed_event(
            creator,
            title,
            Utc::now() - Duration::days(3),
            Some(Utc::now() - Duration::days(2)),
            None,
        )
        .await
    }
}
