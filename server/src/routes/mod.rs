use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::{
    routing::{get, post},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::config::create_security_headers_layer;
use crate::handlers::{accounts, archive, events, health_check, people, root};
use crate::state::AppState;
use crate::utils::AppError;

async fn not_found() -> Response {
    AppError::NotFound("Page not found".to_string()).into_response()
}

pub fn create_routes(state: Arc<AppState>) -> Router {
    let event_routes = Router::new()
        .route("/", get(archive::archive))
        .route("/search", get(events::search))
        .route("/new", get(events::new_event_form).post(events::create_event))
        .route("/archive/:year", get(archive::archive_year))
        .route("/archive/:year/:month", get(archive::archive_month))
        .route("/:id", get(events::event_detail).post(events::attend))
        .route(
            "/:id/edit",
            get(events::edit_event_form).post(events::update_event),
        );

    let people_routes = Router::new()
        .route("/search", get(people::people_search))
        .route(
            "/profile/edit",
            get(people::edit_profile_form).post(people::update_profile),
        )
        .route("/:username", get(people::profile_detail))
        .route("/:username/contact", post(people::contact));

    let account_routes = Router::new()
        .route(
            "/register",
            get(accounts::register_form).post(accounts::register),
        )
        .route("/login", get(accounts::login_form).post(accounts::login))
        .route("/logout", post(accounts::logout));

    let security_headers = create_security_headers_layer(&state.config);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/events", event_routes)
        .nest("/people", people_routes)
        .nest("/accounts", account_routes)
        .fallback(not_found)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(security_headers)
        .with_state(state)
}
