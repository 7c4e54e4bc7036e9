use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use tower_cookies::Cookies;

use crate::models::User;
use crate::services::accounts;
use crate::state::AppState;
use crate::utils::AppError;

pub const SESSION_COOKIE: &str = "anthill_session";

/// The logged-in user, or a redirect to the login page.
pub struct CurrentUser(pub User);

/// The logged-in user, if any. Bad or expired sessions count as anonymous.
pub struct MaybeUser(pub Option<User>);

async fn session_user<S>(parts: &mut Parts, state: &S) -> Result<Option<User>, AppError>
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    let Some(cookies) = parts.extensions.get::<Cookies>() else {
        return Ok(None);
    };
    let Some(token) = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(None);
    };

    let app_state = Arc::<AppState>::from_ref(state);
    accounts::user_for_session(&app_state, &token).await
}

pub fn login_redirect(path_and_query: &str) -> Response {
    let query = serde_urlencoded::to_string([("next", path_and_query)]).unwrap_or_default();
    Redirect::to(&format!("/accounts/login?{query}")).into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                // nested routers see `uri` without their mount prefix
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|original| &original.0)
                    .unwrap_or(&parts.uri);
                let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
                Err(login_redirect(target))
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts, state)
            .await
            .map(MaybeUser)
            .map_err(IntoResponse::into_response)
    }
}
