use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use tracing::info;

use crate::extractors::{MaybeUser, SESSION_COOKIE};
use crate::forms::{FormErrors, LoginForm, RegisterForm, NON_FIELD_ERRORS};
use crate::models::User;
use crate::services::accounts;
use crate::state::AppState;
use crate::templates::{base_context, render};
use crate::utils::AppError;

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.production)
        .max_age(CookieDuration::hours(state.config.session_ttl_hours))
        .build()
}

async fn log_in(state: &AppState, cookies: &Cookies, user: &User) -> Result<(), AppError> {
    let token = accounts::start_session(state, user).await?;
    cookies.add(session_cookie(state, token));
    info!(user = %user.username, "Logged in");
    Ok(())
}

fn render_register(
    state: &AppState,
    form: &RegisterForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(None);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "accounts/register.html", &context)
}

pub async fn register_form(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    if let Some(user) = user {
        return Ok(Redirect::to(&user.profile_url()).into_response());
    }
    Ok(render_register(&state, &RegisterForm::default(), &FormErrors::new())?.into_response())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let account = match form.validate() {
        Ok(account) => account,
        Err(errors) => return Ok(render_register(&state, &form, &errors)?.into_response()),
    };

    let user = match accounts::create_user(&state, account).await {
        Ok(user) => user,
        Err(AppError::Conflict(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", "That username is taken.");
            return Ok(render_register(&state, &form, &errors)?.into_response());
        }
        Err(e) => return Err(e),
    };

    log_in(&state, &cookies, &user).await?;
    Ok(Redirect::to(&user.profile_url()).into_response())
}

fn render_login(
    state: &AppState,
    form: &LoginForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(None);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "accounts/login.html", &context)
}

pub async fn login_form(
    State(state): State<Arc<AppState>>,
    Query(form): Query<LoginForm>,
) -> Result<Html<String>, AppError> {
    render_login(&state, &form, &FormErrors::new())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = accounts::authenticate(&state, form.username.trim(), &form.password).await?;
    let Some(user) = user else {
        let mut errors = FormErrors::new();
        errors.add(
            NON_FIELD_ERRORS,
            "Please enter a correct username and password.",
        );
        return Ok(render_login(&state, &form, &errors)?.into_response());
    };

    log_in(&state, &cookies, &user).await?;
    Ok(Redirect::to(form.redirect_target()).into_response())
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Redirect, AppError> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        accounts::end_session(&state, cookie.value()).await?;
    }
    cookies.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok(Redirect::to("/"))
}
