use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use tracing::info;

use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{ContactForm, FormErrors, ProfileForm, SearchForm};
use crate::geo;
use crate::models::{Profile, User};
use crate::services::messaging::{self, ContactOutcome};
use crate::state::AppState;
use crate::templates::{base_context, render};
use crate::utils::AppError;

async fn load_member(state: &AppState, username: &str) -> Result<(User, Profile), AppError> {
    let member = state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No member named '{username}'")))?;
    let profile = state
        .profiles
        .find_by_user(member.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("'{username}' has no profile")))?;
    Ok((member, profile))
}

async fn load_own_profile(state: &AppState, user: &User) -> Result<Profile, AppError> {
    state
        .profiles
        .find_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

fn render_profile(
    state: &AppState,
    viewer: Option<&User>,
    member: &User,
    profile: &Profile,
    contact_form: &ContactForm,
    errors: &FormErrors,
    contact_status: &str,
) -> Result<Html<String>, AppError> {
    let role_label = state
        .config
        .roles
        .iter()
        .find(|r| r.code == profile.role)
        .map(|r| r.label.as_str())
        .unwrap_or(profile.role.as_str());

    let mut context = base_context(viewer);
    context.insert("member", member);
    context.insert("profile", profile);
    context.insert("role_label", role_label);
    context.insert("skills", &profile.skill_list());
    context.insert("is_own_profile", &viewer.is_some_and(|v| v.id == member.id));
    context.insert("contact_form", contact_form);
    context.insert("errors", errors);
    context.insert("contact_status", contact_status);
    render(state, "people/profile_detail.html", &context)
}

pub async fn profile_detail(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
) -> Result<Html<String>, AppError> {
    let (member, profile) = load_member(&state, &username).await?;
    render_profile(
        &state,
        user.as_ref(),
        &member,
        &profile,
        &ContactForm::default(),
        &FormErrors::new(),
        "",
    )
}

fn render_profile_edit(
    state: &AppState,
    user: &User,
    profile: &Profile,
    form: &ProfileForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(Some(user));
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("roles", &state.config.roles);
    context.insert("markup_type", &profile.about_markup_type);
    render(state, "people/profile_edit.html", &context)
}

pub async fn edit_profile_form(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let profile = load_own_profile(&state, &user).await?;
    let form = ProfileForm::from_profile(&profile);
    render_profile_edit(&state, &user, &profile, &form, &FormErrors::new())
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let mut profile = load_own_profile(&state, &user).await?;

    let fields = match form.validate(&state.config) {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(render_profile_edit(&state, &user, &profile, &form, &errors)?.into_response())
        }
    };

    profile.apply(fields);
    geo::resolve_location(state.geocoder.as_ref(), &mut profile).await;
    state.profiles.update(&profile).await?;

    info!(user = %user.username, "Profile updated");
    Ok(Redirect::to(&user.profile_url()).into_response())
}

/// `GET /people/search`: every member, or those near `location`.
pub async fn people_search(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Query(form): Query<SearchForm>,
) -> Result<Html<String>, AppError> {
    let (query, errors) = form.clean();
    let members = state.profiles.list_members().await?;
    let found = geo::search_by_distance(
        state.geocoder.as_ref(),
        members,
        query.location.as_deref().unwrap_or(""),
        query.location_range,
    )
    .await;

    let mut context = base_context(user.as_ref());
    context.insert("form", &form);
    context.insert("errors", &errors);
    context.insert("geocoded_location", &found.geocoded_location);
    context.insert("members", &found.results);
    render(&state, "people/people_search.html", &context)
}

pub async fn contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(sender): CurrentUser,
    Path(username): Path<String>,
    Form(form): Form<ContactForm>,
) -> Result<Html<String>, AppError> {
    let (member, profile) = load_member(&state, &username).await?;

    let (subject, body) = match form.validate() {
        Ok(message) => message,
        Err(errors) => {
            return render_profile(
                &state,
                Some(&sender),
                &member,
                &profile,
                &form,
                &errors,
                "",
            )
        }
    };

    let outcome = messaging::contact_member(&state, &sender, &member, &subject, &body).await?;
    let (status, shown_form) = match outcome {
        ContactOutcome::Sent => ("sent", ContactForm::default()),
        ContactOutcome::RateLimited => ("rate_limited", form),
        ContactOutcome::DeliveryFailed => ("failed", form),
    };
    render_profile(
        &state,
        Some(&sender),
        &member,
        &profile,
        &shown_form,
        &FormErrors::new(),
        status,
    )
}
