use std::sync::Arc;

use axum::extract::{Path, Query, RawQuery, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;
use tracing::info;

use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{AttendForm, EventForm, FormErrors, SearchForm};
use crate::geo::{self, Ranked};
use crate::handlers::load_event;
use crate::models::{Attendance, Event, User};
use crate::state::AppState;
use crate::templates::{base_context, render};
use crate::utils::AppError;

const UPCOMING_COUNT: i64 = 5;

pub async fn search(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    RawQuery(raw_query): RawQuery,
    Query(form): Query<SearchForm>,
) -> Result<Html<String>, AppError> {
    let now = Utc::now();
    let searched = raw_query.is_some_and(|q| !q.is_empty());

    let mut context = base_context(user.as_ref());

    if searched {
        let (query, errors) = form.clean();
        let candidates = state
            .events
            .list_future(now, query.name.as_deref(), 0, None)
            .await?;
        let found = geo::search_by_distance(
            state.geocoder.as_ref(),
            candidates,
            query.location.as_deref().unwrap_or(""),
            query.location_range,
        )
        .await;
        context.insert("errors", &errors);
        context.insert("search_results", &found.results);
        context.insert("geocoded_location", &found.geocoded_location);
    } else {
        context.insert("search_results", &Vec::<Ranked<Event>>::new());
        context.insert("geocoded_location", &None::<String>);
    }

    let upcoming = state
        .events
        .list_future(now, None, 0, Some(UPCOMING_COUNT))
        .await?;

    context.insert("form", &form);
    context.insert("searched", &searched);
    context.insert("event_list", &upcoming);
    render(&state, "events/search.html", &context)
}

/// Renders the event page. `rsvp_recorded` is set after a successful RSVP.
async fn render_detail(
    state: &AppState,
    event: &Event,
    user: Option<&User>,
    form: &AttendForm,
    errors: &FormErrors,
    rsvp_recorded: bool,
) -> Result<Html<String>, AppError> {
    let attendances = state.attendances.list_by_event(event.id).await?;
    let head_count: i64 = attendances.iter().map(Attendance::party_size).sum();

    let mut context = base_context(user);
    context.insert("event", event);
    context.insert("can_edit", &user.is_some_and(|u| event.can_edit(u)));
    context.insert("attendee_count", &attendances.len());
    context.insert("head_count", &head_count);
    context.insert("finished", &event.finished_at(Utc::now()));
    context.insert("rsvp_recorded", &rsvp_recorded);
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "events/event_detail.html", &context)
}

pub async fn event_detail(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let event = load_event(&state, &id).await?;
    render_detail(
        &state,
        &event,
        user.as_ref(),
        &AttendForm::default(),
        &FormErrors::new(),
        false,
    )
    .await
}

/// RSVP. Submissions for finished events or from anonymous visitors are
/// ignored and the page is shown as if freshly loaded.
pub async fn attend(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    Form(form): Form<AttendForm>,
) -> Result<Html<String>, AppError> {
    let event = load_event(&state, &id).await?;
    let blank = AttendForm::default();

    let Some(attendee) = user.as_ref().filter(|_| !event.finished_at(Utc::now())) else {
        return render_detail(&state, &event, user.as_ref(), &blank, &FormErrors::new(), false)
            .await;
    };

    match form.validate() {
        Ok(rsvp) => {
            let attendance = Attendance::new(attendee.id, event.id, rsvp.guests, rsvp.message);
            state.attendances.create(&attendance).await?;
            info!(event_id = %event.id, user = %attendee.username, guests = rsvp.guests, "RSVP recorded");
            render_detail(&state, &event, user.as_ref(), &blank, &FormErrors::new(), true).await
        }
        Err(errors) => render_detail(&state, &event, user.as_ref(), &form, &errors, false).await,
    }
}

fn render_edit_form(
    state: &AppState,
    user: &User,
    event: Option<&Event>,
    form: &EventForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let mut context = base_context(Some(user));
    if let Some(event) = event {
        context.insert("event", event);
    }
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "events/edit_event.html", &context)
}

pub async fn new_event_form(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    render_edit_form(&state, &user, None, &EventForm::default(), &FormErrors::new())
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(render_edit_form(&state, &user, None, &form, &errors)?.into_response())
        }
    };

    let mut event = Event::new(user.id, fields);
    geo::resolve_location(state.geocoder.as_ref(), &mut event).await;
    let event = state.events.create(&event).await?;

    info!(event_id = %event.id, creator = %user.username, "Event created");
    Ok(Redirect::to(&event.url()).into_response())
}

/// Loads the event and checks the caller may change it.
async fn load_editable(state: &AppState, id: &str, user: &User) -> Result<Event, AppError> {
    let event = load_event(state, id).await?;
    if !event.can_edit(user) {
        return Err(AppError::Forbidden(
            "Only the creator of an event may edit it.".to_string(),
        ));
    }
    Ok(event)
}

pub async fn edit_event_form(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let event = load_editable(&state, &id, &user).await?;
    let form = EventForm::from_event(&event);
    render_edit_form(&state, &user, Some(&event), &form, &FormErrors::new())
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    let mut event = load_editable(&state, &id, &user).await?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            return Ok(render_edit_form(&state, &user, Some(&event), &form, &errors)?.into_response())
        }
    };

    event.apply(fields);
    geo::resolve_location(state.geocoder.as_ref(), &mut event).await;
    let event = state.events.update(&event).await?;

    info!(event_id = %event.id, editor = %user.username, "Event updated");
    Ok(Redirect::to(&event.url()).into_response())
}
