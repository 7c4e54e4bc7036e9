use axum::response::Html;
use tera::{Context, Tera};

use crate::forms::FormErrors;
use crate::models::User;
use crate::state::AppState;
use crate::utils::AppError;

/// Compiled into the binary so a deployment is a single file.
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("events/search.html", include_str!("../templates/events/search.html")),
    ("events/event_detail.html", include_str!("../templates/events/event_detail.html")),
    ("events/edit_event.html", include_str!("../templates/events/edit_event.html")),
    ("events/event_list.html", include_str!("../templates/events/event_list.html")),
    (
        "events/event_archive_year.html",
        include_str!("../templates/events/event_archive_year.html"),
    ),
    (
        "events/event_archive_month.html",
        include_str!("../templates/events/event_archive_month.html"),
    ),
    ("people/profile_detail.html", include_str!("../templates/people/profile_detail.html")),
    ("people/profile_edit.html", include_str!("../templates/people/profile_edit.html")),
    ("people/people_search.html", include_str!("../templates/people/people_search.html")),
    ("accounts/login.html", include_str!("../templates/accounts/login.html")),
    ("accounts/register.html", include_str!("../templates/accounts/register.html")),
];

pub fn load() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    Ok(tera)
}

/// What every page needs: the logged-in user (or null) and an empty error
/// map for the form macros.
pub fn base_context(user: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &user);
    context.insert("errors", &FormErrors::new());
    context
}

pub fn render(state: &AppState, name: &str, context: &Context) -> Result<Html<String>, AppError> {
    Ok(Html(state.templates.render(name, context)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let tera = load().unwrap();
        for (name, _) in TEMPLATES {
            assert!(tera.get_template_names().any(|n| n == *name), "{name} missing");
        }
    }

    #[test]
    fn test_base_renders_for_anonymous_visitor() {
        let tera = load().unwrap();
        let html = tera.render("base.html", &base_context(None)).unwrap();
        assert!(html.contains("/accounts/login"));
        assert!(!html.contains("Log out"));
    }

    #[test]
    fn test_user_content_is_escaped() {
        let tera = load().unwrap();
        let user = User::new("<b>ada</b>".into(), "ada@example.com".into(), "x".into());
        let html = tera.render("base.html", &base_context(Some(&user))).unwrap();
        assert!(html.contains("&lt;b&gt;ada&lt;&#x2F;b&gt;"));
    }
}
