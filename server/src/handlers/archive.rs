use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Html;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::extractors::MaybeUser;
use crate::state::AppState;
use crate::templates::{base_context, render};
use crate::utils::pagination::Page;
use crate::utils::AppError;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A month of the archive as the templates link to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthLink {
    pub year: i32,
    pub month: u32,
    pub month_padded: String,
    pub label: String,
    pub count: usize,
}

impl MonthLink {
    fn new(year: i32, month: u32, count: usize) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            year,
            month,
            month_padded: format!("{month:02}"),
            label: first.format("%B %Y").to_string(),
            count,
        })
    }

    fn previous(&self) -> Option<Self> {
        match self.month {
            1 => Self::new(self.year - 1, 12, 0),
            m => Self::new(self.year, m - 1, 0),
        }
    }

    fn next(&self) -> Option<Self> {
        match self.month {
            12 => Self::new(self.year + 1, 1, 0),
            m => Self::new(self.year, m + 1, 0),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn parse_year(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .ok()
        .filter(|y| (1..=9999).contains(y))
        .ok_or_else(|| AppError::NotFound(format!("Invalid year '{raw}'")))
}

fn parse_month(raw: &str) -> Result<u32, AppError> {
    raw.parse::<u32>()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| AppError::NotFound(format!("Invalid month '{raw}'")))
}

/// `GET /events`: upcoming events, a page at a time.
pub async fn archive(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let now = Utc::now();
    let total = state.events.count_future(now).await?;
    let page = Page::resolve(query.page.as_deref(), total, state.config.events_per_page)?;
    let events = state
        .events
        .list_future(now, None, page.offset(), Some(page.per_page))
        .await?;

    let mut context = base_context(user.as_ref());
    context.insert("event_list", &events);
    context.insert("is_paginated", &page.is_paginated());
    context.insert("page_obj", &page);
    render(&state, "events/event_list.html", &context)
}

pub async fn archive_year(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path(year): Path<String>,
) -> Result<Html<String>, AppError> {
    let year = parse_year(&year)?;
    let from = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| AppError::NotFound("Invalid year".to_string()))?;
    let until = NaiveDate::from_ymd_opt(year + 1, 1, 1)
        .ok_or_else(|| AppError::NotFound("Invalid year".to_string()))?;

    let events = state
        .events
        .list_starting_between(midnight(from), midnight(until))
        .await?;

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for event in &events {
        *counts.entry(event.start_date.month()).or_default() += 1;
    }
    let months: Vec<MonthLink> = counts
        .into_iter()
        .filter_map(|(month, count)| MonthLink::new(year, month, count))
        .collect();
    if months.is_empty() {
        return Err(AppError::NotFound(format!("No events in {year}")));
    }

    let mut context = base_context(user.as_ref());
    context.insert("year", &year);
    context.insert("date_list", &months);
    render(&state, "events/event_archive_year.html", &context)
}

pub async fn archive_month(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Path((year, month)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let year = parse_year(&year)?;
    let month = parse_month(&month)?;

    let invalid = || AppError::NotFound("Invalid month".to_string());
    let current = MonthLink::new(year, month, 0).ok_or_else(invalid)?;
    let following = current.next().ok_or_else(invalid)?;
    let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let until = NaiveDate::from_ymd_opt(following.year, following.month, 1).ok_or_else(invalid)?;

    let events = state
        .events
        .list_starting_between(midnight(from), midnight(until))
        .await?;
    if events.is_empty() {
        return Err(AppError::NotFound(format!("No events in {}", current.label)));
    }

    let current = MonthLink {
        count: events.len(),
        ..current
    };
    let mut context = base_context(user.as_ref());
    context.insert("previous_month", &current.previous());
    context.insert("next_month", &following);
    context.insert("month", &current);
    context.insert("event_list", &events);
    render(&state, "events/event_archive_month.html", &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_links_wrap_around_the_year() {
        let december = MonthLink::new(2031, 12, 0).unwrap();
        let january = december.next().unwrap();
        assert_eq!((january.year, january.month), (2032, 1));
        assert_eq!(january.month_padded, "01");
        assert_eq!(january.label, "January 2032");

        let back = january.previous().unwrap();
        assert_eq!((back.year, back.month), (2031, 12));
    }

    #[test]
    fn test_parse_rejects_out_of_range_values() {
        assert_eq!(parse_year("2031").unwrap(), 2031);
        assert!(parse_year("0").is_err());
        assert!(parse_year("twenty").is_err());
        assert_eq!(parse_month("03").unwrap(), 3);
        assert!(parse_month("13").is_err());
    }
}
