use serde::Serialize;

use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous: Option<i64>,
    pub next: Option<i64>,
}

impl Page {
    /// Resolves a `?page=` value. An empty listing still has page 1; any
    /// page past the end (or not a number) is a 404.
    pub fn resolve(requested: Option<&str>, total: i64, per_page: i64) -> Result<Self, AppError> {
        let per_page = per_page.max(1);
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        let number = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            None => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::NotFound("Invalid page".to_string()))?,
        };
        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(format!("Page {number} does not exist")));
        }

        Ok(Self {
            number,
            num_pages,
            per_page,
            total,
            has_previous: number > 1,
            has_next: number < num_pages,
            previous: (number > 1).then(|| number - 1),
            next: (number < num_pages).then(|| number + 1),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_listing_has_one_page() {
        let page = Page::resolve(None, 0, 20).unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(!page.is_paginated());
    }

    #[test]
    fn test_middle_page_links() {
        let page = Page::resolve(Some("2"), 45, 20).unwrap();
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.previous, Some(1));
        assert_eq!(page.next, Some(3));
    }

    #[test]
    fn test_last_keyword() {
        let page = Page::resolve(Some("last"), 45, 20).unwrap();
        assert_eq!(page.number, 3);
        assert!(!page.has_next);
    }

    #[test]
    fn test_out_of_range_and_garbage_are_not_found() {
        assert!(matches!(Page::resolve(Some("4"), 45, 20), Err(AppError::NotFound(_))));
        assert!(matches!(Page::resolve(Some("0"), 45, 20), Err(AppError::NotFound(_))));
        assert!(matches!(Page::resolve(Some("two"), 45, 20), Err(AppError::NotFound(_))));
    }
}
