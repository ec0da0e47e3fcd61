use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_PER_PAGE: u64 = 30;
pub const MAX_PER_PAGE: u64 = 100;

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Page number (1-indexed, default 1).
    #[param(example = 1)]
    pub page: Option<i64>,
    /// Items per page (1-100, default 30).
    #[param(example = 30)]
    pub per_page: Option<i64>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number as the client sees it.
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn from_query(query: &PageQuery) -> Result<Self, AppError> {
        let page = query.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::Validation("page must be >= 1".into()));
        }
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE as i64);
        if !(1..=MAX_PER_PAGE as i64).contains(&per_page) {
            return Err(AppError::Validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(Self {
            page: page as u64,
            per_page: per_page as u64,
        })
    }

    /// 0-based page index for the catalog.
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    /// `Link` header values for a page that returned `returned` items.
    ///
    /// `next` is offered whenever the page was non-empty, `previous` whenever
    /// this is not the first page.
    pub fn link_headers(&self, base: &str, returned: usize) -> Vec<String> {
        let mut links = Vec::with_capacity(2);
        if returned > 0 {
            links.push(format!(
                "<{base}?page={}&per_page={}>; rel=\"next\"; title=\"next\"",
                self.page + 1,
                self.per_page
            ));
        }
        if self.page > 1 {
            links.push(format!(
                "<{base}?page={}&per_page={}>; rel=\"previous\"; title=\"previous\"",
                self.page - 1,
                self.per_page
            ));
        }
        links
    }
}
