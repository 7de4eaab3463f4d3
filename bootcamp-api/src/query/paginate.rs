//! Page windows and the `{limit, nextPage, prevPage}` descriptor

use serde::Serialize;

use super::QueryParams;
use crate::repository::Pagination;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Page window requested by a list call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: u64,
    limit: u64,
}

/// `{limit, nextPage?, prevPage?}` returned alongside a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDescriptor {
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<u64>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Paginator {
    /// Window for 1-indexed `page` of `limit` items; zero falls back to the default
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Read `page` and `limit`, treating missing or unparsable values as zero.
    ///
    /// Values are never clamped: a page past the end yields an empty window.
    pub fn from_params(params: &QueryParams) -> Self {
        let number = |key: &str| {
            params
                .last(key)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .unwrap_or(0)
        };
        Self::new(number("page"), number("limit"))
    }

    /// Requested page, 1-indexed
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Items per page
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Index of the first item on this page, saturating
    pub fn start_index(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// One past the last item on this page, saturating
    pub fn end_index(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }

    /// Skip/limit window for the repository
    pub fn window(&self) -> Pagination {
        Pagination::new(self.start_index(), self.limit)
    }

    /// Neighbour page markers for `total` matches
    pub fn describe(&self, total: u64) -> PaginationDescriptor {
        let start = self.start_index();

        PaginationDescriptor {
            limit: self.limit,
            next_page: (self.end_index() < total).then(|| self.page + 1),
            prev_page: (start > 0 && start < total).then(|| self.page - 1),
        }
    }
}
