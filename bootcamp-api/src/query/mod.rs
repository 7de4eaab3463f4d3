//! Read pipeline for list endpoints
//!
//! A request's query string is parsed once into an immutable [`QueryParams`]
//! snapshot. Three independent stages read from it:
//!
//! - [`translate`] turns field keys into a structural [`Filter`](crate::repository::Filter)
//! - [`Shape`] picks up `select` and `sort`
//! - [`Paginator`] picks up `page` and `limit`
//!
//! [`ListQuery`] composes them and runs count-then-fetch against a repository.

mod filter;
mod list;
mod paginate;
mod shape;

pub use filter::translate;
pub use list::{ListPage, ListQuery};
pub use paginate::{PaginationDescriptor, Paginator, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use shape::Shape;

use crate::error::{Error, Result};

/// Keys consumed by shaping and pagination, never treated as field filters
pub const RESERVED_KEYS: &[&str] = &["select", "sort", "limit", "page"];

/// Decoded query-string pairs in request order, repeated keys included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decode a raw (still percent-encoded) query string
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw.unwrap_or_default())
            .map_err(|e| Error::BadRequest(format!("Invalid query string: {e}")))?;
        Ok(Self { pairs })
    }

    /// Build from already decoded pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value of the last occurrence of `key`
    pub fn last(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
