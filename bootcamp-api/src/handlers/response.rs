//! Response envelopes
//!
//! Successful responses share the shape
//! `{ "success": true, "count"?, "pagination"?, "data" }`. Errors are rendered
//! by [`crate::error::Error`] as `{ "success": false, "message" }`.

use axum::{
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{error::Error, query::ListPage, query::PaginationDescriptor};

/// JSON request body whose rejections render through [`Error`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Single item (or scalar) response
#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> ItemResponse<T> {
    /// 200 with `data`
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
            status: StatusCode::OK,
        }
    }

    /// 201 with `data`
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(data)
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }
}

impl ItemResponse<Value> {
    /// `data: {}`, returned by deletes
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl<T: Serialize> IntoResponse for ItemResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// A page from the list pipeline
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    /// Items in this page, not the total match count
    pub count: usize,
    pub pagination: PaginationDescriptor,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: PaginationDescriptor) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }
}

impl From<ListPage> for ListResponse<Value> {
    fn from(page: ListPage) -> Self {
        Self::new(page.items, page.pagination)
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
