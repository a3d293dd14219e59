//! Offset pagination shared by every list endpoint.

use serde::Serialize;

use crate::errors::{validation, Result};

pub const MAX_LIMIT: i64 = 100;

/// Validate raw `page`/`limit` query values. Out-of-range values are
/// rejected rather than clamped, matching the validation behavior of
/// the rest of the API.
pub fn resolve(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Result<(i64, i64)> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(validation("page", "Page must be a positive integer"));
    }
    let limit = limit.unwrap_or(default_limit);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(validation("limit", "Limit must be between 1 and 100"));
    }
    Ok((page, limit))
}

/// Metadata block attached next to every paginated `data` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
        let total_pages = (total_items + limit - 1) / limit;
        Pagination {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}
