//! Shared search plumbing: pagination clamping and case-insensitive
//! substring matching.

use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::ColumnTrait;
use serde::Serialize;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// Effective (limit, offset) pair for a search request. Construction never
/// fails: absent, unparsable, or out-of-range inputs fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub fn from_params(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = match limit.and_then(|s| s.parse::<i64>().ok()) {
            Some(l) if l > 0 => (l as u64).min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };
        let offset = match offset.and_then(|s| s.parse::<i64>().ok()) {
            Some(o) if o >= 0 => o as u64,
            _ => 0,
        };
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub has_more: bool,
}

impl PaginationInfo {
    pub fn new(total: u64, page: Page) -> Self {
        Self {
            total,
            limit: page.limit,
            offset: page.offset,
            has_more: page.offset + page.limit < total,
        }
    }
}

/// `LOWER(col) LIKE LOWER('%needle%')` so substring matching behaves the same
/// on Postgres and SQLite. The column is rendered table-qualified; searches
/// that join a related table may carry the same column name on both sides.
pub fn contains_ci<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col.as_column_ref())))
        .like(format!("%{}%", needle.to_lowercase()))
}

/// Substring match against a numeric column by casting it to text, so a
/// general query like "1979" can hit years and durations. Table-qualified
/// for the same reason as `contains_ci`.
pub fn contains_as_text<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    Expr::col(col.as_column_ref())
        .cast_as(Alias::new("TEXT"))
        .like(format!("%{}%", needle))
}
