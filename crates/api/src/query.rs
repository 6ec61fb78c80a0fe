//! Shared query parameter types for API handlers.

use serde::Deserialize;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Page-based pagination (`?page=&limit=`), 1-based.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Clamped `(page, limit, offset)`.
    pub fn resolve(&self, default_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT);
        (page, limit, (page - 1) * limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(PageParams::default().resolve(DEFAULT_PAGE_LIMIT), (1, 10, 0));
        let p = PageParams {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(p.resolve(DEFAULT_PAGE_LIMIT), (3, 100, 200));
        let p = PageParams {
            page: Some(-2),
            limit: Some(0),
        };
        assert_eq!(p.resolve(DEFAULT_PAGE_LIMIT), (1, 1, 0));
    }
}
