//! Pagination parameters and the paged response wrapper

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            per_page: Some(DEFAULT_PER_PAGE),
        }
    }
}

impl PaginationParams {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self { page, per_page }
    }

    pub fn get_page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn get_per_page(&self) -> u64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// Saturates so oversized pages just come back empty
    pub fn get_offset(&self) -> u64 {
        (self.get_page() - 1)
            .saturating_mul(self.get_per_page())
            .min(i64::MAX as u64)
    }

    pub fn get_limit(&self) -> u64 {
        self.get_per_page()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let page_size = params.get_per_page();
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(page_size)
        };
        Self {
            data,
            page: params.get_page(),
            page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params() {
        let params = PaginationParams::new(Some(2), Some(10));
        assert_eq!(params.get_page(), 2);
        assert_eq!(params.get_per_page(), 10);
        assert_eq!(params.get_offset(), 10);
        assert_eq!(params.get_limit(), 10);
    }

    #[test]
    fn test_pagination_params_defaults_and_bounds() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.get_page(), 1);
        assert_eq!(params.get_per_page(), 20);
        assert_eq!(params.get_offset(), 0);

        let params = PaginationParams::new(Some(0), Some(1000));
        assert_eq!(params.get_page(), 1);
        assert_eq!(params.get_per_page(), MAX_PER_PAGE);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let params = PaginationParams::new(Some(u64::MAX), Some(100));
        assert_eq!(params.get_page(), u64::MAX);
        assert_eq!(params.get_offset(), i64::MAX as u64);

        let params = PaginationParams::new(Some(u64::MAX / 50), Some(100));
        assert_eq!(params.get_offset(), i64::MAX as u64);
    }

    #[test]
    fn test_total_pages() {
        let params = PaginationParams::new(Some(1), Some(10));
        assert_eq!(PaginatedResponse::new(Vec::<i32>::new(), &params, 25).total_pages, 3);
        assert_eq!(PaginatedResponse::new(Vec::<i32>::new(), &params, 0).total_pages, 1);
        assert_eq!(PaginatedResponse::new(Vec::<i32>::new(), &params, 10).total_pages, 1);
    }
}
