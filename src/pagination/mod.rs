//!
//! # Pagination
//!
//! Query-engine agnostic page requests and page results.
//!
//! A request carries `size`, `offset` and `sort` query parameters. They are
//! parsed into a [`Pageable`], handed to a repository, and the repository
//! answers with a [`Page`] envelope serialized as
//! `{ "totalPages", "totalElements", "elements" }`.

pub mod page;
pub mod pageable;
pub mod sort;

use std::fmt;
use std::num::ParseIntError;

pub use page::{total_pages, Page};
pub use pageable::{parse_sort, PageParams, Pageable, DEFAULT_PAGE_OFFSET, DEFAULT_PAGE_SIZE};
pub use sort::{Direction, Order, Sort};

/// Errors raised while turning request parameters into a page query.
///
/// All of them are client errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The `size` parameter is not a non-negative integer.
    InvalidPageSize(ParseIntError),
    /// The `offset` parameter is not a non-negative integer.
    InvalidPageOffset(ParseIntError),
    /// A sort property is not one of the sortable columns.
    UnsortableProperty(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PageError::InvalidPageSize(e) => write!(f, "invalid page size number: {}", e),
            PageError::InvalidPageOffset(e) => write!(f, "invalid page offset number: {}", e),
            PageError::UnsortableProperty(p) => write!(f, "cannot sort by property '{}'", p),
        }
    }
}

impl std::error::Error for PageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PageError::InvalidPageSize(e) | PageError::InvalidPageOffset(e) => Some(e),
            PageError::UnsortableProperty(_) => None,
        }
    }
}
