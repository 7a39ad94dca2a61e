use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use log::warn;
use serde::Deserialize;
use std::future::{ready, Ready};

use super::sort::{Direction, Order, Sort};
use super::PageError;
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_OFFSET: u64 = 0;

/// Raw pagination query parameters, exactly as they arrive on the wire.
///
/// Everything is kept as a string so that parse failures can be reported as
/// pagination errors instead of generic query deserialization errors.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub size: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
}

/// A page request: how many rows, how many to skip, and in which order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    /// Maximum number of rows to return. `0` requests an empty page.
    pub size: u32,
    /// Number of rows to skip.
    pub offset: u64,
    pub sort: Sort,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            offset: DEFAULT_PAGE_OFFSET,
            sort: Sort::new(),
        }
    }
}

impl Pageable {
    pub fn new(size: u32, offset: u64, sort: Sort) -> Self {
        Self { size, offset, sort }
    }

    /// Builds a `Pageable` from the raw `size`, `offset` and `sort` parameters.
    ///
    /// Missing or blank parameters take their defaults (`10`, `0`, unsorted).
    /// Once both integers parse, no further error is possible.
    pub fn parse(
        size: Option<&str>,
        offset: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self, PageError> {
        let size = match present(size) {
            Some(raw) => raw.parse::<u32>().map_err(PageError::InvalidPageSize)?,
            None => DEFAULT_PAGE_SIZE,
        };
        let offset = match present(offset) {
            Some(raw) => raw.parse::<u64>().map_err(PageError::InvalidPageOffset)?,
            None => DEFAULT_PAGE_OFFSET,
        };
        let sort = present(sort).map(parse_sort).unwrap_or_default();

        Ok(Self { size, offset, sort })
    }

    pub fn from_params(params: &PageParams) -> Result<Self, PageError> {
        Self::parse(
            params.size.as_deref(),
            params.offset.as_deref(),
            params.sort.as_deref(),
        )
    }

    /// `size` as a SQL `LIMIT` value.
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// `offset` as a SQL `OFFSET` value, saturating at `i64::MAX`.
    pub fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }
}

/// `?size=` counts as absent.
fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

/// Parses `prop1 ASC,prop2 DESC`-style sort parameters.
///
/// Each comma-separated entry is trimmed, then split on its first run of
/// whitespace into a property and an optional direction. A missing direction
/// means ascending. An unrecognised direction also falls back to ascending and
/// is logged. Property names cannot contain commas or spaces.
pub fn parse_sort(raw: &str) -> Sort {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(char::is_whitespace) {
            Some((property, direction)) => {
                let direction = direction.parse::<Direction>().unwrap_or_else(|_| {
                    warn!(
                        "Unrecognised sort direction '{}' for property '{}', using ASC",
                        direction.trim(),
                        property
                    );
                    Direction::Asc
                });
                Order::new(property, direction)
            }
            None => Order::asc(entry),
        })
        .collect()
}

/// Extracts a [`Pageable`] from the request query string.
///
/// Parse failures become `400 Bad Request` responses carrying the pagination
/// error message.
impl FromRequest for Pageable {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = web::Query::<PageParams>::from_query(req.query_string())
            .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e)))
            .and_then(|params| Pageable::from_params(&params).map_err(AppError::from));

        ready(result.map_err(ActixError::from))
    }
}
