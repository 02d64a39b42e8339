use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
};
use serde::{Deserialize, Serialize};

use crate::model::serde_string;

/// Requested slice of the remote election list, from the `page` and
/// `pageSize` query parameters. Pages are 1-based; both values must be
/// positive, and a zero in either is rejected before any arithmetic runs.
pub struct PaginationRequest {
    page_num: u64,
    page_size: u64,
}

impl PaginationRequest {
    /// Build a request outside the HTTP layer. `None` if either value is
    /// zero, the same rule the request guard enforces.
    pub fn new(page_num: u64, page_size: u64) -> Option<Self> {
        (page_num > 0 && page_size > 0).then_some(Self {
            page_num,
            page_size,
        })
    }

    pub fn page_num(&self) -> u64 {
        self.page_num
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Locate this page within a collection of `elements_count` elements.
    ///
    /// All integer arithmetic: the counts come from the contract as exact
    /// decimal strings and must not pass through floating point. The page
    /// count rounds up via a remainder check, and the last page carries the
    /// remainder. A page past the end has length zero.
    pub fn bounds(&self, elements_count: u128) -> PageBounds {
        let page_size = u128::from(self.page_size);
        let page_count =
            elements_count / page_size + u128::from(elements_count % page_size != 0);
        let start = u128::from(self.page_num - 1) * page_size;
        let length = elements_count.saturating_sub(start).min(page_size) as u64;
        PageBounds {
            start,
            length,
            page_count,
        }
    }

    /// Wrap fetched values in the page envelope.
    pub fn into_page<T>(self, elements_count: u128, values: Vec<T>) -> Page<T> {
        let page_count = self.bounds(elements_count).page_count;
        Page {
            page_number: self.page_num,
            page_size: values.len() as u64,
            values,
            elements_count,
            page_count,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PaginationRequest {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let page_num = match req.query_value::<u64>("page").unwrap_or(Ok(1)) {
            Ok(page_num) if page_num > 0 => page_num,
            _ => return request::Outcome::Failure((Status::BadRequest, ())),
        };
        let page_size = match req.query_value::<u64>("pageSize").unwrap_or(Ok(50)) {
            Ok(page_size) if page_size > 0 => page_size,
            _ => return request::Outcome::Failure((Status::BadRequest, ())),
        };
        request::Outcome::Success(Self {
            page_num,
            page_size,
        })
    }
}

/// Index range of a page, plus the collection's page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// Index of the first element on the page.
    pub start: u128,
    /// Number of elements on the page. Zero past the end of the collection.
    pub length: u64,
    /// Total number of pages in the collection.
    pub page_count: u128,
}

/// A bounded slice of a remote ordered collection, recomputed per request.
///
/// `pageSize` reports how many values this page actually holds, so a short
/// last page says so; `pageNumber` echoes the request. The two counts keep
/// the contract's decimal-string encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page_number: u64,
    pub page_size: u64,
    pub values: Vec<T>,
    #[serde(with = "serde_string")]
    pub elements_count: u128,
    #[serde(with = "serde_string")]
    pub page_count: u128,
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    fn request(page_num: u64, page_size: u64) -> PaginationRequest {
        PaginationRequest {
            page_num,
            page_size,
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(request(1, 10).bounds(18).page_count, 2);
        assert_eq!(request(1, 10).bounds(20).page_count, 2);
        assert_eq!(request(1, 10).bounds(21).page_count, 3);
        assert_eq!(request(1, 10).bounds(1).page_count, 1);
        assert_eq!(request(1, 10).bounds(0).page_count, 0);
    }

    #[test]
    fn full_pages_carry_page_size_elements() {
        let bounds = request(1, 10).bounds(20);
        assert_eq!(bounds.start, 0);
        assert_eq!(bounds.length, 10);
    }

    #[test]
    fn last_page_carries_the_remainder() {
        let bounds = request(2, 10).bounds(18);
        assert_eq!(bounds.start, 10);
        assert_eq!(bounds.length, 8);
    }

    #[test]
    fn exact_multiple_keeps_last_page_full() {
        let bounds = request(2, 10).bounds(20);
        assert_eq!(bounds.start, 10);
        assert_eq!(bounds.length, 10);
        assert_eq!(bounds.page_count, 2);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let bounds = request(3, 10).bounds(18);
        assert_eq!(bounds.start, 20);
        assert_eq!(bounds.length, 0);
        assert_eq!(bounds.page_count, 2);
    }

    #[test]
    fn empty_collection_has_no_pages() {
        let bounds = request(1, 10).bounds(0);
        assert_eq!(bounds.start, 0);
        assert_eq!(bounds.length, 0);
        assert_eq!(bounds.page_count, 0);
    }

    #[test]
    fn counts_beyond_u64_do_not_overflow() {
        let bounds = request(u64::MAX, u64::MAX).bounds(u128::MAX);
        assert_eq!(bounds.start, u128::from(u64::MAX - 1) * u128::from(u64::MAX));
        assert_eq!(bounds.length, u64::MAX);
    }

    #[test]
    fn envelope_keeps_wire_names_and_string_counts() {
        let page = request(2, 10).into_page(18, vec!["a", "b"]);
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(
            json,
            r#"{"pageNumber":2,"pageSize":2,"values":["a","b"],"elementsCount":"18","pageCount":"2"}"#
        );
    }
}
