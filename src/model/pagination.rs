use rocket::{FromForm, UriDisplayQuery};
use serde::{Deserialize, Serialize};

/// Return the page `[offset, min(offset + limit, len))` of `items`, in order.
///
/// An `offset` past the end or a zero `limit` gives an empty page.
pub fn paginate<T: Clone>(items: &[T], offset: usize, limit: usize) -> Vec<T> {
    items.iter().skip(offset).take(limit).cloned().collect()
}

/// One page of a sequence, together with the sequence's full length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub total: usize,
    pub items: Vec<T>,
}

impl<T: Clone> Page<T> {
    /// Take the page `[offset, offset + limit)` of `items`.
    pub fn of(items: &[T], offset: usize, limit: usize) -> Self {
        Self {
            total: items.len(),
            items: paginate(items, offset, limit),
        }
    }
}

/// Pagination query parameters accepted by listing endpoints.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromForm, UriDisplayQuery)]
pub struct PaginationRequest {
    #[field(default = 0)]
    pub offset: usize,
    #[field(default = 50)]
    pub limit: usize,
}

impl PaginationRequest {
    /// Clamp the requested limit to `max_page_size`.
    pub fn capped(self, max_page_size: usize) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.min(max_page_size),
        }
    }

    /// Wrap a page of results along with the pagination metadata.
    pub fn to_paginated<T>(self, page: Page<T>) -> Paginated<T> {
        Paginated {
            pagination: PaginationResult {
                offset: self.offset,
                limit: self.limit,
                total: page.total,
            },
            items: page.items,
        }
    }
}

/// Metadata describing the page that was returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationResult {
    pub offset: usize,
    pub limit: usize,
    /// Length of the whole underlying sequence.
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub pagination: PaginationResult,
    pub items: Vec<T>,
}
