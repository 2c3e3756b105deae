//! Pagination module
//!
//! Supports: business date windows, next-page tokens
//!
//! # Overview
//!
//! Each strategy turns a response into the body parameters of the next
//! request, or decides that pagination is complete. Date-partitioned streams
//! walk every business date from the start date to yesterday; the other
//! streams follow an optional next-page token.

mod strategies;
mod types;

pub use strategies::{
    yesterday, DateCursor, DatePaginator, DateWindow, NextPageTokenPaginator,
};
pub use types::{NextPage, PaginationConfig, PaginationState, Paginator};
