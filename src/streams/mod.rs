//! Stream catalog
//!
//! Seven streams are exposed. Six are small dimension tables fetched with a
//! single request per sync; `guest_checks` is read one business date at a
//! time and bookmarked on its `opnLcl` timestamp.

mod catalog;

pub use catalog::{catalog, discover, validate_catalog, Stream, StreamDefinition};

#[cfg(test)]
mod tests;
