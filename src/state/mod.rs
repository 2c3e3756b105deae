//! State management module
//!
//! Bookmarks are persisted between sync runs so that `guest_checks` resumes
//! from the last business date it has seen.
//!
//! # Overview
//!
//! - `State` - Singer bookmark structure
//! - `StateManager` - File-based state persistence

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{Bookmark, State};
