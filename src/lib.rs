//! Game item catalog API
//!
//! Serves item and skin data for a game data service out of an in-memory,
//! per-language cache backed by MongoDB, and keeps the database in sync with
//! the upstream game API on a schedule.

pub mod cache;
pub mod catalog;
pub mod dashboard;
pub mod error;
pub mod storage;
pub mod upstream;
pub mod web;
pub mod worker;

pub use error::{CatalogError, Result};
