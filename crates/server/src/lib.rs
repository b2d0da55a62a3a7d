//! REST resource store backing the basket client: generic JSON collections
//! over SQLite with query-string filtering.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
