//! Client-side data layer for basket: session and auth, list and item slices
//! that keep a local cache in step with the REST resource store.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod items;
pub mod lists;
pub mod session;
pub mod share;
pub mod slice;
pub mod storage;
pub mod store;

pub use error::ClientError;
pub use store::Store;
