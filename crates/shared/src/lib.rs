//! Records and pure rules shared by the basket store and its clients.

mod models;
pub mod routes;
pub mod view;

pub use models::*;
