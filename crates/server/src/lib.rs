//! dayabase HTTP server: metadata store, connection registry, saved questions,
//! dashboards, and the query executor behind an axum API.

pub mod api;
pub mod cli;
pub mod connections;
pub mod dashboards;
pub mod db;
pub mod error;
pub mod executor;
pub mod questions;
pub mod router;
pub mod startup;
pub mod state;

pub use error::StoreError;
pub use executor::{QueryError, QueryExecutor, Stage};
pub use state::AppState;
