//! HTTP API exposing selection and watch-history operations.

pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
