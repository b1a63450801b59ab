//! HTTP front end for the fapiao receipt pipeline.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use error::ApiError;
pub use routes::router;
pub use server::serve;
pub use state::AppState;
