//! Core server plumbing: config, errors, shared state, HTTP server.

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResponse, AppResult};
pub use server::Server;
pub use state::StoreState;
