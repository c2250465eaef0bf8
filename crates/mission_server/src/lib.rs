pub mod cli;
pub mod logging;
pub mod routes;
pub mod server;

pub use server::{AppState, ServerHandle, build_router, start};
