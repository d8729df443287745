#![doc = "The `quillpad` library crate."]
#![doc = ""]
#![doc = "Domain models, token authentication, persistence stores, routing and error handling"]
#![doc = "for the quillpad API. The binary (`main.rs`) reads the configuration, picks a store"]
#![doc = "backend and serves `routes::configure_app` with actix-web."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
