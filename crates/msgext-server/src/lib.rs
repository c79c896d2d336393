//! HTTP front end for the stock search messaging extension.

pub mod activity;
pub mod cli;
pub mod error;
pub mod routes;

pub use routes::{AppState, router};
