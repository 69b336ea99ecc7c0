//! Campus backend: course resource sharing and the user GraphQL API.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod graphql;
pub mod resource;
pub mod security;
pub mod services;

pub use app::{AppState, build_app};
