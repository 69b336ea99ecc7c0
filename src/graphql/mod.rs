//! GraphQL API
//!
//! Exposes the `User` type with its private-data resolvers and the document
//! sharing operations. Domain-specific resolvers live in `queries/` and
//! `mutations/` and are merged into the roots in `schema.rs`.

mod access;
pub mod auth;
mod helpers;
pub mod mutations;
pub mod queries;
mod schema;
pub mod types;

pub use auth::{AuthUser, verify_token};
pub use schema::{CampusSchema, MutationRoot, QueryRoot, build_schema};
