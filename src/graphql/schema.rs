//! GraphQL schema definition with queries and mutations
//!
//! All operations require authentication unless explicitly noted.

use std::sync::Arc;

use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::config::Config;
use crate::db::Database;

use super::mutations::ResourceMutations;
use super::queries::{ResourceQueries, UserQueries};

/// The GraphQL schema type
pub type CampusSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(UserQueries, ResourceQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(ResourceMutations);

/// Build the GraphQL schema with all resolvers
pub fn build_schema(db: Database, config: Arc<Config>) -> CampusSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(db)
        .data(config)
        .finish()
}
