pub mod resources;

pub use resources::ResourceMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::{CourseRecord, Database, GroupRecord, SessionRecord};
    pub(crate) use crate::graphql::access::ensure_document_permission;
    pub(crate) use crate::graphql::auth::AuthExt;
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::resource::{Document, Resource};
    pub(crate) use crate::security::voter::EDIT;
}
