pub mod resources;
pub mod user;

pub use resources::ResourceQueries;
pub use user::UserQueries;

/// Shortest `messageContacts` filter that triggers a search
pub const MIN_CONTACT_FILTER_LENGTH: usize = 3;
/// Setting that exposes e-mail addresses to other users
pub const SETTING_SHOW_EMAIL_ADDRESSES: &str = "display.show_email_addresses";

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{ComplexObject, Context, Object, Result};
    pub(crate) use chrono::Utc;

    pub(crate) use super::{MIN_CONTACT_FILTER_LENGTH, SETTING_SHOW_EMAIL_ADDRESSES};
    pub(crate) use crate::config::Config;
    pub(crate) use crate::db::Database;
    pub(crate) use crate::db::users::MESSAGE_CONTACTS_LIMIT;
    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard, protect_current_user_data};
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::resource::Resource;
    pub(crate) use crate::services::SessionVisibilityService;
}
