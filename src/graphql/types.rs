//! GraphQL type definitions
//!
//! These types mirror our domain models but are decorated with async-graphql attributes.

use async_graphql::{Enum, InputObject, SimpleObject};
use serde::{Deserialize, Serialize};

use crate::resource::Visibility;

/// A platform user. Private fields are resolved in `queries::user`.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub full_name: String,
    #[graphql(skip)]
    pub stored_email: Option<String>,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub title: String,
    pub content: String,
    /// RFC 3339 send date
    pub send_date: String,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub title: String,
    /// 0 closed, 1 registered, 2 open platform, 3 open world, 4 hidden
    pub visibility: i32,
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Session {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub access_start_date: Option<String>,
    pub access_end_date: Option<String>,
    pub duration: i32,
    pub position: i32,
}

/// Publication state of a resource link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Serialize, Deserialize)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum LinkVisibility {
    Draft,
    Pending,
    Published,
    Deleted,
}

impl From<Visibility> for LinkVisibility {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Draft => LinkVisibility::Draft,
            Visibility::Pending => LinkVisibility::Pending,
            Visibility::Published => LinkVisibility::Published,
            Visibility::Deleted => LinkVisibility::Deleted,
        }
    }
}

impl From<LinkVisibility> for Visibility {
    fn from(v: LinkVisibility) -> Self {
        match v {
            LinkVisibility::Draft => Visibility::Draft,
            LinkVisibility::Pending => Visibility::Pending,
            LinkVisibility::Published => Visibility::Published,
            LinkVisibility::Deleted => Visibility::Deleted,
        }
    }
}

/// A link of a resource to a course, session, group or user
#[derive(Debug, Clone, SimpleObject)]
pub struct ResourceLinkInfo {
    pub id: Option<i64>,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
    pub group_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_group_id: Option<i64>,
    pub visibility: LinkVisibility,
    pub visibility_name: String,
    /// Roles holding an explicit right on the link
    pub rights: Vec<String>,
}

/// Who can see a resource
#[derive(Debug, Clone, SimpleObject)]
pub struct ResourceAudience {
    /// True when no link targets a user or a group
    pub everyone: bool,
    pub user_ids: Vec<i64>,
    pub group_ids: Vec<i64>,
}

/// Share a document with a course, optionally narrowed to a session and group
#[derive(Debug, InputObject)]
pub struct ShareWithCourseInput {
    pub document_id: i64,
    pub course_id: i64,
    pub session_id: Option<i64>,
    pub group_id: Option<i64>,
    #[graphql(default_with = "LinkVisibility::Published")]
    pub visibility: LinkVisibility,
}

#[derive(Debug, InputObject)]
pub struct ShareWithGroupInput {
    pub document_id: i64,
    pub course_id: i64,
    pub group_id: i64,
    pub session_id: Option<i64>,
}

#[derive(Debug, InputObject)]
pub struct ShareWithUsersInput {
    pub document_id: i64,
    pub user_ids: Vec<i64>,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
    pub group_id: Option<i64>,
}

/// Result of a share operation
#[derive(Debug, SimpleObject)]
pub struct ShareDocumentResult {
    pub success: bool,
    /// Every link of the document after the operation
    pub links: Vec<ResourceLinkInfo>,
    pub error: Option<String>,
}
