// Helper functions shared across GraphQL query/mutation modules.

use async_graphql::ErrorExtensions;

use crate::db::{CourseRecord, MessageRecord, SessionRecord, UserRecord};
use crate::graphql::types::{Course, LinkVisibility, Message, ResourceLinkInfo, Session, User};
use crate::resource::ResourceLink;

pub(crate) fn error_with_code(message: impl Into<String>, code: &'static str) -> async_graphql::Error {
    async_graphql::Error::new(message.into()).extend_with(|_, e| e.set("code", code))
}

/// Database or other unexpected failure
pub(crate) fn internal_error(e: impl std::fmt::Display) -> async_graphql::Error {
    tracing::error!(error = %e, "GraphQL resolver failed");
    error_with_code(e.to_string(), "INTERNAL")
}

pub(crate) fn not_found(what: &str, id: i64) -> async_graphql::Error {
    error_with_code(format!("{} {} not found", what, id), "NOT_FOUND")
}

pub(crate) fn forbidden(message: &str) -> async_graphql::Error {
    error_with_code(message, "FORBIDDEN")
}

pub(crate) fn bad_request(message: impl Into<String>) -> async_graphql::Error {
    error_with_code(message, "BAD_REQUEST")
}

pub(crate) fn user_record_to_graphql(r: UserRecord) -> User {
    User {
        id: r.id,
        full_name: r.full_name(),
        username: r.username,
        firstname: r.firstname,
        lastname: r.lastname,
        stored_email: r.email,
    }
}

pub(crate) fn course_record_to_graphql(r: CourseRecord) -> Course {
    Course {
        id: r.id,
        code: r.code,
        title: r.title,
        visibility: r.visibility,
    }
}

pub(crate) fn session_record_to_graphql(r: SessionRecord) -> Session {
    Session {
        id: r.id,
        name: r.name,
        category_id: r.category_id,
        access_start_date: r.access_start_date.map(|d| d.to_rfc3339()),
        access_end_date: r.access_end_date.map(|d| d.to_rfc3339()),
        duration: r.duration,
        position: r.position,
    }
}

pub(crate) fn message_record_to_graphql(r: MessageRecord) -> Message {
    Message {
        id: r.id,
        sender_id: r.sender_id,
        title: r.title,
        content: r.content,
        send_date: r.send_date.to_rfc3339(),
    }
}

pub(crate) fn resource_link_to_graphql(link: &ResourceLink) -> ResourceLinkInfo {
    ResourceLinkInfo {
        id: link.id,
        course_id: link.course_id,
        session_id: link.session_id,
        group_id: link.group_id,
        user_id: link.user_id,
        user_group_id: link.user_group_id,
        visibility: LinkVisibility::from(link.visibility),
        visibility_name: link.visibility_name().to_string(),
        rights: link.rights.iter().map(|r| r.role.clone()).collect(),
    }
}
