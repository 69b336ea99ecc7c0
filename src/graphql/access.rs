//! Per-document access checks backed by the resource node voter

use async_graphql::Result;

use crate::db::Database;
use crate::db::courses::{COURSE_STATUS_STUDENT, COURSE_STATUS_TEACHER};
use crate::graphql::auth::AuthUser;
use crate::graphql::helpers::{forbidden, internal_error};
use crate::resource::{Document, Resource, ResourceLink, Visibility};
use crate::security::ResourceNodeVoter;
use crate::security::voter::{
    ROLE_CURRENT_COURSE_SESSION_STUDENT, ROLE_CURRENT_COURSE_SESSION_TEACHER,
    ROLE_CURRENT_COURSE_STUDENT, ROLE_CURRENT_COURSE_TEACHER, VIEW,
};

/// Course roles the user holds in the context of one link
pub(crate) async fn roles_for_link(
    db: &Database,
    user_id: i64,
    link: &ResourceLink,
) -> Result<Vec<&'static str>> {
    let mut roles = Vec::new();

    if let Some(course_id) = link.course_id {
        match db
            .courses()
            .user_status(course_id, user_id)
            .await
            .map_err(internal_error)?
        {
            Some(COURSE_STATUS_TEACHER) => roles.push(ROLE_CURRENT_COURSE_TEACHER),
            Some(COURSE_STATUS_STUDENT) => roles.push(ROLE_CURRENT_COURSE_STUDENT),
            _ => {}
        }
    }

    if let Some(session_id) = link.session_id {
        let sessions = db.sessions();
        let coaches = sessions.coach_ids(session_id).await.map_err(internal_error)?;
        if coaches.contains(&user_id) {
            roles.push(ROLE_CURRENT_COURSE_SESSION_TEACHER);
        } else if !sessions
            .courses_for_user(session_id, user_id)
            .await
            .map_err(internal_error)?
            .is_empty()
        {
            roles.push(ROLE_CURRENT_COURSE_SESSION_STUDENT);
        }
    }

    Ok(roles)
}

/// Fail with FORBIDDEN unless `auth` holds `permission` on the document.
///
/// Administrators and the node creator always pass. Otherwise one of the
/// document's links must grant the permission to the caller's course roles,
/// or be a published link addressed to the caller when only viewing.
pub(crate) async fn ensure_document_permission(
    db: &Database,
    auth: &AuthUser,
    document: &Document,
    permission: u32,
) -> Result<()> {
    if auth.is_admin() {
        return Ok(());
    }

    let Some(node) = document.resource_node() else {
        return Err(forbidden("Document has no resource node"));
    };
    if node.creator_id == Some(auth.user_id) {
        return Ok(());
    }

    for link in node.resource_links() {
        if permission == VIEW
            && link.user_id == Some(auth.user_id)
            && link.visibility == Visibility::Published
        {
            return Ok(());
        }

        let roles = roles_for_link(db, auth.user_id, link).await?;
        if ResourceNodeVoter::is_granted(roles.as_slice(), &ResourceNodeVoter::effective_rights(link), permission) {
            return Ok(());
        }
    }

    tracing::debug!(user_id = auth.user_id, permission, "Document access denied");
    Err(forbidden("Not allowed to access this document"))
}
