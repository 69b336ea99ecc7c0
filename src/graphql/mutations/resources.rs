use super::prelude::*;

#[derive(Default)]
pub struct ResourceMutations;

#[Object]
impl ResourceMutations {
    /// Publish a document to a course, optionally narrowed to a session and group.
    /// Sharing twice in the same context keeps a single link.
    async fn share_document_with_course(
        &self,
        ctx: &Context<'_>,
        input: ShareWithCourseInput,
    ) -> Result<ShareDocumentResult> {
        let db = ctx.data_unchecked::<Database>();
        let mut document = load_editable_document(ctx, input.document_id).await?;

        let course = load_course(db, input.course_id).await?;
        let session = load_session(db, input.session_id).await?;
        let group = load_group(db, input.group_id, course.id).await?;

        document
            .add_course_link(&course, session.as_ref(), group.as_ref(), input.visibility.into())
            .map_err(|e| bad_request(e.to_string()))?;

        save_and_report(db, &mut document).await
    }

    /// Restrict a document to a course group
    async fn share_document_with_group(
        &self,
        ctx: &Context<'_>,
        input: ShareWithGroupInput,
    ) -> Result<ShareDocumentResult> {
        let db = ctx.data_unchecked::<Database>();
        let mut document = load_editable_document(ctx, input.document_id).await?;

        let course = load_course(db, input.course_id).await?;
        let session = load_session(db, input.session_id).await?;
        let group = load_group(db, Some(input.group_id), course.id)
            .await?
            .ok_or_else(|| not_found("Group", input.group_id))?;

        document.add_group_link(&course, &group, session.as_ref());

        save_and_report(db, &mut document).await
    }

    /// Address a document to individual users. Unknown user ids are ignored.
    async fn share_document_with_users(
        &self,
        ctx: &Context<'_>,
        input: ShareWithUsersInput,
    ) -> Result<ShareDocumentResult> {
        let db = ctx.data_unchecked::<Database>();
        let mut document = load_editable_document(ctx, input.document_id).await?;

        let course = match input.course_id {
            Some(id) => Some(load_course(db, id).await?),
            None => None,
        };
        let session = load_session(db, input.session_id).await?;
        let group = match (input.group_id, &course) {
            (Some(_), Some(c)) => load_group(db, input.group_id, c.id).await?,
            (Some(_), None) => return Err(bad_request("groupId requires courseId")),
            (None, _) => None,
        };

        let users = db.users().get_many(&input.user_ids).await.map_err(internal_error)?;
        if users.len() != input.user_ids.len() {
            tracing::debug!(
                requested = input.user_ids.len(),
                found = users.len(),
                "Some users to share with do not exist"
            );
        }

        document.add_resource_to_user_list(&users, course.as_ref(), session.as_ref(), group.as_ref());

        save_and_report(db, &mut document).await
    }
}

async fn load_editable_document(ctx: &Context<'_>, document_id: i64) -> Result<Document> {
    let auth = ctx.auth_user()?;
    let db = ctx.data_unchecked::<Database>();

    let document = db
        .documents()
        .load(document_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Document", document_id))?;

    ensure_document_permission(db, auth, &document, EDIT).await?;
    Ok(document)
}

async fn load_course(db: &Database, course_id: i64) -> Result<CourseRecord> {
    db.courses()
        .get_by_id(course_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Course", course_id))
}

async fn load_session(db: &Database, session_id: Option<i64>) -> Result<Option<SessionRecord>> {
    let Some(id) = session_id else {
        return Ok(None);
    };
    db.sessions()
        .get_by_id(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Session", id))
        .map(Some)
}

async fn load_group(db: &Database, group_id: Option<i64>, course_id: i64) -> Result<Option<GroupRecord>> {
    let Some(id) = group_id else {
        return Ok(None);
    };
    let group = db
        .groups()
        .get_by_id(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Group", id))?;

    if group.course_id != course_id {
        return Err(bad_request(format!("Group {} does not belong to course {}", id, course_id)));
    }
    Ok(Some(group))
}

async fn save_and_report(db: &Database, document: &mut Document) -> Result<ShareDocumentResult> {
    db.documents()
        .save_links(document)
        .await
        .map_err(internal_error)?;

    let links = document
        .resource_node()
        .map(|n| n.resource_links().iter().map(resource_link_to_graphql).collect())
        .unwrap_or_default();

    Ok(ShareDocumentResult {
        success: true,
        links,
        error: None,
    })
}
