use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// Get the current authenticated user
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let auth = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let record = db
            .users()
            .get_by_id(auth.user_id)
            .await
            .map_err(internal_error)?
            .ok_or_else(|| not_found("User", auth.user_id))?;

        Ok(user_record_to_graphql(record))
    }

    /// Get a user by id. Public profile fields only; private fields check access.
    #[graphql(guard = "AuthGuard")]
    async fn user(&self, ctx: &Context<'_>, id: i64) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.users().get_by_id(id).await.map_err(internal_error)?;
        Ok(record.map(user_record_to_graphql))
    }
}

#[ComplexObject]
impl User {
    /// E-mail address, empty unless the platform shows addresses
    async fn email(&self, ctx: &Context<'_>) -> Result<String> {
        protect_current_user_data(ctx, self.id)?;
        let db = ctx.data_unchecked::<Database>();

        let show = db
            .settings()
            .get_flag(SETTING_SHOW_EMAIL_ADDRESSES)
            .await
            .map_err(internal_error)?;

        if !show {
            return Ok(String::new());
        }
        Ok(self.stored_email.clone().unwrap_or_default())
    }

    /// Unread received messages, newest first. With `lastId` only newer ones.
    async fn messages(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 0)] last_id: i64,
    ) -> Result<Vec<Message>> {
        protect_current_user_data(ctx, self.id)?;
        let db = ctx.data_unchecked::<Database>();

        let records = db
            .messages()
            .unread_received(self.id, last_id)
            .await
            .map_err(internal_error)?;

        Ok(records.into_iter().map(message_record_to_graphql).collect())
    }

    /// Users this user may write to, matching `filter` (at least 3 characters)
    async fn message_contacts(&self, ctx: &Context<'_>, filter: String) -> Result<Vec<User>> {
        protect_current_user_data(ctx, self.id)?;

        if filter.chars().count() < MIN_CONTACT_FILTER_LENGTH {
            return Ok(Vec::new());
        }

        let db = ctx.data_unchecked::<Database>();
        let records = db
            .users()
            .find_users_to_send_message(self.id, &filter, MESSAGE_CONTACTS_LIMIT)
            .await
            .map_err(internal_error)?;

        Ok(records.into_iter().map(user_record_to_graphql).collect())
    }

    /// Courses the user is subscribed to on the current access URL
    async fn courses(&self, ctx: &Context<'_>) -> Result<Vec<Course>> {
        protect_current_user_data(ctx, self.id)?;
        let db = ctx.data_unchecked::<Database>();
        let config = ctx.data_unchecked::<Arc<Config>>();

        let ids = db
            .courses()
            .list_ids_by_user(self.id, config.access_url_id)
            .await
            .map_err(internal_error)?;

        let mut courses = Vec::with_capacity(ids.len());
        for id in ids {
            match db.courses().get_by_id(id).await.map_err(internal_error)? {
                Some(course) => courses.push(course_record_to_graphql(course)),
                None => tracing::debug!(course_id = id, "Skipping missing course"),
            }
        }
        Ok(courses)
    }

    /// Sessions the user may see, in the configured session list order
    async fn sessions(&self, ctx: &Context<'_>) -> Result<Vec<Session>> {
        protect_current_user_data(ctx, self.id)?;
        let db = ctx.data_unchecked::<Database>();
        let config = ctx.data_unchecked::<Arc<Config>>();

        let ids = SessionVisibilityService::new(db.clone())
            .find_user_sessions(self.id, config.access_url_id, Utc::now())
            .await
            .map_err(internal_error)?;

        let records = db.sessions().get_many(&ids).await.map_err(internal_error)?;
        Ok(records.into_iter().map(session_record_to_graphql).collect())
    }
}
