use super::prelude::*;
use crate::graphql::access::ensure_document_permission;
use crate::security::voter::VIEW;

#[derive(Default)]
pub struct ResourceQueries;

#[Object]
impl ResourceQueries {
    /// Links of a document with their visibility and explicit rights
    async fn document_links(&self, ctx: &Context<'_>, document_id: i64) -> Result<Vec<ResourceLinkInfo>> {
        let auth = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let document = db
            .documents()
            .load(document_id)
            .await
            .map_err(internal_error)?
            .ok_or_else(|| not_found("Document", document_id))?;
        ensure_document_permission(db, auth, &document, VIEW).await?;

        Ok(document
            .resource_node()
            .map(|n| n.resource_links().iter().map(resource_link_to_graphql).collect())
            .unwrap_or_default())
    }

    /// Users and groups a document is addressed to
    async fn document_audience(&self, ctx: &Context<'_>, document_id: i64) -> Result<ResourceAudience> {
        let auth = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let document = db
            .documents()
            .load(document_id)
            .await
            .map_err(internal_error)?
            .ok_or_else(|| not_found("Document", document_id))?;
        ensure_document_permission(db, auth, &document, VIEW).await?;

        let audience = document.users_and_groups_subscribed();
        Ok(ResourceAudience {
            everyone: audience.everyone,
            user_ids: audience.users,
            group_ids: audience.groups,
        })
    }
}
