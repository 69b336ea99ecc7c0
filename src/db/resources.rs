//! Resource node, link and right persistence

use std::collections::HashMap;

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::sqlite_helpers::{in_placeholders, now_iso8601};
use crate::resource::{Resource, ResourceLink, ResourceNode, ResourceRight, Visibility};

#[derive(Debug, sqlx::FromRow)]
struct NodeRow {
    id: i64,
    title: String,
    resource_type: String,
    creator_id: Option<i64>,
    parent_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: i64,
    course_id: Option<i64>,
    session_id: Option<i64>,
    group_id: Option<i64>,
    user_id: Option<i64>,
    user_group_id: Option<i64>,
    visibility: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct RightRow {
    id: i64,
    resource_link_id: i64,
    role: String,
    mask: i64,
}

impl TryFrom<LinkRow> for ResourceLink {
    type Error = anyhow::Error;

    fn try_from(row: LinkRow) -> Result<Self> {
        let visibility = Visibility::from_i32(row.visibility)
            .ok_or_else(|| anyhow::anyhow!("Unknown link visibility {}", row.visibility))?;

        Ok(Self {
            id: Some(row.id),
            course_id: row.course_id,
            session_id: row.session_id,
            group_id: row.group_id,
            user_id: row.user_id,
            user_group_id: row.user_group_id,
            visibility,
            rights: Vec::new(),
        })
    }
}

pub struct ResourceRepository {
    pool: SqlitePool,
}

impl ResourceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a node row and return its id. Links on `node` are not stored.
    pub async fn create_node(&self, node: &ResourceNode) -> Result<i64> {
        let now = now_iso8601();
        let result = sqlx::query(
            r#"
            INSERT INTO resource_nodes (title, resource_type, creator_id, parent_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&node.title)
        .bind(&node.resource_type)
        .bind(node.creator_id)
        .bind(node.parent_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Load a node with its links (in insertion order) and their rights
    pub async fn get_node(&self, id: i64) -> Result<Option<ResourceNode>> {
        let Some(row) = sqlx::query_as::<_, NodeRow>(
            "SELECT id, title, resource_type, creator_id, parent_id FROM resource_nodes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let links = self.links_for_node(row.id).await?;

        Ok(Some(ResourceNode {
            id: Some(row.id),
            title: row.title,
            resource_type: row.resource_type,
            creator_id: row.creator_id,
            parent_id: row.parent_id,
            links,
        }))
    }

    pub async fn links_for_node(&self, node_id: i64) -> Result<Vec<ResourceLink>> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, course_id, session_id, group_id, user_id, user_group_id, visibility
            FROM resource_links
            WHERE resource_node_id = ?
            ORDER BY id
            "#,
        )
        .bind(node_id)
        .fetch_all(&self.pool)
        .await?;

        let mut links = rows
            .into_iter()
            .map(ResourceLink::try_from)
            .collect::<Result<Vec<_>>>()?;

        let link_ids: Vec<i64> = links.iter().filter_map(|l| l.id).collect();
        let mut rights = self.rights_for_links(&link_ids).await?;
        for link in &mut links {
            if let Some(id) = link.id {
                link.rights = rights.remove(&id).unwrap_or_default();
            }
        }

        Ok(links)
    }

    async fn rights_for_links(&self, link_ids: &[i64]) -> Result<HashMap<i64, Vec<ResourceRight>>> {
        if link_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT id, resource_link_id, role, mask FROM resource_rights WHERE resource_link_id IN ({}) ORDER BY id",
            in_placeholders(link_ids.len())
        );
        let mut query = sqlx::query_as::<_, RightRow>(&sql);
        for id in link_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut by_link: HashMap<i64, Vec<ResourceRight>> = HashMap::new();
        for row in rows {
            by_link.entry(row.resource_link_id).or_default().push(ResourceRight {
                id: Some(row.id),
                role: row.role,
                mask: u32::try_from(row.mask)?,
            });
        }
        Ok(by_link)
    }

    /// Store a link and its rights under `node_id`, filling in the new ids.
    ///
    /// When a link with the same target is already stored under the node, that
    /// link's id is returned and nothing is written.
    pub async fn insert_link(&self, node_id: i64, link: &mut ResourceLink) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO resource_links (
                resource_node_id, course_id, session_id, group_id,
                user_id, user_group_id, visibility, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(node_id)
        .bind(link.course_id)
        .bind(link.session_id)
        .bind(link.group_id)
        .bind(link.user_id)
        .bind(link.user_group_id)
        .bind(link.visibility.as_i32())
        .bind(now_iso8601())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(link_id) = inserted else {
            let existing: i64 = sqlx::query_scalar(
                r#"
                SELECT id FROM resource_links
                WHERE resource_node_id = ?
                  AND IFNULL(course_id, 0) = IFNULL(?, 0)
                  AND IFNULL(session_id, 0) = IFNULL(?, 0)
                  AND IFNULL(group_id, 0) = IFNULL(?, 0)
                  AND IFNULL(user_id, 0) = IFNULL(?, 0)
                  AND IFNULL(user_group_id, 0) = IFNULL(?, 0)
                "#,
            )
            .bind(node_id)
            .bind(link.course_id)
            .bind(link.session_id)
            .bind(link.group_id)
            .bind(link.user_id)
            .bind(link.user_group_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;

            info!(node_id, link_id = existing, "Link target already stored, skipping");
            link.id = Some(existing);
            link.rights = self.rights_for_links(&[existing]).await?.remove(&existing).unwrap_or_default();
            return Ok(existing);
        };

        for right in &mut link.rights {
            let result = sqlx::query(
                "INSERT INTO resource_rights (resource_link_id, role, mask) VALUES (?, ?, ?)",
            )
            .bind(link_id)
            .bind(&right.role)
            .bind(i64::from(right.mask))
            .execute(&mut *tx)
            .await?;
            right.id = Some(result.last_insert_rowid());
        }

        tx.commit().await?;
        link.id = Some(link_id);
        Ok(link_id)
    }

    /// Change the visibility of a stored link
    pub async fn set_link_visibility(&self, link_id: i64, visibility: Visibility) -> Result<bool> {
        let result = sqlx::query("UPDATE resource_links SET visibility = ? WHERE id = ?")
            .bind(visibility.as_i32())
            .bind(link_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Write a resource's node and every link that has not been stored yet.
    ///
    /// A resource without a node gets one first, placed under its parent's
    /// node; links that were waiting in the pending list move onto it.
    pub async fn persist<R: Resource>(&self, resource: &mut R, creator_id: Option<i64>) -> Result<i64> {
        if !resource.has_resource_node() {
            let mut node = ResourceNode::new(resource.resource_name(), resource.resource_type());
            node.creator_id = creator_id;
            node.parent_id = resource.parent_resource_node();
            node.id = Some(self.create_node(&node).await?);
            resource.set_resource_node(node);
        }

        let pending = resource.take_pending_links();
        let state = resource.resource_state_mut();
        let Some(node) = state.resource_node.as_mut() else {
            anyhow::bail!("Resource node missing after creation");
        };
        let Some(node_id) = node.id else {
            anyhow::bail!("Resource node for '{}' has no id", node.title);
        };
        let mut skipped = 0;
        for link in pending {
            if node.resource_links().iter().any(|existing| link.is_duplicate_of(existing)) {
                skipped += 1;
                continue;
            }
            node.add_resource_link(link);
        }
        if skipped > 0 {
            info!(node_id, skipped, "Pending links already present on node, skipping");
        }

        let mut stored = 0;
        for link in node.unsaved_links_mut() {
            self.insert_link(node_id, link).await?;
            stored += 1;
        }

        sqlx::query("UPDATE resource_nodes SET updated_at = ? WHERE id = ?")
            .bind(now_iso8601())
            .bind(node_id)
            .execute(&self.pool)
            .await?;

        debug!(node_id, links = stored, "Persisted resource links");
        Ok(node_id)
    }

    /// Delete a node; its links, rights and owning resource rows cascade
    pub async fn delete_node(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resource_nodes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{CreateCourse, Database};
    use crate::resource::Document;
    use crate::security::ResourceNodeVoter;
    use crate::security::voter::ROLE_CURRENT_COURSE_TEACHER;

    #[tokio::test]
    async fn test_persist_creates_node_and_links() {
        let db = Database::connect_in_memory().await.unwrap();
        let course = db.courses().create(CreateCourse::new("MATH", "Maths")).await.unwrap();
        let repo = db.resources();

        let mut root = Document::folder("Root");
        let root_id = repo.persist(&mut root, None).await.unwrap();

        let mut doc = Document::new("Notes");
        doc.set_parent(&root);
        doc.add_course_link(&course, None, None, Visibility::Draft).unwrap();
        let node_id = repo.persist(&mut doc, None).await.unwrap();

        assert!(doc.pending_links().is_empty());
        let node = repo.get_node(node_id).await.unwrap().unwrap();
        assert_eq!(node.parent_id, Some(root_id));
        assert_eq!(node.links.len(), 1);
        assert_eq!(node.links[0].visibility, Visibility::Draft);
        assert_eq!(node.links[0].rights.len(), 1);
        assert_eq!(node.links[0].rights[0].role, ROLE_CURRENT_COURSE_TEACHER);
        assert_eq!(node.links[0].rights[0].mask, ResourceNodeVoter::editor_mask());

        // Persisting again stores nothing new
        repo.persist(&mut doc, None).await.unwrap();
        assert_eq!(repo.links_for_node(node_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_node_cascades_links() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = db.resources();

        let node_id = repo.create_node(&ResourceNode::new("Tmp", "document")).await.unwrap();
        let mut link = ResourceLink::new(Visibility::Pending);
        link.add_resource_right(ResourceRight::new(ROLE_CURRENT_COURSE_TEACHER, 5));
        repo.insert_link(node_id, &mut link).await.unwrap();

        assert!(repo.delete_node(node_id).await.unwrap());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resource_rights")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(repo.get_node(node_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publishing_a_draft_link() {
        let db = Database::connect_in_memory().await.unwrap();
        let course = db.courses().create(CreateCourse::new("CHEM", "Chemistry")).await.unwrap();
        let repo = db.resources();

        let mut root = Document::folder("Root");
        repo.persist(&mut root, None).await.unwrap();
        let mut doc = Document::new("Lab safety");
        doc.set_parent(&root);
        doc.add_course_link(&course, None, None, Visibility::Draft).unwrap();
        let node_id = repo.persist(&mut doc, None).await.unwrap();
        assert!(!doc.is_visible(&course, None));

        let link_id = repo.links_for_node(node_id).await.unwrap()[0].id.unwrap();
        assert!(repo.set_link_visibility(link_id, Visibility::Published).await.unwrap());

        let links = repo.links_for_node(node_id).await.unwrap();
        assert_eq!(links[0].visibility, Visibility::Published);
        assert_eq!(links[0].rights.len(), 1);
        assert!(!repo.set_link_visibility(9999, Visibility::Published).await.unwrap());
    }

    #[tokio::test]
    async fn test_repeated_course_link_before_first_save_is_stored_once() {
        let db = Database::connect_in_memory().await.unwrap();
        let course = db.courses().create(CreateCourse::new("ECO", "Economics")).await.unwrap();
        let repo = db.resources();

        let mut root = Document::folder("Root");
        repo.persist(&mut root, None).await.unwrap();

        let mut doc = Document::new("Markets");
        doc.set_parent(&root);
        doc.add_course_link(&course, None, None, Visibility::Published).unwrap();
        doc.add_course_link(&course, None, None, Visibility::Published).unwrap();
        let node_id = repo.persist(&mut doc, None).await.unwrap();

        assert_eq!(repo.links_for_node(node_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_raw_pending_links_are_merged_on_persist() {
        let db = Database::connect_in_memory().await.unwrap();
        let course = db.courses().create(CreateCourse::new("LAW", "Law")).await.unwrap();
        let repo = db.resources();

        let mut root = Document::folder("Root");
        repo.persist(&mut root, None).await.unwrap();

        let mut doc = Document::new("Contracts");
        doc.set_parent(&root);
        let link = ResourceLink::new(Visibility::Published).with_course(Some(course.id));
        doc.add_link(link.clone());
        doc.add_link(link);
        let node_id = repo.persist(&mut doc, None).await.unwrap();

        assert_eq!(repo.links_for_node(node_id).await.unwrap().len(), 1);
        assert_eq!(doc.resource_node().unwrap().links.len(), 1);
    }

    #[tokio::test]
    async fn test_storing_same_target_twice_reuses_the_row() {
        let db = Database::connect_in_memory().await.unwrap();
        let course = db.courses().create(CreateCourse::new("ENG", "English")).await.unwrap();
        let repo = db.resources();
        let node_id = repo.create_node(&ResourceNode::new("Essay", "document")).await.unwrap();

        // Two requests that each loaded the node before either saved
        let mut first = ResourceLink::new(Visibility::Draft).with_course(Some(course.id));
        first.add_resource_right(ResourceRight::new(ROLE_CURRENT_COURSE_TEACHER, 5));
        let mut second = first.clone();

        let first_id = repo.insert_link(node_id, &mut first).await.unwrap();
        let second_id = repo.insert_link(node_id, &mut second).await.unwrap();

        assert_eq!(first_id, second_id);
        assert_eq!(second.rights.len(), 1);
        assert_eq!(second.rights[0].id, first.rights[0].id);
        let links = repo.links_for_node(node_id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].rights.len(), 1);
    }
}
