//! Document database operations

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::resources::ResourceRepository;
use crate::resource::{Document, DocumentFileType, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentRecord {
    pub iid: i64,
    pub title: String,
    pub filetype: String,
    pub comment: Option<String>,
    pub resource_node_id: Option<i64>,
}

pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn resources(&self) -> ResourceRepository {
        ResourceRepository::new(self.pool.clone())
    }

    /// Store a new document together with its node and links
    pub async fn create(&self, document: &mut Document, creator_id: Option<i64>) -> Result<DocumentRecord> {
        let node_id = self.resources().persist(document, creator_id).await?;

        let result = sqlx::query(
            "INSERT INTO documents (title, filetype, comment, resource_node_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&document.title)
        .bind(document.filetype.as_str())
        .bind(&document.comment)
        .bind(node_id)
        .execute(&self.pool)
        .await?;

        let iid = result.last_insert_rowid();
        document.iid = Some(iid);

        self.get_by_id(iid)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create document"))
    }

    pub async fn get_by_id(&self, iid: i64) -> Result<Option<DocumentRecord>> {
        let record = sqlx::query_as::<_, DocumentRecord>("SELECT * FROM documents WHERE iid = ?")
            .bind(iid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Load a document as a [`Document`] with its node, links and rights
    pub async fn load(&self, iid: i64) -> Result<Option<Document>> {
        let Some(record) = self.get_by_id(iid).await? else {
            return Ok(None);
        };
        let Some(node_id) = record.resource_node_id else {
            anyhow::bail!("Document {} has no resource node", iid);
        };
        let node = self
            .resources()
            .get_node(node_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Resource node {} not found", node_id))?;

        let filetype = DocumentFileType::parse(&record.filetype).unwrap_or_default();
        let mut document = Document::with_node(record.iid, &record.title, filetype, node);
        document.comment = record.comment;
        let parent_id = document.resource_node().and_then(|n| n.parent_id);
        document.set_parent_resource_node(parent_id);
        Ok(Some(document))
    }

    /// Store links added to a loaded document since it was read
    pub async fn save_links(&self, document: &mut Document) -> Result<i64> {
        self.resources().persist(document, None).await
    }

    /// Delete a document by removing its node
    pub async fn delete(&self, iid: i64) -> Result<bool> {
        let Some(record) = self.get_by_id(iid).await? else {
            return Ok(false);
        };

        match record.resource_node_id {
            Some(node_id) => self.resources().delete_node(node_id).await,
            None => {
                let result = sqlx::query("DELETE FROM documents WHERE iid = ?")
                    .bind(iid)
                    .execute(&self.pool)
                    .await?;
                Ok(result.rows_affected() > 0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{CreateCourse, Database};
    use crate::resource::Visibility;

    #[tokio::test]
    async fn test_create_and_load_document() {
        let db = Database::connect_in_memory().await.unwrap();
        let course = db.courses().create(CreateCourse::new("BIO", "Biology")).await.unwrap();

        let mut root = Document::folder("Biology");
        db.documents().create(&mut root, None).await.unwrap();

        let mut doc = Document::new("Cells");
        doc.set_parent(&root);
        doc.add_course_link(&course, None, None, Visibility::Published).unwrap();
        let record = db.documents().create(&mut doc, None).await.unwrap();
        assert_eq!(record.filetype, "file");

        let loaded = db.documents().load(record.iid).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Cells");
        assert!(loaded.is_visible(&course, None));
        assert_eq!(loaded.parent_resource_node(), root.resource_node_id());
    }

    #[tokio::test]
    async fn test_delete_document_removes_node_and_links() {
        let db = Database::connect_in_memory().await.unwrap();
        let course = db.courses().create(CreateCourse::new("ART", "Art")).await.unwrap();

        let mut root = Document::folder("Art");
        db.documents().create(&mut root, None).await.unwrap();
        let mut doc = Document::new("Colours");
        doc.set_parent(&root);
        doc.add_course_link(&course, None, None, Visibility::Draft).unwrap();
        let record = db.documents().create(&mut doc, None).await.unwrap();

        assert!(db.documents().delete(record.iid).await.unwrap());
        assert!(db.documents().get_by_id(record.iid).await.unwrap().is_none());

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resource_links")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(links, 0);
        assert!(!db.documents().delete(record.iid).await.unwrap());
    }
}
