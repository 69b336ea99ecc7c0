//! Resource nodes: the aggregation point of a resource's links

use serde::{Deserialize, Serialize};

use super::link::ResourceLink;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Database id, `None` until persisted
    pub id: Option<i64>,
    pub title: String,
    pub resource_type: String,
    pub creator_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub links: Vec<ResourceLink>,
}

impl ResourceNode {
    pub fn new(title: &str, resource_type: &str) -> Self {
        Self {
            title: title.to_string(),
            resource_type: resource_type.to_string(),
            ..Default::default()
        }
    }

    pub fn resource_links(&self) -> &[ResourceLink] {
        &self.links
    }

    pub fn add_resource_link(&mut self, link: ResourceLink) {
        self.links.push(link);
    }

    /// Links added since the node was loaded
    pub fn unsaved_links_mut(&mut self) -> impl Iterator<Item = &mut ResourceLink> {
        self.links.iter_mut().filter(|l| !l.is_persisted())
    }
}
