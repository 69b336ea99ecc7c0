//! Course documents, the concrete shareable resource

use serde::Serialize;

use super::entity::{Resource, ResourceState};
use super::node::ResourceNode;

pub const DOCUMENT_RESOURCE_TYPE: &str = "document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum DocumentFileType {
    #[default]
    File,
    Folder,
}

impl DocumentFileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(Self::File),
            "folder" => Some(Self::Folder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub iid: Option<i64>,
    pub title: String,
    pub filetype: DocumentFileType,
    pub comment: Option<String>,
    state: ResourceState,
}

impl Document {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn folder(title: &str) -> Self {
        Self {
            filetype: DocumentFileType::Folder,
            ..Self::new(title)
        }
    }

    /// Document loaded from storage together with its node
    pub fn with_node(iid: i64, title: &str, filetype: DocumentFileType, node: ResourceNode) -> Self {
        Self {
            iid: Some(iid),
            title: title.to_string(),
            filetype,
            comment: None,
            state: ResourceState::with_node(node),
        }
    }
}

impl Resource for Document {
    fn resource_name(&self) -> &str {
        &self.title
    }

    fn set_resource_name(&mut self, name: &str) {
        self.title = name.to_string();
    }

    fn resource_type(&self) -> &'static str {
        DOCUMENT_RESOURCE_TYPE
    }

    fn resource_state(&self) -> &ResourceState {
        &self.state
    }

    fn resource_state_mut(&mut self) -> &mut ResourceState {
        &mut self.state
    }
}
