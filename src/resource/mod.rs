//! Shareable resources and the links that publish them to courses,
//! sessions, groups and users.

pub mod document;
pub mod entity;
pub mod error;
pub mod link;
pub mod node;

pub use document::{DOCUMENT_RESOURCE_TYPE, Document, DocumentFileType};
pub use entity::{Resource, ResourceParent, ResourceState, SubscribedAudience};
pub use error::{ResourceError, ResourceResult};
pub use link::{LinkAudience, ResourceLink, ResourceLinkSummary, ResourceRight, Visibility};
pub use node::ResourceNode;
