//! Resource links and the rights attached to them

use serde::{Deserialize, Serialize};

/// Publication state of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Visibility {
    Draft = 0,
    Pending = 1,
    #[default]
    Published = 2,
    Deleted = 3,
}

impl Visibility {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Draft),
            1 => Some(Self::Pending),
            2 => Some(Self::Published),
            3 => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Deleted => "deleted",
        }
    }

    /// Links that are not public yet need an explicit editor right
    pub fn is_unpublished(self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }
}

/// A role and the permission mask it holds on one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRight {
    pub id: Option<i64>,
    pub role: String,
    pub mask: u32,
}

impl ResourceRight {
    pub fn new(role: &str, mask: u32) -> Self {
        Self {
            id: None,
            role: role.to_string(),
            mask,
        }
    }
}

/// Who a link is addressed to, from the most specific target set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAudience {
    Everyone,
    Course(i64),
    Session { course_id: Option<i64>, session_id: i64 },
    Group { course_id: Option<i64>, group_id: i64 },
    User(i64),
}

/// Association of a resource node with a visibility and an optional audience
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceLink {
    /// Database id, `None` until persisted
    pub id: Option<i64>,
    pub course_id: Option<i64>,
    pub session_id: Option<i64>,
    pub group_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_group_id: Option<i64>,
    pub visibility: Visibility,
    pub rights: Vec<ResourceRight>,
}

impl ResourceLink {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            ..Default::default()
        }
    }

    pub fn with_course(mut self, course_id: Option<i64>) -> Self {
        self.course_id = course_id;
        self
    }

    pub fn with_session(mut self, session_id: Option<i64>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_group(mut self, group_id: Option<i64>) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn with_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn add_resource_right(&mut self, right: ResourceRight) {
        self.rights.push(right);
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn visibility_name(&self) -> &'static str {
        self.visibility.name()
    }

    /// Same (course, session, group) key
    pub fn matches_context(
        &self,
        course_id: Option<i64>,
        session_id: Option<i64>,
        group_id: Option<i64>,
    ) -> bool {
        self.course_id == course_id && self.session_id == session_id && self.group_id == group_id
    }

    /// Whether `existing` already covers this link's audience: user links by
    /// user, group links by group, everything else by (course, session, group)
    pub fn is_duplicate_of(&self, existing: &ResourceLink) -> bool {
        if self.user_id.is_some() {
            return existing.user_id == self.user_id;
        }
        if self.group_id.is_some() && existing.group_id == self.group_id {
            return true;
        }
        existing.user_id.is_none()
            && existing.matches_context(self.course_id, self.session_id, self.group_id)
    }

    pub fn audience(&self) -> LinkAudience {
        if let Some(user_id) = self.user_id {
            return LinkAudience::User(user_id);
        }
        if let Some(group_id) = self.group_id {
            return LinkAudience::Group {
                course_id: self.course_id,
                group_id,
            };
        }
        if let Some(session_id) = self.session_id {
            return LinkAudience::Session {
                course_id: self.course_id,
                session_id,
            };
        }
        match self.course_id {
            Some(course_id) => LinkAudience::Course(course_id),
            None => LinkAudience::Everyone,
        }
    }
}

/// Flat description of a link for API consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLinkSummary {
    pub id: Option<i64>,
    pub session_id: Option<i64>,
    pub course_id: Option<i64>,
    pub visibility: Visibility,
    pub visibility_name: &'static str,
    pub group_id: Option<i64>,
    pub user_group_id: Option<i64>,
}

impl From<&ResourceLink> for ResourceLinkSummary {
    fn from(link: &ResourceLink) -> Self {
        Self {
            id: link.id,
            session_id: link.session_id,
            course_id: link.course_id,
            visibility: link.visibility,
            visibility_name: link.visibility_name(),
            group_id: link.group_id,
            user_group_id: link.user_group_id,
        }
    }
}
