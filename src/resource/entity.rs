//! Behaviour shared by every shareable resource.
//!
//! A resource owns an optional [`ResourceNode`]. Links added while the node is
//! present go straight onto it; links added before the node exists wait in the
//! pending list until [`Resource::take_pending_links`] hands them to
//! persistence.

use tracing::{debug, info};

use super::error::{ResourceError, ResourceResult};
use super::link::{ResourceLink, ResourceLinkSummary, ResourceRight, Visibility};
use super::node::ResourceNode;
use crate::db::{CourseRecord, GroupRecord, SessionRecord, UserRecord};
use crate::security::ResourceNodeVoter;
use crate::security::voter::ROLE_CURRENT_COURSE_TEACHER;

/// Parent resource reference: its name and the node to attach under
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceParent {
    pub name: String,
    pub node_id: Option<i64>,
}

/// Linking state embedded in every resource
#[derive(Debug, Clone, Default)]
pub struct ResourceState {
    pub resource_node: Option<ResourceNode>,
    pub parent: Option<ResourceParent>,
    pub parent_resource_node: Option<i64>,
    pending_links: Vec<ResourceLink>,
}

impl ResourceState {
    pub fn with_node(node: ResourceNode) -> Self {
        Self {
            resource_node: Some(node),
            ..Default::default()
        }
    }

    /// Add `link` unless a node link or a pending link already satisfies
    /// `is_duplicate`. Returns whether the link was stored.
    fn push_link<F>(&mut self, link: ResourceLink, is_duplicate: F) -> bool
    where
        F: Fn(&ResourceLink) -> bool,
    {
        if self.pending_links.iter().any(&is_duplicate) {
            return false;
        }
        match self.resource_node.as_mut() {
            Some(node) => {
                if node.resource_links().iter().any(&is_duplicate) {
                    return false;
                }
                node.add_resource_link(link);
                true
            }
            None => {
                self.pending_links.push(link);
                true
            }
        }
    }
}

/// Who can see a resource, derived from its links
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscribedAudience {
    /// No link targets a user or a group
    pub everyone: bool,
    pub users: Vec<i64>,
    pub groups: Vec<i64>,
}

pub trait Resource {
    fn resource_name(&self) -> &str;

    fn set_resource_name(&mut self, name: &str);

    /// Type tag stored on the resource node
    fn resource_type(&self) -> &'static str;

    fn resource_state(&self) -> &ResourceState;

    fn resource_state_mut(&mut self) -> &mut ResourceState;

    fn resource_node(&self) -> Option<&ResourceNode> {
        self.resource_state().resource_node.as_ref()
    }

    fn has_resource_node(&self) -> bool {
        self.resource_node().is_some()
    }

    fn set_resource_node(&mut self, node: ResourceNode) {
        self.resource_state_mut().resource_node = Some(node);
    }

    fn resource_node_id(&self) -> Option<i64> {
        self.resource_node().and_then(|n| n.id)
    }

    fn set_parent(&mut self, parent: &dyn Resource) {
        let state = self.resource_state_mut();
        state.parent = Some(ResourceParent {
            name: parent.resource_name().to_string(),
            node_id: parent.resource_node_id(),
        });
        state.parent_resource_node = parent.resource_node_id();
    }

    fn parent(&self) -> Option<&ResourceParent> {
        self.resource_state().parent.as_ref()
    }

    /// A parent was set, or the resource was loaded below a parent node
    fn has_parent(&self) -> bool {
        self.parent().is_some() || self.parent_resource_node().is_some()
    }

    fn set_parent_resource_node(&mut self, node_id: Option<i64>) {
        self.resource_state_mut().parent_resource_node = node_id;
    }

    fn parent_resource_node(&self) -> Option<i64> {
        self.resource_state().parent_resource_node
    }

    /// Links collected before a resource node existed
    fn pending_links(&self) -> &[ResourceLink] {
        &self.resource_state().pending_links
    }

    fn take_pending_links(&mut self) -> Vec<ResourceLink> {
        std::mem::take(&mut self.resource_state_mut().pending_links)
    }

    /// Unconditional append to the pending list
    fn add_link(&mut self, link: ResourceLink) {
        self.resource_state_mut().pending_links.push(link);
    }

    fn add_course_link(
        &mut self,
        course: &CourseRecord,
        session: Option<&SessionRecord>,
        group: Option<&GroupRecord>,
        visibility: Visibility,
    ) -> ResourceResult<()> {
        if !self.has_parent() {
            return Err(ResourceError::MissingParent {
                operation: "add_course_link",
            });
        }

        let course_id = Some(course.id);
        let session_id = session.map(|s| s.id);
        let group_id = group.map(|g| g.iid);

        let mut link = ResourceLink::new(visibility)
            .with_course(course_id)
            .with_session(session_id)
            .with_group(group_id);

        if visibility.is_unpublished() {
            link.add_resource_right(ResourceRight::new(
                ROLE_CURRENT_COURSE_TEACHER,
                ResourceNodeVoter::editor_mask(),
            ));
        }

        let added = self
            .resource_state_mut()
            .push_link(link, |l| l.matches_context(course_id, session_id, group_id));

        if added {
            debug!(
                resource = %self.resource_name(),
                course_id = course.id,
                session_id = ?session_id,
                group_id = ?group_id,
                visibility = visibility.name(),
                "Added course link"
            );
        } else {
            info!(
                resource = %self.resource_name(),
                course_id = course.id,
                "Course link already exists, skipping"
            );
        }

        Ok(())
    }

    fn add_group_link(
        &mut self,
        course: &CourseRecord,
        group: &GroupRecord,
        session: Option<&SessionRecord>,
    ) {
        let group_id = group.iid;
        let link = ResourceLink::new(Visibility::Published)
            .with_course(Some(course.id))
            .with_session(session.map(|s| s.id))
            .with_group(Some(group_id));

        if !self
            .resource_state_mut()
            .push_link(link, |l| l.group_id == Some(group_id))
        {
            info!(resource = %self.resource_name(), group_id, "Group link already exists, skipping");
        }
    }

    fn add_user_link(
        &mut self,
        user: &UserRecord,
        course: Option<&CourseRecord>,
        session: Option<&SessionRecord>,
        group: Option<&GroupRecord>,
    ) {
        let user_id = user.id;
        let link = ResourceLink::new(Visibility::Published)
            .with_user(Some(user_id))
            .with_course(course.map(|c| c.id))
            .with_session(session.map(|s| s.id))
            .with_group(group.map(|g| g.iid));

        if self
            .resource_state_mut()
            .push_link(link, |l| l.user_id == Some(user_id))
        {
            debug!(resource = %self.resource_name(), user_id, "Added user link");
        } else {
            info!(
                resource = %self.resource_name(),
                username = %user.username,
                "Link already exists for user, skipping"
            );
        }
    }

    fn add_resource_to_user_list(
        &mut self,
        users: &[UserRecord],
        course: Option<&CourseRecord>,
        session: Option<&SessionRecord>,
        group: Option<&GroupRecord>,
    ) {
        for user in users {
            self.add_user_link(user, course, session, group);
        }
    }

    fn first_resource_link(&self) -> Option<&ResourceLink> {
        self.resource_node()
            .and_then(|n| n.resource_links().first())
    }

    fn first_resource_link_from_course_session(
        &self,
        course: &CourseRecord,
        session: Option<&SessionRecord>,
    ) -> Option<&ResourceLink> {
        let session_id = session.map(|s| s.id);
        self.resource_node()?
            .resource_links()
            .iter()
            .find(|l| l.course_id == Some(course.id) && l.session_id == session_id)
    }

    /// Visibility of the first link in (course, session), if any
    fn link_visibility(
        &self,
        course: &CourseRecord,
        session: Option<&SessionRecord>,
    ) -> Option<Visibility> {
        self.first_resource_link_from_course_session(course, session)
            .map(|l| l.visibility)
    }

    fn is_visible(&self, course: &CourseRecord, session: Option<&SessionRecord>) -> bool {
        self.link_visibility(course, session) == Some(Visibility::Published)
    }

    fn resource_link_list_from_entity(&self) -> Vec<ResourceLinkSummary> {
        self.resource_node()
            .map(|n| n.resource_links().iter().map(ResourceLinkSummary::from).collect())
            .unwrap_or_default()
    }

    fn users_and_groups_subscribed(&self) -> SubscribedAudience {
        let mut audience = SubscribedAudience::default();
        for link in self.resource_node().map(|n| n.resource_links()).unwrap_or_default() {
            if let Some(user_id) = link.user_id {
                audience.users.push(user_id);
            }
            if let Some(group_id) = link.group_id {
                audience.groups.push(group_id);
            }
        }
        audience.everyone = audience.users.is_empty() && audience.groups.is_empty();
        audience
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::resource::Document;
    use crate::security::voter::{EDIT, VIEW};

    fn course(id: i64) -> CourseRecord {
        CourseRecord {
            id,
            code: format!("C{id}"),
            title: format!("Course {id}"),
            visibility: 2,
        }
    }

    fn session(id: i64) -> SessionRecord {
        SessionRecord {
            id,
            name: format!("Session {id}"),
            category_id: None,
            access_start_date: None,
            access_end_date: None,
            coach_access_start_date: None,
            coach_access_end_date: None,
            duration: 0,
            position: 0,
            visibility: 1,
            general_coach_id: None,
        }
    }

    fn group(iid: i64, course_id: i64) -> GroupRecord {
        GroupRecord {
            iid,
            course_id,
            name: format!("Group {iid}"),
        }
    }

    fn user(id: i64) -> UserRecord {
        UserRecord {
            id,
            username: format!("user{id}"),
            firstname: "First".into(),
            lastname: "Last".into(),
            email: None,
            role: "ROLE_STUDENT".into(),
            active: true,
            created_at: chrono::Utc::now(),
        }
    }

    fn document_with_node() -> Document {
        let mut parent = Document::new("Course root");
        parent.set_resource_node(ResourceNode {
            id: Some(1),
            ..ResourceNode::new("Course root", "document")
        });
        let mut doc = Document::new("Syllabus");
        doc.set_resource_node(ResourceNode::new("Syllabus", "document"));
        doc.set_parent(&parent);
        doc
    }

    #[test]
    fn test_course_link_requires_parent() {
        let mut doc = Document::new("Orphan");
        let result = doc.add_course_link(&course(1), None, None, Visibility::Published);
        assert_matches!(result, Err(ResourceError::MissingParent { .. }));
        assert!(doc.pending_links().is_empty());
    }

    #[test]
    fn test_course_link_is_idempotent_per_context() {
        let mut doc = document_with_node();
        let c = course(1);
        let s = session(2);

        doc.add_course_link(&c, Some(&s), None, Visibility::Published).unwrap();
        doc.add_course_link(&c, Some(&s), None, Visibility::Draft).unwrap();
        assert_eq!(doc.resource_node().unwrap().links.len(), 1);

        // A different session is a different context
        doc.add_course_link(&c, None, None, Visibility::Published).unwrap();
        assert_eq!(doc.resource_node().unwrap().links.len(), 2);
    }

    #[test]
    fn test_unpublished_course_link_gets_teacher_right() {
        let mut doc = document_with_node();
        doc.add_course_link(&course(1), None, None, Visibility::Draft).unwrap();
        doc.add_course_link(&course(2), None, None, Visibility::Published).unwrap();

        let links = &doc.resource_node().unwrap().links;
        assert_eq!(
            links[0].rights,
            vec![ResourceRight::new(ROLE_CURRENT_COURSE_TEACHER, VIEW | EDIT)]
        );
        assert!(links[1].rights.is_empty());
    }

    #[test]
    fn test_links_without_node_go_to_pending_list() {
        let parent = document_with_node();
        let mut doc = Document::new("Draft");
        doc.set_parent(&parent);

        doc.add_course_link(&course(1), None, None, Visibility::Pending).unwrap();
        doc.add_course_link(&course(1), None, None, Visibility::Pending).unwrap();
        doc.add_user_link(&user(3), None, None, None);
        doc.add_user_link(&user(3), Some(&course(1)), None, None);
        assert_eq!(doc.pending_links().len(), 2);

        let taken = doc.take_pending_links();
        assert_eq!(taken.len(), 2);
        assert!(doc.pending_links().is_empty());
    }

    #[test]
    fn test_pending_course_link_gets_teacher_right() {
        let mut doc = document_with_node();
        doc.add_course_link(&course(1), None, None, Visibility::Pending).unwrap();

        let links = &doc.resource_node().unwrap().links;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].visibility, Visibility::Pending);
        assert_eq!(
            links[0].rights,
            vec![ResourceRight::new(ROLE_CURRENT_COURSE_TEACHER, VIEW | EDIT)]
        );
    }

    #[test]
    fn test_group_and_user_links_deduplicate() {
        let mut doc = document_with_node();
        let c = course(1);
        let g = group(7, 1);

        doc.add_group_link(&c, &g, None);
        doc.add_group_link(&c, &g, Some(&session(3)));
        let users = [user(10), user(11), user(10)];
        doc.add_resource_to_user_list(&users, Some(&c), None, None);

        let links = &doc.resource_node().unwrap().links;
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].group_id, Some(7));
        assert_eq!(links[1].user_id, Some(10));
        assert_eq!(links[2].user_id, Some(11));
    }

    #[test]
    fn test_visibility_lookup_by_course_session() {
        let mut doc = document_with_node();
        let c = course(1);
        let s = session(2);
        doc.add_course_link(&c, None, None, Visibility::Published).unwrap();
        doc.add_course_link(&c, Some(&s), None, Visibility::Draft).unwrap();

        assert!(doc.is_visible(&c, None));
        assert!(!doc.is_visible(&c, Some(&s)));
        assert_eq!(doc.link_visibility(&c, Some(&s)), Some(Visibility::Draft));
        assert_eq!(doc.link_visibility(&course(5), None), None);
        assert_eq!(doc.first_resource_link().unwrap().session_id, None);
    }

    #[test]
    fn test_subscribed_audience() {
        let mut doc = document_with_node();
        let c = course(1);
        doc.add_course_link(&c, None, None, Visibility::Published).unwrap();
        assert_eq!(
            doc.users_and_groups_subscribed(),
            SubscribedAudience { everyone: true, users: vec![], groups: vec![] }
        );

        doc.add_user_link(&user(4), Some(&c), None, None);
        doc.add_group_link(&c, &group(9, 1), None);
        let audience = doc.users_and_groups_subscribed();
        assert!(!audience.everyone);
        assert_eq!(audience.users, vec![4]);
        assert_eq!(audience.groups, vec![9]);
    }

    #[test]
    fn test_link_list_summary() {
        let mut doc = document_with_node();
        doc.add_course_link(&course(1), Some(&session(2)), None, Visibility::Pending).unwrap();
        let list = doc.resource_link_list_from_entity();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].visibility_name, "pending");
        assert_eq!(list[0].session_id, Some(2));
    }
}
