//! Resource node voter: course roles and their permission masks.
//!
//! Masks follow the usual ACL mask-builder layout, so a stored `mask` can be
//! tested with a plain bitwise AND.

use crate::resource::{ResourceLink, ResourceRight, Visibility};

pub const VIEW: u32 = 1;
pub const CREATE: u32 = 1 << 1;
pub const EDIT: u32 = 1 << 2;
pub const DELETE: u32 = 1 << 3;
pub const UNDELETE: u32 = 1 << 4;
pub const OPERATOR: u32 = 1 << 5;
pub const MASTER: u32 = 1 << 6;
pub const OWNER: u32 = 1 << 7;

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_CURRENT_COURSE_TEACHER: &str = "ROLE_CURRENT_COURSE_TEACHER";
pub const ROLE_CURRENT_COURSE_STUDENT: &str = "ROLE_CURRENT_COURSE_STUDENT";
pub const ROLE_CURRENT_COURSE_GROUP_TEACHER: &str = "ROLE_CURRENT_COURSE_GROUP_TEACHER";
pub const ROLE_CURRENT_COURSE_GROUP_STUDENT: &str = "ROLE_CURRENT_COURSE_GROUP_STUDENT";
pub const ROLE_CURRENT_COURSE_SESSION_TEACHER: &str = "ROLE_CURRENT_COURSE_SESSION_TEACHER";
pub const ROLE_CURRENT_COURSE_SESSION_STUDENT: &str = "ROLE_CURRENT_COURSE_SESSION_STUDENT";

/// Maps course roles to permission masks and answers access questions about resource links.
pub struct ResourceNodeVoter;

impl ResourceNodeVoter {
    /// Mask of someone who may only look at a resource
    pub fn reader_mask() -> u32 {
        VIEW
    }

    /// Mask of someone who may change a resource
    pub fn editor_mask() -> u32 {
        VIEW | EDIT
    }

    /// Every permission bit
    pub fn full_mask() -> u32 {
        VIEW | CREATE | EDIT | DELETE | UNDELETE | OPERATOR | MASTER | OWNER
    }

    /// Permission mask carried by a role, `None` for roles the voter does not know
    pub fn mask_for_role(role: &str) -> Option<u32> {
        match role {
            ROLE_ADMIN => Some(Self::full_mask()),
            ROLE_CURRENT_COURSE_TEACHER
            | ROLE_CURRENT_COURSE_GROUP_TEACHER
            | ROLE_CURRENT_COURSE_SESSION_TEACHER => Some(Self::editor_mask()),
            ROLE_CURRENT_COURSE_STUDENT
            | ROLE_CURRENT_COURSE_GROUP_STUDENT
            | ROLE_CURRENT_COURSE_SESSION_STUDENT => Some(Self::reader_mask()),
            _ => None,
        }
    }

    /// Rights in force on a link: its stored rights plus the course defaults.
    ///
    /// Course, group and session teachers may always edit. Students may read
    /// once the link is published.
    pub fn effective_rights(link: &ResourceLink) -> Vec<ResourceRight> {
        let mut rights = link.rights.clone();
        for role in [
            ROLE_CURRENT_COURSE_TEACHER,
            ROLE_CURRENT_COURSE_GROUP_TEACHER,
            ROLE_CURRENT_COURSE_SESSION_TEACHER,
        ] {
            rights.push(ResourceRight::new(role, Self::editor_mask()));
        }
        if link.visibility == Visibility::Published {
            for role in [
                ROLE_CURRENT_COURSE_STUDENT,
                ROLE_CURRENT_COURSE_GROUP_STUDENT,
                ROLE_CURRENT_COURSE_SESSION_STUDENT,
            ] {
                rights.push(ResourceRight::new(role, Self::reader_mask()));
            }
        }
        rights
    }

    /// Whether any right held through `user_roles` grants `permission`
    pub fn is_granted<S: AsRef<str>>(user_roles: &[S], rights: &[ResourceRight], permission: u32) -> bool {
        if user_roles.iter().any(|r| r.as_ref() == ROLE_ADMIN) {
            return true;
        }

        rights.iter().any(|right| {
            right.mask & permission == permission
                && user_roles.iter().any(|role| role.as_ref() == right.role)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_mask_contains_reader_mask() {
        let editor = ResourceNodeVoter::editor_mask();
        assert_eq!(editor & ResourceNodeVoter::reader_mask(), VIEW);
        assert_eq!(editor & EDIT, EDIT);
        assert_eq!(editor & DELETE, 0);
    }

    #[test]
    fn test_mask_for_role() {
        assert_eq!(
            ResourceNodeVoter::mask_for_role(ROLE_CURRENT_COURSE_TEACHER),
            Some(VIEW | EDIT)
        );
        assert_eq!(
            ResourceNodeVoter::mask_for_role(ROLE_CURRENT_COURSE_SESSION_STUDENT),
            Some(VIEW)
        );
        assert_eq!(ResourceNodeVoter::mask_for_role(ROLE_ADMIN), Some(255));
        assert_eq!(ResourceNodeVoter::mask_for_role("ROLE_SOMETHING"), None);
    }

    #[test]
    fn test_is_granted_matches_role_and_bits() {
        let rights = vec![ResourceRight::new(
            ROLE_CURRENT_COURSE_TEACHER,
            ResourceNodeVoter::editor_mask(),
        )];

        assert!(ResourceNodeVoter::is_granted(&[ROLE_CURRENT_COURSE_TEACHER], &rights, EDIT));
        assert!(!ResourceNodeVoter::is_granted(&[ROLE_CURRENT_COURSE_TEACHER], &rights, DELETE));
        assert!(!ResourceNodeVoter::is_granted(&[ROLE_CURRENT_COURSE_STUDENT], &rights, VIEW));
        assert!(ResourceNodeVoter::is_granted(&[ROLE_ADMIN], &[], DELETE));
    }

    #[test]
    fn test_students_read_published_links_only() {
        let published = ResourceLink::new(Visibility::Published);
        let draft = ResourceLink::new(Visibility::Draft);

        let rights = ResourceNodeVoter::effective_rights(&published);
        assert!(ResourceNodeVoter::is_granted(&[ROLE_CURRENT_COURSE_STUDENT], &rights, VIEW));
        assert!(!ResourceNodeVoter::is_granted(&[ROLE_CURRENT_COURSE_STUDENT], &rights, EDIT));

        let rights = ResourceNodeVoter::effective_rights(&draft);
        assert!(!ResourceNodeVoter::is_granted(&[ROLE_CURRENT_COURSE_STUDENT], &rights, VIEW));
        assert!(ResourceNodeVoter::is_granted(&[ROLE_CURRENT_COURSE_SESSION_TEACHER], &rights, EDIT));
    }
}
