//! Session visibility resolver
//!
//! Decides which training sessions a user may see on the "my sessions" list:
//! - sorting follows the platform settings (category/name, start date,
//!   manual position, or an admin defined field and direction)
//! - expired sessions are hidden from participants but kept for coaches
//! - a session that is not plainly visible is kept when at least one of its
//!   courses is open to the user

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::db::{
    Database, SessionAccessRecord, SessionCourseRecord, SessionRecord, SettingsRepository,
};

pub const SETTING_SESSION_LIST_ORDER: &str = "session.session_list_order";
pub const SETTING_SHOW_ALL_SESSIONS: &str = "session.show_all_sessions_on_my_course_page";
pub const SETTING_MY_COURSES_SESSION_ORDER: &str = "session.my_courses_session_order";

/// Access level of a user to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionVisibility {
    ReadOnly = 1,
    Visible = 2,
    Invisible = 3,
    Available = 4,
}

impl SessionVisibility {
    /// Decode a stored `sessions.visibility` value; unknown values are read-only
    pub fn from_i32(value: i32) -> Self {
        match value {
            2 => Self::Visible,
            3 => Self::Invisible,
            4 => Self::Available,
            _ => Self::ReadOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseVisibility {
    Closed = 0,
    Registered = 1,
    OpenPlatform = 2,
    OpenWorld = 3,
    Hidden = 4,
}

impl CourseVisibility {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Closed),
            1 => Some(Self::Registered),
            2 => Some(Self::OpenPlatform),
            3 => Some(Self::OpenWorld),
            4 => Some(Self::Hidden),
            _ => None,
        }
    }

    pub fn is_closed_or_hidden(self) -> bool {
        matches!(self, Self::Closed | Self::Hidden)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Admin defined ordering, stored as `{"field": ..., "order": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionOrderSetting {
    pub field: String,
    pub order: String,
}

/// Settings that drive the session list ordering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOrderSettings {
    pub show_all_sessions: bool,
    pub session_list_order: bool,
    pub admin_order: Option<SessionOrderSetting>,
}

impl SessionOrderSettings {
    pub async fn load(settings: &SettingsRepository) -> Result<Self> {
        let admin_order = match settings.get(SETTING_MY_COURSES_SESSION_ORDER).await? {
            Some(record) if !record.value.is_null() => {
                match serde_json::from_value::<SessionOrderSetting>(record.value) {
                    Ok(order) => Some(order),
                    Err(e) => {
                        warn!(error = %e, "Ignoring malformed session order setting");
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(Self {
            show_all_sessions: settings.get_flag(SETTING_SHOW_ALL_SESSIONS).await?,
            session_list_order: settings.get_flag(SETTING_SESSION_LIST_ORDER).await?,
            admin_order,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrder {
    CategoryAndName,
    AccessStartDate,
    Position,
    StartDate(SortDirection),
    EndDate(SortDirection),
}

impl SessionOrder {
    /// Later rules win: show-all, then manual position, then the admin setting
    pub fn resolve(settings: &SessionOrderSettings) -> Self {
        let mut order = Self::CategoryAndName;

        if settings.show_all_sessions {
            order = Self::AccessStartDate;
        }
        if settings.session_list_order {
            order = Self::Position;
        }

        if let Some(admin) = &settings.admin_order {
            match (admin.field.as_str(), SortDirection::parse(&admin.order)) {
                ("start_date", Some(dir)) => order = Self::StartDate(dir),
                ("end_date", Some(dir)) => order = Self::EndDate(dir),
                _ => debug!(field = %admin.field, order = %admin.order, "Unsupported session order setting"),
            }
        }

        order
    }

    /// ORDER BY clause over sessions `s` and categories `sc`
    pub fn to_sql(self) -> &'static str {
        match self {
            Self::CategoryAndName => "sc.name, s.name",
            Self::AccessStartDate => "s.access_start_date",
            Self::Position => "s.position",
            Self::StartDate(SortDirection::Asc) => "s.access_start_date ASC",
            Self::StartDate(SortDirection::Desc) => "s.access_start_date DESC",
            Self::EndDate(SortDirection::Asc) => {
                "CASE WHEN s.access_end_date IS NULL THEN 1 ELSE 0 END ASC, s.access_end_date ASC"
            }
            Self::EndDate(SortDirection::Desc) => "s.access_end_date DESC",
        }
    }
}

/// Session row plus everything the filter needs about one user
#[derive(Debug, Clone)]
pub struct SessionCandidate {
    pub session: SessionRecord,
    pub coach_ids: Vec<i64>,
    pub courses: Vec<SessionCourseRecord>,
    pub access: SessionAccessRecord,
}

/// Days a user has left in a duration based session.
///
/// The duration counts from the user's first access and includes any extra
/// days granted to them. A user who never entered gets the full duration.
pub fn days_left(session: &SessionRecord, access: &SessionAccessRecord, now: DateTime<Utc>) -> i64 {
    let duration = i64::from(session.duration) + i64::from(access.extra_duration);

    match access.first_access {
        None => duration,
        Some(first) => {
            let end = first + Duration::days(duration);
            let seconds = (end - now).num_seconds() as f64;
            (seconds / 86_400.0).round() as i64
        }
    }
}

/// Date based visibility of a session for one user.
///
/// For coaches the coach access dates are applied on top of the participant dates.
pub fn session_visibility(
    session: &SessionRecord,
    is_coach: bool,
    access: &SessionAccessRecord,
    now: DateTime<Utc>,
) -> SessionVisibility {
    let after_end = SessionVisibility::from_i32(session.visibility);

    if session.access_start_date.is_none() && session.access_end_date.is_none() {
        if session.duration <= 0 {
            return SessionVisibility::Available;
        }
        return match access.first_access {
            None => SessionVisibility::Available,
            Some(first) => {
                let days = i64::from(session.duration) + i64::from(access.extra_duration);
                if first + Duration::days(days) > now {
                    SessionVisibility::Available
                } else {
                    SessionVisibility::ReadOnly
                }
            }
        };
    }

    let mut visibility = match session.access_start_date {
        Some(start) if now <= start => SessionVisibility::Invisible,
        _ => SessionVisibility::Available,
    };

    if let Some(end) = session.access_end_date
        && visibility == SessionVisibility::Available
        && now >= end
    {
        visibility = after_end;
    }

    if is_coach {
        if let Some(start) = session.coach_access_start_date {
            visibility = if start < now {
                SessionVisibility::Available
            } else {
                SessionVisibility::Invisible
            };
        }
        if let Some(end) = session.coach_access_end_date
            && visibility == SessionVisibility::Available
            && end < now
        {
            visibility = after_end;
        }
    }

    visibility
}

/// Ids of the candidate sessions `user_id` may see, in candidate order
pub fn filter_visible_sessions(
    user_id: i64,
    candidates: &[SessionCandidate],
    now: DateTime<Utc>,
) -> Vec<i64> {
    let mut visible = Vec::new();

    for candidate in candidates {
        let session = &candidate.session;
        let is_general_coach = session.general_coach_id == Some(user_id);
        let is_course_coach = candidate.coach_ids.contains(&user_id);

        if !is_general_coach && !is_course_coach {
            if session.duration > 0 {
                if days_left(session, &candidate.access, now) <= 0 {
                    debug!(session_id = session.id, user_id, "Session duration used up");
                    continue;
                }
            } else if let Some(end) = session.access_end_date
                && end <= now
            {
                debug!(session_id = session.id, user_id, "Session access ended");
                continue;
            }
        }

        let mut visibility = session_visibility(
            session,
            is_general_coach || is_course_coach,
            &candidate.access,
            now,
        );

        if visibility != SessionVisibility::Visible {
            let mut open_course_visibility = None;
            for course in &candidate.courses {
                let course_visibility = session_visibility(
                    session,
                    is_general_coach || course.is_coach,
                    &candidate.access,
                    now,
                );
                let course_closed = CourseVisibility::from_i32(course.visibility)
                    .is_some_and(CourseVisibility::is_closed_or_hidden);

                if !course_closed && course_visibility != SessionVisibility::Invisible {
                    open_course_visibility = Some(course_visibility);
                }
            }

            if let Some(course_visibility) = open_course_visibility {
                visibility = course_visibility;
            }
        }

        if visibility == SessionVisibility::Invisible {
            debug!(session_id = session.id, user_id, "Session invisible");
            continue;
        }

        visible.push(session.id);
    }

    visible
}

/// Loads session candidates for a user and applies the visibility rules
#[derive(Clone)]
pub struct SessionVisibilityService {
    db: Database,
}

impl SessionVisibilityService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn find_user_sessions(
        &self,
        user_id: i64,
        access_url_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<i64>> {
        let order_settings = SessionOrderSettings::load(&self.db.settings()).await?;
        let order = SessionOrder::resolve(&order_settings);

        let sessions = self.db.sessions();
        let rows = sessions
            .list_for_user(user_id, access_url_id, order.to_sql())
            .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for session in rows {
            candidates.push(SessionCandidate {
                coach_ids: sessions.coach_ids(session.id).await?,
                courses: sessions.courses_for_user(session.id, user_id).await?,
                access: sessions.access(session.id, user_id).await?,
                session,
            });
        }

        let visible = filter_visible_sessions(user_id, &candidates, now);
        debug!(
            user_id,
            ?order,
            candidates = candidates.len(),
            visible = visible.len(),
            "Resolved user sessions"
        );
        Ok(visible)
    }
}
