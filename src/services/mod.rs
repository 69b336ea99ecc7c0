//! Request-scoped domain services

pub mod session_visibility;

pub use session_visibility::{
    SessionOrder, SessionOrderSettings, SessionVisibility, SessionVisibilityService,
    filter_visible_sessions,
};
