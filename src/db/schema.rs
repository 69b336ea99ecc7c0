//! Static table definitions
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS`, so running the
//! statements against an existing database is a no-op. Column renames and
//! type changes are not handled here.

use sqlx::SqlitePool;
use tracing::debug;

/// Ordered DDL statements; referenced tables come before the tables pointing at them.
/// A link target (course, session, group, user, user group) is unique per node.
pub const STATEMENTS: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            firstname TEXT NOT NULL DEFAULT '',
            lastname TEXT NOT NULL DEFAULT '',
            email TEXT,
            role TEXT NOT NULL DEFAULT 'ROLE_STUDENT',
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "app_settings",
        r#"
        CREATE TABLE IF NOT EXISTS app_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'general',
            description TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "courses",
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            visibility INTEGER NOT NULL DEFAULT 2
        )
        "#,
    ),
    (
        "course_rel_user",
        r#"
        CREATE TABLE IF NOT EXISTS course_rel_user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status INTEGER NOT NULL DEFAULT 5,
            relation_type INTEGER NOT NULL DEFAULT 0,
            sort INTEGER NOT NULL DEFAULT 0,
            UNIQUE (course_id, user_id, relation_type)
        )
        "#,
    ),
    (
        "course_groups",
        r#"
        CREATE TABLE IF NOT EXISTS course_groups (
            iid INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        )
        "#,
    ),
    (
        "session_categories",
        r#"
        CREATE TABLE IF NOT EXISTS session_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#,
    ),
    (
        "sessions",
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category_id INTEGER REFERENCES session_categories(id) ON DELETE SET NULL,
            access_start_date TEXT,
            access_end_date TEXT,
            coach_access_start_date TEXT,
            coach_access_end_date TEXT,
            duration INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0,
            visibility INTEGER NOT NULL DEFAULT 1,
            general_coach_id INTEGER REFERENCES users(id) ON DELETE SET NULL
        )
        "#,
    ),
    (
        "session_rel_course",
        r#"
        CREATE TABLE IF NOT EXISTS session_rel_course (
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (session_id, course_id)
        )
        "#,
    ),
    (
        "session_rel_course_rel_user",
        r#"
        CREATE TABLE IF NOT EXISTS session_rel_course_rel_user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status INTEGER NOT NULL DEFAULT 0,
            UNIQUE (session_id, course_id, user_id, status)
        )
        "#,
    ),
    (
        "session_rel_user",
        r#"
        CREATE TABLE IF NOT EXISTS session_rel_user (
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            relation_type INTEGER NOT NULL DEFAULT 0,
            duration INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (session_id, user_id, relation_type)
        )
        "#,
    ),
    (
        "course_access",
        r#"
        CREATE TABLE IF NOT EXISTS course_access (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            session_id INTEGER REFERENCES sessions(id) ON DELETE CASCADE,
            login_course_date TEXT NOT NULL
        )
        "#,
    ),
    (
        "access_url_rel_user",
        r#"
        CREATE TABLE IF NOT EXISTS access_url_rel_user (
            access_url_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY (access_url_id, user_id)
        )
        "#,
    ),
    (
        "access_url_rel_course",
        r#"
        CREATE TABLE IF NOT EXISTS access_url_rel_course (
            access_url_id INTEGER NOT NULL,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            PRIMARY KEY (access_url_id, course_id)
        )
        "#,
    ),
    (
        "access_url_rel_session",
        r#"
        CREATE TABLE IF NOT EXISTS access_url_rel_session (
            access_url_id INTEGER NOT NULL,
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            PRIMARY KEY (access_url_id, session_id)
        )
        "#,
    ),
    (
        "messages",
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            receiver_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            status INTEGER NOT NULL DEFAULT 1,
            send_date TEXT NOT NULL
        )
        "#,
    ),
    (
        "resource_nodes",
        r#"
        CREATE TABLE IF NOT EXISTS resource_nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            creator_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            parent_id INTEGER REFERENCES resource_nodes(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "resource_links",
        r#"
        CREATE TABLE IF NOT EXISTS resource_links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resource_node_id INTEGER NOT NULL REFERENCES resource_nodes(id) ON DELETE CASCADE,
            course_id INTEGER REFERENCES courses(id) ON DELETE CASCADE,
            session_id INTEGER REFERENCES sessions(id) ON DELETE CASCADE,
            group_id INTEGER REFERENCES course_groups(iid) ON DELETE CASCADE,
            user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
            user_group_id INTEGER,
            visibility INTEGER NOT NULL DEFAULT 2,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "resource_links_target",
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_resource_links_target ON resource_links (
            resource_node_id,
            IFNULL(course_id, 0),
            IFNULL(session_id, 0),
            IFNULL(group_id, 0),
            IFNULL(user_id, 0),
            IFNULL(user_group_id, 0)
        )
        "#,
    ),
    (
        "resource_rights",
        r#"
        CREATE TABLE IF NOT EXISTS resource_rights (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            resource_link_id INTEGER NOT NULL REFERENCES resource_links(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            mask INTEGER NOT NULL
        )
        "#,
    ),
    (
        "documents",
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            iid INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            filetype TEXT NOT NULL DEFAULT 'file',
            comment TEXT,
            resource_node_id INTEGER UNIQUE REFERENCES resource_nodes(id) ON DELETE CASCADE
        )
        "#,
    ),
];

/// Create every table that does not exist yet
pub async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for (table, ddl) in STATEMENTS {
        debug!(table = table, "Ensuring table exists");
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
