//! Pre-seed data for initial database setup.
//!
//! Runs after table creation to insert default rows for app_settings.
//! Uses INSERT OR IGNORE so re-runs are idempotent (existing rows are preserved).

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::sqlite_helpers::now_iso8601;

/// Result of running seed operations.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub tables_seeded: Vec<String>,
    pub errors: Vec<String>,
}

/// Seed default platform settings (display, session list ordering).
async fn seed_app_settings(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    #[derive(Debug)]
    struct SettingRow {
        key: &'static str,
        value: &'static str,
        description: &'static str,
        category: &'static str,
    }

    let rows: &[SettingRow] = &[
        // Display
        SettingRow {
            key: "display.show_email_addresses",
            value: "\"false\"",
            description: "Show user e-mail addresses to other users",
            category: "display",
        },
        // Session list
        SettingRow {
            key: "session.session_list_order",
            value: "false",
            description: "Order the session list by the manually set session position",
            category: "session",
        },
        SettingRow {
            key: "session.show_all_sessions_on_my_course_page",
            value: "false",
            description: "Order the session list by access start date",
            category: "session",
        },
        SettingRow {
            key: "session.my_courses_session_order",
            value: "null",
            description: "Admin defined session ordering: {\"field\": \"start_date\"|\"end_date\", \"order\": \"asc\"|\"desc\"}",
            category: "session",
        },
    ];

    let now = now_iso8601();
    let mut inserted = 0u64;
    for row in rows {
        let r = sqlx::query(
            r#"INSERT OR IGNORE INTO app_settings (key, value, category, description, updated_at) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(row.key)
        .bind(row.value)
        .bind(row.category)
        .bind(row.description)
        .bind(&now)
        .execute(pool)
        .await?;

        if r.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Run all seed routines. Safe to call multiple times (uses INSERT OR IGNORE).
pub async fn run_seeds(pool: &SqlitePool) -> SeedResult {
    let mut result = SeedResult::default();

    for (table, count) in [("app_settings", seed_app_settings(pool).await)] {
        match count {
            Ok(n) => {
                if n > 0 {
                    debug!(table = table, count = n, "Seeded table");
                    result.tables_seeded.push(format!("{} ({} rows)", table, n));
                }
            }
            Err(e) => {
                let msg = format!("Seed {}: {}", table, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
    }

    if !result.tables_seeded.is_empty() {
        info!(tables = ?result.tables_seeded, "Pre-seed data applied");
    }

    result
}
