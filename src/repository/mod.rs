//! Repository layer for database persistence.

mod migrations_runner;
mod pool;
mod records;
mod research;

pub use migrations_runner::run_migrations;
pub use pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
pub use research::{
    ResearchRepository, RunDetail, RunTransition, SourceContentUpdate, StepCommit,
};

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
