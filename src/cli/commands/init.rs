//! Database initialization command.

use console::style;

use crate::config::Settings;
use crate::repository::run_migrations;

/// Create the database and apply pending migrations.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    println!(
        "{} Initializing database at {}",
        style("→").cyan(),
        settings.database_url
    );

    match run_migrations(&settings.database_url).await {
        Ok(()) => {
            println!("  {} Database ready", style("✓").green());
            Ok(())
        }
        Err(e) => {
            eprintln!("  {} Migration failed: {}", style("✗").red(), e);
            Err(anyhow::anyhow!("Database migration failed: {}", e))
        }
    }
}
