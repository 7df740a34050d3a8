use crate::commands::{with_pool, CommandResult};
use vatbook_core::config::LoadOptions;
use vatbook_core::errors::ApplicationError;
use vatbook_db::migrations;

pub fn run(options: LoadOptions) -> CommandResult {
    with_pool("migrate", options, |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ApplicationError::Migration(error.to_string()))?;

        tracing::info!(event_name = "cli.migrate.applied", "applied pending migrations");
        Ok(CommandResult::success("migrate", "applied pending migrations"))
    })
}
