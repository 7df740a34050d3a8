pub mod config;
pub mod customer;
pub mod doctor;
pub mod migrate;

use std::future::Future;

use serde::Serialize;
use vatbook_core::config::{AppConfig, LoadOptions};
use vatbook_core::domain::customer::CustomerRecord;
use vatbook_core::errors::ApplicationError;
use vatbook_db::{connect_with_settings, DbPool};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<CustomerRecord>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::ok(command, message.into(), None)
    }

    pub fn customer(command: &str, message: impl Into<String>, customer: CustomerRecord) -> Self {
        Self::ok(command, message.into(), Some(customer))
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            customer: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn ok(command: &str, message: String, customer: Option<CustomerRecord>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message,
            customer,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads config, opens the pool on a current-thread runtime and runs `operation`.
///
/// Failures at any stage are rendered with the `ApplicationError` class and exit code.
pub(crate) fn with_pool<F, Fut>(
    command: &str,
    options: LoadOptions,
    operation: F,
) -> CommandResult
where
    F: FnOnce(DbPool) -> Fut,
    Fut: Future<Output = Result<CommandResult, ApplicationError>>,
{
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return application_failure(
                command,
                ApplicationError::Configuration(error.to_string()),
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return application_failure(
                    command,
                    ApplicationError::Connectivity(error.to_string()),
                );
            }
        };

        let outcome = operation(pool.clone()).await;
        pool.close().await;

        outcome.unwrap_or_else(|error| application_failure(command, error))
    })
}

fn application_failure(command: &str, error: ApplicationError) -> CommandResult {
    tracing::warn!(
        event_name = "cli.command.failed",
        command,
        error_class = error.error_class(),
        error = %error,
        "command failed"
    );
    CommandResult::failure(command, error.error_class(), error.to_string(), error.exit_code())
}
