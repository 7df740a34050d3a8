use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;
use crate::commands::CommandResult;
use vatbook_core::config::{resolve_config_path, AppConfig, LoadOptions};
use vatbook_core::errors::ApplicationError;

pub fn run(options: LoadOptions) -> CommandResult {
    let database_url_override = options.overrides.database_url.is_some();
    let log_level_override = options.overrides.log_level.is_some();
    let config_file_path = resolve_config_path(options.config_path.as_deref());

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            let error = ApplicationError::Configuration(error.to_string());
            return CommandResult {
                exit_code: error.exit_code(),
                output: format!("config validation failed: {error}"),
            };
        }
    };

    let file = ConfigFile {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path,
    };

    let lines = [
        "effective config (source precedence: flag > env > file > default):".to_string(),
        render_line(
            "database.url",
            &config.database.url,
            flag_or(database_url_override, "--database-url", || {
                file.source("database.url", &["VATBOOK_DATABASE_URL"])
            }),
        ),
        render_line(
            "database.max_connections",
            &config.database.max_connections.to_string(),
            file.source("database.max_connections", &["VATBOOK_DATABASE_MAX_CONNECTIONS"]),
        ),
        render_line(
            "database.timeout_secs",
            &config.database.timeout_secs.to_string(),
            file.source("database.timeout_secs", &["VATBOOK_DATABASE_TIMEOUT_SECS"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            flag_or(log_level_override, "--log-level", || {
                file.source("logging.level", &["VATBOOK_LOGGING_LEVEL", "VATBOOK_LOG_LEVEL"])
            }),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            file.source("logging.format", &["VATBOOK_LOGGING_FORMAT", "VATBOOK_LOG_FORMAT"]),
        ),
    ];

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn flag_or(overridden: bool, flag: &str, fallback: impl FnOnce() -> String) -> String {
    if overridden {
        format!("flag ({flag})")
    } else {
        fallback()
    }
}

struct ConfigFile {
    doc: Option<Value>,
    path: Option<PathBuf>,
}

impl ConfigFile {
    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        field_source(key_path, env_keys, self.doc.as_ref(), self.path.as_deref())
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
