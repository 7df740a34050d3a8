pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vatbook_core::config::{ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "vatbook",
    about = "Vatbook customer gateway CLI",
    long_about = "Apply migrations, inspect configuration, and insert or look up customers by VAT number.",
    after_help = "Examples:\n  vatbook migrate\n  vatbook --database-url sqlite://customers.db?mode=rwc customer find --vat 123456789\n  vatbook customer insert --vat 123456789 --denomination \"Acme Ltd\" --email a@acme.test"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Read configuration from this TOML file (it must exist)"
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "URL", help = "Override database.url")]
    database_url: Option<String>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override logging.level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity and Customer schema presence")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Insert or look up customer rows")]
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
}

#[derive(Debug, Subcommand)]
enum CustomerAction {
    #[command(about = "Insert a customer and print it with its generated id")]
    Insert {
        #[arg(long, allow_negative_numbers = true)]
        vat: i32,
        #[arg(long)]
        denomination: String,
        #[arg(long)]
        email: String,
    },
    #[command(about = "Find a customer by VAT number")]
    Find {
        #[arg(long, allow_negative_numbers = true)]
        vat: i32,
    },
}

impl Cli {
    /// Config loading options derived from the global flags.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
            },
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let options = cli.load_options();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json),
        Command::Customer { action } => match action {
            CustomerAction::Insert { vat, denomination, email } => {
                commands::customer::insert(options, vat, denomination, email)
            }
            CustomerAction::Find { vat } => commands::customer::find(options, vat),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::Cli;

    #[test]
    fn global_flags_feed_load_options() {
        let cli = Cli::try_parse_from([
            "vatbook",
            "customer",
            "find",
            "--vat",
            "123456789",
            "--config",
            "custom.toml",
            "--database-url",
            "sqlite::memory:",
            "--log-level",
            "debug",
        ])
        .expect("parse");

        let options = cli.load_options();
        assert_eq!(options.config_path, Some(PathBuf::from("custom.toml")));
        assert!(options.require_file);
        assert_eq!(options.overrides.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(options.overrides.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn absent_flags_leave_default_discovery() {
        let cli = Cli::try_parse_from(["vatbook", "migrate"]).expect("parse");

        let options = cli.load_options();
        assert_eq!(options.config_path, None);
        assert!(!options.require_file);
        assert!(options.overrides.database_url.is_none());
    }

    #[test]
    fn negative_vat_is_accepted() {
        let cli =
            Cli::try_parse_from(["vatbook", "customer", "find", "--vat", "-42"]).expect("parse");

        assert!(format!("{cli:?}").contains("vat: -42"));
    }
}
