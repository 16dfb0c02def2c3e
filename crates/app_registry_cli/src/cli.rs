//! CLI argument parsing and command dispatch.
//!
//! # Responsibility
//! - Parse request inputs and settings (flags with env fallbacks).
//! - Translate commands into `AppService` calls and print JSON responses.
//!
//! # Invariants
//! - Every command opens a fully migrated database before touching rows.
//! - Service errors are returned unchanged so `main` can map status codes.

use anyhow::{bail, Context, Result};
use app_registry_core::db::{open_db, open_db_in_memory};
use app_registry_core::{
    init_logging, App, AppDto, AppService, AppServiceError, AppServiceResult,
    DeletedAppIdPolicy, PageRequest, RegistryConfig, SqliteAppRepository,
};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;

/// Command-line transport for the application registry.
#[derive(Parser)]
#[command(name = "app-registry")]
#[command(version)]
#[command(about = "Create, inspect and retire application records")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Clone)]
pub struct GlobalOptions {
    /// SQLite database file. Omit to use a throwaway in-memory database.
    #[arg(long, env = "APP_REGISTRY_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, env = "APP_REGISTRY_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "APP_REGISTRY_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Keep identifiers of deleted apps out of circulation.
    #[arg(long, env = "APP_REGISTRY_RESERVE_DELETED_IDS", global = true)]
    pub reserve_deleted_ids: bool,

    /// Page size used by `find` when `--size` is omitted.
    #[arg(long, global = true)]
    pub default_page_size: Option<u32>,
}

impl GlobalOptions {
    pub fn to_config(&self) -> Result<RegistryConfig> {
        let defaults = RegistryConfig::default();
        let config = RegistryConfig {
            db_path: self.db.clone(),
            log_level: self.log_level.clone().unwrap_or(defaults.log_level),
            log_dir: self.log_dir.clone(),
            deleted_app_id_policy: if self.reserve_deleted_ids {
                DeletedAppIdPolicy::Reserved
            } else {
                DeletedAppIdPolicy::Reusable
            },
            default_page_size: self.default_page_size.unwrap_or(defaults.default_page_size),
            max_page_size: defaults.max_page_size,
        };
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a new app from an `AppDto` JSON body.
    Create {
        /// JSON body, e.g. '{"appId":"ordertest","name":"Order Test"}'.
        body: String,
    },
    /// Show one app.
    Get { app_id: String },
    /// Rewrite an app's mutable fields from an `App` JSON body.
    Update {
        app_id: String,
        /// JSON body whose `appId` must equal APP_ID.
        body: String,
    },
    /// Soft-delete an app.
    Delete {
        app_id: String,
        /// Identity recorded as the deleting actor.
        #[arg(long)]
        operator: String,
    },
    /// List apps, either one page or every app with a given name.
    Find {
        #[arg(long)]
        name: Option<String>,
        /// Zero-based page number.
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Check whether an app id is currently free.
    Unique { app_id: String },
    /// Print core health and version.
    Ping,
}

/// Outcome of one command.
pub enum Outcome {
    Printed,
    Failed(AppServiceError),
}

/// Runs one command, writing its JSON response to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<Outcome> {
    let config = cli.global.to_config()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    if matches!(cli.command, Command::Ping) {
        print_json(
            out,
            &json!({
                "ping": app_registry_core::ping(),
                "version": app_registry_core::core_version(),
            }),
        )?;
        return Ok(Outcome::Printed);
    }

    let conn = open_connection(&config)?;
    let repo = SqliteAppRepository::try_new(&conn)?.with_policy(config.deleted_app_id_policy);
    let service = AppService::with_config(repo, &config);

    let response = match dispatch(&service, &config, cli.command)? {
        Ok(response) => response,
        Err(err) => return Ok(Outcome::Failed(err)),
    };
    if let Some(value) = response {
        print_json(out, &value)?;
    }
    Ok(Outcome::Printed)
}

type Response = std::result::Result<Option<serde_json::Value>, AppServiceError>;

fn dispatch(
    service: &AppService<SqliteAppRepository<'_>>,
    config: &RegistryConfig,
    command: Command,
) -> Result<Response> {
    match command {
        Command::Create { body } => {
            let dto: AppDto = serde_json::from_str(&body).context("invalid AppDto JSON body")?;
            respond(service.create(&dto))
        }
        Command::Get { app_id } => respond(service.get(&app_id)),
        Command::Update { app_id, body } => {
            let app: App = serde_json::from_str(&body).context("invalid App JSON body")?;
            Ok(service.update(&app_id, &app).map(|()| None))
        }
        Command::Delete { app_id, operator } => {
            if operator.trim().is_empty() {
                bail!("--operator must not be empty");
            }
            Ok(service.delete(&app_id, &operator).map(|()| None))
        }
        Command::Find { name, page, size } => {
            let page = PageRequest::new(page, size.unwrap_or(config.default_page_size));
            respond(service.find(name.as_deref(), page))
        }
        Command::Unique { app_id } => respond(service.is_app_id_unique(&app_id)),
        Command::Ping => Ok(Ok(None)),
    }
}

fn respond<T: Serialize>(result: AppServiceResult<T>) -> Result<Response> {
    match result {
        Ok(value) => {
            let value = serde_json::to_value(value).context("failed to serialize response")?;
            Ok(Ok(Some(value)))
        }
        Err(err) => Ok(Err(err)),
    }
}

fn open_connection(config: &RegistryConfig) -> Result<Connection> {
    let conn = match &config.db_path {
        Some(path) => open_db(path)
            .with_context(|| format!("failed to open database `{}`", path.display()))?,
        None => open_db_in_memory().context("failed to open in-memory database")?,
    };
    Ok(conn)
}

fn print_json(out: &mut impl Write, value: &serde_json::Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    writeln!(out, "{rendered}").context("failed to write response")?;
    Ok(())
}
