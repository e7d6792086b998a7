//! # dbsink
//!
//! Command-line front end: print the DDL or INSERT a configuration produces,
//! or run a SQLite demo through the tracing layer.

#![deny(unsafe_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dbsink_core::{LogEvent, LogLevel, PropertyValue};
use dbsink_settings::{SinkSettings, load_settings_from_env, load_settings_from_path};
use dbsink_sql::{Dialect, Extractor, Schema, build_create_table, build_insert};
use dbsink_writer::{
    BatchOptions, BatchSink, DbSinkLayer, PoolConfig, SqliteConnectionFactory, spawn_flush_task,
};
use tracing::info;

/// Persist structured log events into SQL tables.
#[derive(Parser, Debug)]
#[command(name = "dbsink", about = "Persist structured log events into SQL tables")]
struct Cli {
    /// Settings file (JSON). Missing keys fall back to defaults.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log filter for stderr output (`RUST_LOG` wins).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the CREATE TABLE statement.
    Ddl {
        /// Dialect, overriding the settings.
        #[arg(long)]
        dialect: Option<Dialect>,
    },
    /// Print the INSERT and parameters for one event.
    Insert {
        /// Dialect, overriding the settings.
        #[arg(long)]
        dialect: Option<Dialect>,
        /// Message template.
        #[arg(long)]
        message: String,
        /// Event property as `NAME=VALUE`; repeatable.
        #[arg(long = "property", value_parser = parse_property)]
        properties: Vec<(String, PropertyValue)>,
    },
    /// Provision a SQLite table and write events through the tracing layer.
    Demo {
        /// SQLite database file.
        #[arg(long)]
        database: Option<PathBuf>,
        /// Number of events to write.
        #[arg(long, default_value = "10")]
        count: usize,
    },
}

fn load_settings(path: Option<&Path>) -> Result<SinkSettings> {
    match path {
        Some(path) => load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(load_settings_from_env()),
    }
}

/// `NAME=VALUE`; the value is read as an integer, float or boolean when it
/// parses as one, else as text.
fn parse_property(raw: &str) -> std::result::Result<(String, PropertyValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("property name is empty".to_string());
    }
    let value = if let Ok(n) = value.parse::<i64>() {
        PropertyValue::from(n)
    } else if let Ok(f) = value.parse::<f64>() {
        PropertyValue::from(f)
    } else if let Ok(b) = value.parse::<bool>() {
        PropertyValue::from(b)
    } else {
        PropertyValue::from(value)
    };
    Ok((name.to_string(), value))
}

fn resolve_dialect(flag: Option<Dialect>, settings: &SinkSettings) -> Result<Dialect> {
    match flag {
        Some(dialect) => Ok(dialect),
        None => settings.dialect().context("Invalid dialect in settings"),
    }
}

fn ddl(settings: &SinkSettings, dialect: Dialect) -> Result<String> {
    let schema = Schema::build(&settings.to_sink_options()?)?;
    Ok(build_create_table(&dialect.strategy(), &schema)?)
}

fn insert(
    settings: &SinkSettings,
    dialect: Dialect,
    message: &str,
    properties: Vec<(String, PropertyValue)>,
) -> Result<String> {
    let schema = Schema::build(&settings.to_sink_options()?)?;
    let mut event = LogEvent::now(LogLevel::Information, message);
    for (name, value) in properties {
        event = event.with_property(name, value);
    }
    let row = Extractor::new(&schema).extract(&event);
    let stmt = build_insert(&dialect.strategy(), &schema, &row);

    let mut out = stmt.sql;
    for (name, value) in &stmt.parameters {
        let _ = write!(out, "\n  {name} = {value}");
    }
    Ok(out)
}

async fn demo(settings: &SinkSettings, database: &Path, count: usize, log_level: &str) -> Result<()> {
    let options = settings.to_sink_options()?;
    let factory = SqliteConnectionFactory::pool_file(database, &PoolConfig::default())
        .with_context(|| format!("Failed to open {}", database.display()))?;
    let batch = BatchOptions {
        batch_posting_limit: settings.batch_posting_limit,
        period: settings.period(),
    };
    let sink = BatchSink::new(&options, Dialect::Sqlite.strategy(), factory, batch)
        .context("Failed to create batch sink")?;
    let layer = DbSinkLayer::new(sink).with_min_level(settings.minimum_level()?);
    let handle = layer.handle();
    dbsink_core::logging::init_subscriber_with_layer(log_level, layer);
    let flush_task = spawn_flush_task(handle.clone(), settings.period());

    for i in 0..count {
        info!(iteration = i, total = count, "demo event {{iteration}} of {{total}}");
    }
    handle.flush();
    flush_task.abort();
    println!("wrote {count} events to {}", database.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = load_settings(args.settings.as_deref())?;

    match args.command {
        Command::Ddl { dialect } => {
            dbsink_core::logging::init_subscriber(&args.log_level);
            let dialect = resolve_dialect(dialect, &settings)?;
            println!("{}", ddl(&settings, dialect)?);
        }
        Command::Insert {
            dialect,
            message,
            properties,
        } => {
            dbsink_core::logging::init_subscriber(&args.log_level);
            let dialect = resolve_dialect(dialect, &settings)?;
            println!("{}", insert(&settings, dialect, &message, properties)?);
        }
        Command::Demo { database, count } => {
            let Some(database) = database.or_else(|| settings.database_path()) else {
                bail!("no database: pass --database or set DBSINK_DATABASE");
            };
            demo(&settings, &database, count, &args.log_level).await?;
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_ddl_with_dialect() {
        let cli = Cli::parse_from(["dbsink", "ddl", "--dialect", "sqlite"]);
        assert!(matches!(cli.command, Command::Ddl { dialect: Some(Dialect::Sqlite) }));
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn cli_parses_repeated_properties() {
        let cli = Cli::parse_from([
            "dbsink", "insert", "--message", "hi {Age}", "--property", "Age=30", "--property",
            "Name=ada",
        ]);
        let Command::Insert { properties, .. } = cli.command else {
            panic!("expected insert");
        };
        assert_eq!(properties[0], ("Age".to_string(), PropertyValue::from(30_i64)));
        assert_eq!(properties[1], ("Name".to_string(), PropertyValue::from("ada")));
    }

    #[test]
    fn property_parsing() {
        assert_eq!(parse_property("x=1.5").unwrap().1, PropertyValue::from(1.5));
        assert_eq!(parse_property("x=true").unwrap().1, PropertyValue::from(true));
        assert!(parse_property("novalue").is_err());
        assert!(parse_property("=1").is_err());
    }

    #[test]
    fn ddl_for_sqlite() {
        let sql = ddl(&SinkSettings::default(), Dialect::Sqlite).unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS [Logs]"));
    }

    #[test]
    fn ddl_unsupported_for_oracle() {
        assert!(ddl(&SinkSettings::default(), Dialect::Oracle).is_err());
    }

    #[test]
    fn insert_lists_parameters() {
        let out = insert(
            &SinkSettings::default(),
            Dialect::SqlServer,
            "hello",
            vec![("Age".into(), PropertyValue::from(30_i64))],
        )
        .unwrap();
        assert!(out.starts_with("INSERT INTO [dbo].[Logs]"));
        assert!(out.contains("@p0 = \"hello\""));
    }
}
