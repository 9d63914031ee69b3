use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use proxy_console::config::loader;
use proxy_console::config::manager::ConfigManager;
use proxy_console::config::model::AdhocQuery;
use proxy_console::config::store::SourceFile;
use proxy_console::{ConfigError, Configuration, LookupError};

// Exit codes: 1 for failed lookups, 2 for an unreadable or invalid
// configuration (the fatal-at-startup case).
const EXIT_LOOKUP: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[derive(Parser)]
#[command(name = "console-cli")]
#[command(about = "Management CLI for the proxy console configuration", long_about = None)]
struct Cli {
    /// Path of the YAML configuration file.
    #[arg(short, long, default_value = "config/config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Check,
    /// Validate a candidate file and install it, backing up the old source
    Apply { candidate: PathBuf },
    /// List servers with their effective policy
    Servers,
    /// Print the connection parameters of one server
    Dsn { server: String },
    /// Print the effective hidden-table set of one server
    Tables { server: String },
    /// List the ad-hoc queries of one category
    Queries { category: String },
    /// List the dashboard report queries
    Report,
}

#[derive(Serialize)]
struct ServerSummary<'a> {
    name: &'a str,
    host: &'a str,
    port: u16,
    read_only: bool,
    default: bool,
}

#[derive(Serialize)]
struct QuerySummary<'a> {
    title: &'a str,
    info: Option<&'a str>,
    sql: &'a str,
    variables: Vec<&'a str>,
}

#[derive(Serialize)]
struct TablesSummary<'a> {
    server: &'a str,
    hidden_tables: &'a BTreeSet<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxy_console=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run(cli: Cli) -> Result<(), u8> {
    match cli.command {
        Commands::Check => {
            let config = loader::load_file(&cli.config).map_err(config_error)?;
            println!(
                "configuration OK: {} servers, {} categories",
                config.servers.len(),
                config.categories.len()
            );
        }
        Commands::Apply { candidate } => {
            let text = std::fs::read_to_string(&candidate).map_err(|e| {
                eprintln!("cannot read candidate: {}", e);
                EXIT_CONFIG
            })?;
            let source = SourceFile::new(&cli.config);
            source.save(&text).map_err(config_error)?;
            println!(
                "configuration replaced; previous source at {}",
                source.backup_path().display()
            );
        }
        Commands::Servers => {
            let config = open(&cli.config)?;
            let summaries: Vec<ServerSummary> = config
                .servers
                .iter()
                .map(|server| ServerSummary {
                    name: &server.name,
                    host: &server.dsn.host,
                    port: server.dsn.port,
                    read_only: server.read_only.unwrap_or(config.global.read_only),
                    default: server.name == config.global.default_server,
                })
                .collect();
            print_json(&summaries);
        }
        Commands::Dsn { server } => {
            let config = open(&cli.config)?;
            let dsn = config.resolve_dsn(&server).map_err(lookup_error)?;
            print_json(dsn);
        }
        Commands::Tables { server } => {
            let config = open(&cli.config)?;
            let hidden_tables = config.hidden_tables(&server).map_err(lookup_error)?;
            print_json(&TablesSummary {
                server: &server,
                hidden_tables: &hidden_tables,
            });
        }
        Commands::Queries { category } => {
            let config = open(&cli.config)?;
            let queries = config.adhoc_queries(&category).map_err(lookup_error)?;
            print_json(&summarize(queries));
        }
        Commands::Report => {
            let config = open(&cli.config)?;
            print_json(&summarize(config.report_queries()));
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<Arc<Configuration>, u8> {
    let manager = ConfigManager::open(path).map_err(config_error)?;
    Ok(manager.current())
}

fn summarize(queries: &[AdhocQuery]) -> Vec<QuerySummary<'_>> {
    queries
        .iter()
        .map(|query| QuerySummary {
            title: &query.title,
            info: query.info.as_deref(),
            sql: &query.sql,
            variables: query.variables.keys().map(String::as_str).collect(),
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("cannot render output: {}", e),
    }
}

fn config_error(e: ConfigError) -> u8 {
    eprintln!("{}", e);
    EXIT_CONFIG
}

fn lookup_error(e: LookupError) -> u8 {
    eprintln!("{}", e);
    EXIT_LOOKUP
}
