//! msaccess-pg-migrate CLI - MS Access to PostgreSQL schema capture and migration.
//!
//! Works from a YAML configuration file and a previously captured catalog
//! store; structure capture itself needs the introspection driver and is
//! invoked through the library API.

use clap::{Parser, Subcommand};
use msaccess_pg_migrate::config::artifacts;
use msaccess_pg_migrate::{ddl, resolver, Config, MigrateError, RunLog, SchemaCatalog};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "msaccess-pg-migrate")]
#[command(about = "MS Access to PostgreSQL schema capture and migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configuration file and referenced paths
    Validate,

    /// Generate the DDL script from the captured catalog
    Ddl {
        /// Print the script to stdout instead of writing the output file
        #[arg(long)]
        stdout: bool,

        /// Override target schema
        #[arg(long)]
        target_schema: Option<String>,
    },

    /// Print the resolved table load order
    Order,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Validate => {
            if cli.output_json {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "ok",
                        "source_db": config.source_db,
                        "catalog": config.catalog_path(),
                        "output_dir": config.output_dir,
                    })
                );
            } else {
                println!("Configuration OK");
                println!("  Source: {}", config.source_db.display());
                println!("  Catalog: {}", config.catalog_path().display());
                println!("  Output: {}", config.output_dir.display());
            }
        }

        Commands::Ddl {
            stdout,
            target_schema,
        } => {
            if let Some(schema) = target_schema {
                config.schema_name = schema;
                config.validate()?;
            }

            let catalog = SchemaCatalog::open(config.catalog_path())?;
            let mut log = RunLog::new();
            let sql = ddl::emit_schema(&catalog, &config.schema_name, &mut log)?;
            log.flush(config.artifact_path(artifacts::APP_LOG))?;

            if stdout {
                print!("{}", sql);
            } else {
                let path = config.artifact_path(artifacts::CREATE_TABLES);
                std::fs::write(&path, &sql)?;
                if cli.output_json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "ddl_file": path,
                            "diagnostics": log.entries().len(),
                        })
                    );
                } else {
                    println!("Wrote {}", path.display());
                    if !log.is_empty() {
                        println!("  {} diagnostics in app.log", log.entries().len());
                    }
                }
            }
        }

        Commands::Order => {
            let catalog = SchemaCatalog::open(config.catalog_path())?;
            let order = resolver::load_order(&catalog)?;
            let names: Vec<String> = order
                .tables
                .iter()
                .map(|t| msaccess_pg_migrate::ident::normalize(t))
                .collect();

            let path = config.artifact_path(artifacts::TABLES_NAMES);
            msaccess_pg_migrate::export::write_table_names(&order.tables, &path)?;

            if cli.output_json {
                println!("{}", serde_json::json!({ "load_order": names }));
            } else {
                for name in &names {
                    println!("{}", name);
                }
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
