use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use tabledef::config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use tabledef::monitoring::{self, MonitoringConfig};
use tabledef::server::TabledefServer;
use tabledef::{SchemaInput, SchemaNormalizer, TableDefinition};

#[derive(Parser)]
#[command(name = "tabledef")]
#[command(about = "Convert DBML schemas to normalized table definitions and back")]
#[command(version)]
#[command(long_about = "Tabledef parses DBML schema text into a normalized table definition (tables, columns, notes and relationships), renders table definitions back to DBML, and splits source and target schemas for comparison. It can run as an HTTP service or as a one-shot command.")]
#[command(after_help = "EXAMPLES:
    # Serve the HTTP API
    tabledef serve --host 0.0.0.0 --port 3200

    # Parse a DBML file into a table definition
    tabledef parse -i schema.dbml -o schema.json

    # Render a table definition back to DBML
    tabledef render -i schema.json

    # Split source and target schemas
    tabledef diff -s current.dbml -t proposed.dbml")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Set log level explicitly
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "TABLEDEF_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to listen on
        #[arg(long, env = "TABLEDEF_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Reject cross-origin requests
        #[arg(long)]
        no_cors: bool,
    },

    /// Parse a DBML (or table definition JSON) file into a table definition
    Parse {
        /// Schema file to parse
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Leave relationships out of the table definition
        #[arg(long)]
        no_refs: bool,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render a table definition JSON file as DBML
    Render {
        /// Table definition file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Split source and target schemas into separate table definitions
    Diff {
        /// Source schema file
        #[arg(short, long, value_name = "FILE")]
        source: PathBuf,

        /// Target schema file
        #[arg(short, long, value_name = "FILE")]
        target: Option<PathBuf>,

        /// Leave source relationships out of the table definition
        #[arg(long)]
        no_refs: bool,

        /// Write the result here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on CLI options
    initialize_logging(&cli)?;

    monitoring::initialize_monitoring(MonitoringConfig::default());

    info!("Starting tabledef v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port, no_cors } => {
            let config = ServerConfig {
                host,
                port,
                enable_cors: !no_cors,
            };
            TabledefServer::new(config)
                .run()
                .await
                .context("HTTP server failed")?;
        }
        Commands::Parse { input, no_refs, output } => {
            info!("Parsing schema from {:?}", input);
            let schema = SchemaInput::from_file(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let normalizer = SchemaNormalizer::new();
            match normalizer.parse_table_dbml(&schema, !no_refs) {
                Ok(definition) => {
                    let json = serde_json::to_string_pretty(&definition)?;
                    write_output(output.as_deref(), &json).await?;
                }
                Err(e) => {
                    eprintln!("Parse failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Render { input, output } => {
            info!("Rendering table definition from {:?}", input);
            let text = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let definition: TableDefinition = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a table definition", input.display()))?;

            let dbml = SchemaNormalizer::new().tabledef_to_dbml(&definition);
            write_output(output.as_deref(), &dbml).await?;
        }
        Commands::Diff { source, target, no_refs, output } => {
            info!("Splitting source {:?} and target {:?}", source, target);
            let source_input = SchemaInput::from_file(&source)
                .await
                .with_context(|| format!("Failed to read {}", source.display()))?;
            let target_input = match &target {
                Some(path) => Some(
                    SchemaInput::from_file(path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };

            let result = SchemaNormalizer::new().dbml_to_table_def(
                &source_input,
                target_input.as_ref(),
                !no_refs,
            );
            let json = serde_json::to_string_pretty(&result)?;
            write_output(output.as_deref(), &json).await?;
            if let Some(message) = result.error_message() {
                eprintln!("Diff failed: {}", message);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Write command output to a file, or stdout when no file is given
async fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Output written to {:?}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Initialize logging based on CLI configuration; `RUST_LOG` takes precedence when set
fn initialize_logging(cli: &Cli) -> Result<()> {
    let log_level = if let Some(level) = &cli.log_level {
        level.clone().into()
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(cli.verbose)
        .with_file(cli.verbose)
        .with_line_number(cli.verbose);

    if cli.json_logs {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    }

    Ok(())
}
