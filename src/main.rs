use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tool_relay::config::{self, AppConfig, FileConfig};
use tool_relay::registry::ToolRegistry;
use tool_relay::relay::{ExecutionService, HttpExecutionService};
use tool_relay::server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the JSON file with the tool definitions.
    #[clap(long, value_parser = parse_path, default_value = "tools.json")]
    pub tools_file: PathBuf,

    /// The address to bind to.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the execution service running the tools.
    #[clap(long, default_value = "http://127.0.0.1:9000")]
    pub downstream_url: String,

    /// Timeout in seconds for a whole tool invocation, streamed output included.
    #[clap(long, default_value_t = 60)]
    pub downstream_timeout_sec: u64,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            host: args.host.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            tools_file: args.tools_file.clone(),
            downstream_url: args.downstream_url.clone(),
            downstream_timeout_sec: args.downstream_timeout_sec,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  tools_file: {:?}", app_config.tools_file);
    info!("  downstream_url: {}", app_config.downstream_url);
    info!(
        "  downstream_timeout_sec: {}",
        app_config.downstream_timeout_sec
    );

    let tool_registry = Arc::new(
        ToolRegistry::load(&app_config.tools_file).context("Cannot serve without tools")?,
    );

    let execution_service: Arc<dyn ExecutionService> = Arc::new(HttpExecutionService::new(
        app_config.downstream_url.clone(),
        app_config.downstream_timeout_sec,
    ));

    tokio::select! {
        result = run_server(app_config.server_config(), tool_registry, execution_service) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
