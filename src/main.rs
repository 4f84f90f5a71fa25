//! HTTP Mock Adapter - CLI Entry Point
//!
//! Validates a mock file, or loads it and dry-runs one request through the
//! mock dispatch engine.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use http_mock_adapter::{MockFile, Mode, OutgoingRequest};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "http-mock-adapter",
    about = "Request-mocking adapter for HTTP clients - dry-run requests against a mock file",
    version
)]
struct Args {
    /// Path to mock file
    #[arg(short, long, default_value = "mock-routes.yaml")]
    config: PathBuf,

    /// Diagnostics mode (defaults to HTTP_MOCK_ENV)
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print an example mock file and exit
    #[arg(long)]
    print_config: bool,

    /// Validate mock file and exit
    #[arg(long)]
    validate: bool,

    /// Request method for a dry run
    method: Option<String>,

    /// Request URL for a dry run
    url: Option<String>,

    /// Base URL the request URL is relative to
    #[arg(long)]
    base_url: Option<String>,

    /// Request payload
    #[arg(short, long)]
    data: Option<String>,

    /// Explicit query parameter (repeatable)
    #[arg(short, long, value_name = "KEY=VALUE")]
    query: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Development,
    Production,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Development => Mode::Development,
            ModeArg::Production => Mode::Production,
        }
    }
}

fn build_request(args: &Args, method: &str, url: &str) -> Result<OutgoingRequest> {
    let mut request = OutgoingRequest::new(method, url);
    if let Some(base_url) = &args.base_url {
        request = request.with_base_url(base_url.as_str());
    }
    if let Some(data) = &args.data {
        request = request.with_data(data.as_str());
    }
    for pair in &args.query {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid query parameter (expected KEY=VALUE): {}", pair))?;
        request = request.with_param(key, value);
    }
    Ok(request)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let default_config = include_str!("../demos/default-routes.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    // Load mock file
    let file = if args.config.exists() {
        info!(path = ?args.config, "Loading mock file");
        MockFile::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Mock file not found: {:?}", args.config);
    } else {
        info!("Using empty mock file (no routes)");
        MockFile::default()
    };

    if args.validate {
        file.validate()?;
        let routes = file
            .route_definitions()
            .and_then(|routes| routes.ok())
            .map_or(0, |routes| routes.len());
        println!("Mock file is valid ({} routes defined)", routes);
        return Ok(());
    }

    let (Some(method), Some(url)) = (args.method.as_deref(), args.url.as_deref()) else {
        anyhow::bail!("A METHOD and URL are required for a dry run");
    };

    let request = build_request(&args, method, url)?;
    let mode = args.mode.map(Mode::from).unwrap_or_else(Mode::from_env);
    let mocker = file.into_mocker(mode)?;

    let response = mocker.handle(request).await?;
    let output = serde_json::json!({
        "status": response.status,
        "statusText": response.status_text,
        "headers": response.headers,
        "data": response.data,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
