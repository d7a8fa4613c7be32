use adherence_export::config::Config;
use adherence_export::cxone::CxoneClient;
use adherence_export::error::INTERNAL_ERROR;
use adherence_export::event::ExportEvent;
use adherence_export::executor::{handle, Executor};
use adherence_export::metrics::MetricsWriter;
use adherence_export::secrets::AwsSecretStore;
use adherence_export::storage::S3ArtifactStore;
use adherence_export::warehouse::SnowflakeWarehouse;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

/// Export a WFM adherence report from the data lake
#[derive(Parser)]
#[command(name = "adherence-export")]
#[command(about = "Export WFM adherence reports from Snowflake to S3", long_about = None)]
struct Cli {
    /// Invocation event JSON; reads stdin when omitted
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration is read once here; the DEBUG flag raises the base log
    // level the same way the verbosity flag does.
    let config = Config::from_env();
    let debug = config.as_ref().map(|c| c.debug).unwrap_or(false);

    let log_level = match cli.verbose {
        0 if debug => "debug",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    if debug {
        debug!("debug diagnostics enabled");
    }

    let result = match config {
        Ok(config) => run(&cli, config).await,
        Err(e) => {
            error!("failed to load configuration: {e}");
            Err(e.outcome().to_string())
        }
    };

    if let Err(outcome) = result {
        eprintln!("{outcome}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, config: Config) -> Result<(), String> {
    let event = read_event(cli).map_err(|e| {
        error!("failed to read event: {e}");
        INTERNAL_ERROR.to_string()
    })?;
    debug!("event parsed");

    let api = CxoneClient::new(&config).map_err(|e| {
        error!("failed to build API client: {e}");
        e.outcome().to_string()
    })?;
    let warehouse = SnowflakeWarehouse::new().map_err(|e| {
        error!("failed to build warehouse client: {e}");
        e.outcome().to_string()
    })?;

    let sdk_config = aws_config::load_from_env().await;
    let executor = Executor::new(
        config,
        Arc::new(api),
        Arc::new(warehouse),
        Arc::new(AwsSecretStore::new(&sdk_config)),
        Arc::new(S3ArtifactStore::new(&sdk_config)),
        Arc::new(MetricsWriter::new()),
    );

    match handle(&executor, &event).await {
        Ok(response) => {
            let payload = serde_json::to_string(&response)
                .map_err(|_| INTERNAL_ERROR.to_string())?;
            println!("{payload}");
            Ok(())
        }
        Err(outcome) => Err(outcome.to_string()),
    }
}

fn read_event(cli: &Cli) -> anyhow::Result<ExportEvent> {
    let raw = match &cli.event {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&raw)?)
}
