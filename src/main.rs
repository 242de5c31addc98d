use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wallet_pnl::analysis::{demo_analysis, WalletAnalyzer};
use wallet_pnl::chain::{EndpointPool, RetryingFetcher, SolanaLedgerClient};
use wallet_pnl::config::{Config, LoggingConfig};
use wallet_pnl::reporting::format_report;
use wallet_pnl::utils::{validate_wallet_address, CancelSignal};
use wallet_pnl::{ApiResponse, WalletAnalysis};

#[derive(Parser)]
#[command(name = "wallet-pnl", version, about = "Solana wallet PnL analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a wallet's recent transaction history
    Analyze {
        address: String,
        /// Number of recent transactions to analyze
        #[arg(long)]
        limit: Option<usize>,
        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Check that an address is a well-formed public key
    Validate { address: String },
    /// Run the aggregation over a built-in history, no network needed
    Demo {
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    let _guard = init_tracing(&config.logging)?;

    match cli.command {
        Command::Analyze {
            address,
            limit,
            timeout_ms,
            format,
        } => analyze(&config, &address, limit, timeout_ms, format).await,
        Command::Validate { address } => validate(&address),
        Command::Demo { format } => demo(format),
    }
}

/// Install the subscriber; the guard must live until exit to flush file logs
fn init_tracing(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.log_level))
        .context("Failed to create EnvFilter")?;

    let pretty_layer = (!logging.json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
    });
    let json_layer = logging.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
    });

    let (file_layer, guard) = match logging.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wallet-pnl.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn analyze(
    config: &Config,
    address: &str,
    limit: Option<usize>,
    timeout_ms: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let pool = Arc::new(
        EndpointPool::new(config.rpc.endpoints.clone()).context("No RPC endpoints configured")?,
    );
    info!("RPC endpoints: {}", pool.len());
    debug!("   Primary: {} (premium: {})", pool.current(), config.rpc.premium);
    debug!("   Commitment: {}", config.rpc.commitment_level);

    let ledger = Arc::new(
        SolanaLedgerClient::new(config.commitment()?, config.rpc_timeout())
            .context("Failed to build RPC HTTP client")?,
    );
    let fetcher = RetryingFetcher::new(ledger, pool, config.fetch_config());
    let analyzer = WalletAnalyzer::new(fetcher, config.analyzer_config());

    let token = CancellationToken::new();
    let mut cancel = CancelSignal::with_token(token.clone());
    if let Some(ms) = timeout_ms.or(config.analyzer.request_timeout_ms) {
        cancel = cancel.with_timeout(Duration::from_millis(ms));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, cancelling analysis");
            token.cancel();
        }
    });

    let response = analyzer.respond(address, limit, &cancel).await;
    print_response(&response, format)?;

    if !response.success {
        bail!(
            "{}",
            response.error.unwrap_or_else(|| "Wallet analysis failed".to_string())
        );
    }
    Ok(())
}

fn validate(address: &str) -> Result<()> {
    let valid = validate_wallet_address(address);
    let result = serde_json::json!({
        "address": address,
        "valid": valid,
        "status": if valid { "ok" } else { "invalid" },
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    });
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !valid {
        bail!("Invalid wallet address");
    }
    Ok(())
}

fn demo(format: OutputFormat) -> Result<()> {
    info!("Running demo analysis over built-in history");
    print_response(&ApiResponse::analysis(demo_analysis()), format)
}

fn print_response(response: &ApiResponse<WalletAnalysis>, format: OutputFormat) -> Result<()> {
    match (format, response.data.as_ref()) {
        (OutputFormat::Markdown, Some(analysis)) => print!("{}", format_report(analysis)),
        _ => println!(
            "{}",
            serde_json::to_string_pretty(response).context("Failed to serialize response")?
        ),
    }
    Ok(())
}
