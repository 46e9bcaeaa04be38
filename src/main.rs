use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coupon_audit::app::App;
use coupon_audit::config::Config;

#[derive(Parser)]
#[command(
    name = "coupon-audit",
    version,
    about = "Measure how guessable a promotion code scheme is against a self-hosted coupon book",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML config file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the status server and the audit worker (default)
    Serve,

    /// Print candidate codes without contacting anything
    Generate {
        /// Number of codes to print
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env().context("Failed to load config from environment")?,
    };

    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await?,
        Commands::Generate { count } => generate(&config, count),
        Commands::ShowConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("coupon_audit=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("coupon_audit={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    tracing::info!(
        bind = %config.server.bind_address,
        prefix = %config.generator.prefix,
        alphabet = %config.generator.alphabet,
        suffix_len = config.generator.suffix_len,
        journal = %config.logging.journal_path.display(),
        "Starting coupon audit"
    );

    let app = App::new(config)?;
    let summary = app.run(shutdown_signal()).await?;

    if let Some(summary) = summary {
        tracing::info!(
            attempts = summary.attempts,
            hits = summary.hits,
            errors = summary.errors,
            "Coupon audit completed"
        );
    }
    Ok(())
}

fn generate(config: &Config, count: usize) {
    let generator = config.generator.build();
    for _ in 0..count {
        println!("{}", generator.generate());
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
