use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use currency_core::{
    config::{self, Config},
    native::NativeCurrency,
};
use currency_ffi::CurrencyBridge;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "currency",
    version,
    about = "Locale-aware currency formatting over a native ICU bridge"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Format an amount in a currency for a locale.
    Format {
        /// Locale identifier, e.g. en-US.
        #[arg(short, long)]
        locale: String,
        /// ISO 4217 currency code, e.g. USD.
        #[arg(long)]
        code: String,
        /// The amount to format.
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Print the symbol of a currency for a locale.
    Symbol {
        #[arg(short, long)]
        locale: String,
        #[arg(long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.bridge.log_level)),
        )
        .init();

    // `config::load` runs before the subscriber exists, so its own notice is lost.
    if let Some(notice) = config_fallback_notice(&cli.config) {
        info!("{notice}");
    }

    let output = execute(cfg, cli.command).await?;
    println!("{output}");
    Ok(())
}

/// Message logged when the config file is absent and defaults are used.
fn config_fallback_notice(path: &str) -> Option<String> {
    if Path::new(path).exists() {
        return None;
    }
    Some(format!("Config file not found at {path}, using defaults"))
}

#[cfg(feature = "icu")]
async fn execute(cfg: Config, command: Commands) -> anyhow::Result<String> {
    let bridge = Arc::new(CurrencyBridge::with_config(
        currency_ffi::icu::IcuNative,
        cfg.bridge,
    ));
    run(bridge, command).await
}

#[cfg(not(feature = "icu"))]
async fn execute(_cfg: Config, _command: Commands) -> anyhow::Result<String> {
    anyhow::bail!("built without a native backend; rebuild with `--features icu`")
}

#[cfg_attr(not(any(test, feature = "icu")), allow(dead_code))]
async fn run<N: NativeCurrency + 'static>(
    bridge: Arc<CurrencyBridge<N>>,
    command: Commands,
) -> anyhow::Result<String> {
    let output = match command {
        Commands::Format {
            locale,
            code,
            value,
        } => bridge.format_async(locale, value, code).await?,
        Commands::Symbol { locale, code } => bridge.symbol_async(locale, code).await?,
    };
    Ok(output)
}
