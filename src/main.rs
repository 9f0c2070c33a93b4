mod app;
mod flow;
mod graph;
mod layout;
mod util;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{AppSettings, Theme, WalletTraceApp};
use crate::flow::{FixtureSource, FlowSource, HttpSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Bundled demo records, same for every address.
    Fixtures,
    /// JSON API serving `/inflows/{address}` and `/outflows/{address}`.
    Http,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, value_enum, default_value_t = SourceKind::Fixtures)]
    source: SourceKind,

    #[arg(long, default_value = "http://localhost:3000/api")]
    api_base_url: String,

    /// Abandon a wallet lookup after this many seconds (at least 1).
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    fetch_timeout_secs: u64,

    /// Directory that receives `wallet-connections.png`.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Wallet to look up at startup; repeatable.
    #[arg(long = "address")]
    addresses: Vec<String>,

    /// Start with the light palette.
    #[arg(long)]
    light: bool,
}

fn build_source(args: &Args, timeout: Duration) -> anyhow::Result<Arc<dyn FlowSource>> {
    Ok(match args.source {
        SourceKind::Fixtures => Arc::new(FixtureSource),
        SourceKind::Http => Arc::new(
            HttpSource::new(&args.api_base_url, timeout)
                .with_context(|| format!("failed to set up HTTP source for {}", args.api_base_url))?,
        ),
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wallet_trace=info")),
        )
        .init();

    let args = Args::parse();
    let fetch_timeout = Duration::from_secs(args.fetch_timeout_secs);
    let source = build_source(&args, fetch_timeout)?;
    info!(source = ?args.source, timeout_secs = fetch_timeout.as_secs(), "starting wallet-trace");

    let settings = AppSettings {
        fetch_timeout,
        export_dir: args.export_dir,
        initial_addresses: args.addresses,
        theme: if args.light { Theme::Light } else { Theme::Dark },
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "wallet-trace",
        options,
        Box::new(move |cc| Ok(Box::new(WalletTraceApp::new(cc, source, settings)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
