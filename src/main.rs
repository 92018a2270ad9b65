// Entry point: load config, apply CLI overrides, render the requested figures.
use std::error::Error;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use shareplot::cli::{Args, Command};
use shareplot::config::AppConfig;
use shareplot::paper::{self, Output};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let mut cfg = AppConfig::load_or_default(&args.config)?;
    args.apply(&mut cfg);

    let output = Output::new(&cfg.output.dir, cfg.output.render_style());
    let run_all = args.command == Command::All;
    let mut written = Vec::new();

    if run_all || matches!(args.command, Command::Recovery { .. }) {
        written.push(paper::recovery::run(&cfg.recovery, &output)?);
    }
    if run_all || args.command == Command::Cdf {
        written.extend(paper::cdf::run(&cfg.cdf, &output)?);
    }
    if run_all || args.command == Command::Expected {
        written.extend(paper::expected::run(&cfg.expected, &output)?);
    }
    if run_all || args.command == Command::Comparison {
        written.extend(paper::comparison::run(&cfg.comparison, &output)?);
    }
    if run_all || args.command == Command::Timing {
        written.extend(paper::timing::run(&cfg.timing, &output)?);
    }
    if run_all || args.command == Command::Packet {
        written.extend(paper::packet::run(&cfg.packet, &output)?);
    }

    info!(
        files = written.len(),
        dir = %output.root.display(),
        "done"
    );
    Ok(())
}
