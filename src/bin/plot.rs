use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use steptrace::config::Config;
use steptrace::plot;

/// Compare mnemonic counts of two instruction logs with a horizontal bar chart.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Instruction log of a baseline run
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Instruction log of an optimized run
    #[arg(long)]
    optimized: Option<PathBuf>,

    /// Chart image path (png or svg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TrueType font for chart labels, a well known system font by default
    #[arg(long)]
    font: Option<PathBuf>,

    /// Config file, `~/.config/steptrace/config.toml` by default
    #[arg(short, long, env = "STEPTRACE_CONFIG")]
    config: Option<PathBuf>,

    /// Disable library logs
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.quiet {
        steptrace::log::disable();
    }

    let mut cfg = Config::from_file(args.config.as_deref())
        .unwrap_or_default()
        .plot;
    if let Some(baseline) = args.baseline {
        cfg.baseline = baseline;
    }
    if let Some(optimized) = args.optimized {
        cfg.optimized = optimized;
    }
    if let Some(output) = args.output {
        cfg.output = output;
    }
    if args.font.is_some() {
        cfg.font = args.font;
    }

    let comparison = plot::plot(&cfg).context("plot instruction counts")?;
    for row in comparison.rows() {
        println!("{:<16}{:>12}{:>12}", row.mnemonic, row.baseline, row.optimized);
    }

    Ok(())
}
