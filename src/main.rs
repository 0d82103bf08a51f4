use anyhow::Context;
use clap::Parser;
use log::warn;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use steptrace::config::Config;
use steptrace::debugger;
use steptrace::debugger::process::Child;
use steptrace::debugger::{SessionEnd, StepSession, Syntax};

/// Run a program and log every instruction executed by its main thread.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Instruction log path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Assembly syntax (att or intel)
    #[arg(long)]
    syntax: Option<Syntax>,

    /// Stop after this number of instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// Working directory of a debugee
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Config file, `~/.config/steptrace/config.toml` by default
    #[arg(short, long, env = "STEPTRACE_CONFIG")]
    config: Option<PathBuf>,

    /// Disable library logs
    #[arg(short, long)]
    quiet: bool,

    /// Program to trace
    debugee: String,

    /// Program arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.quiet {
        steptrace::log::disable();
    }

    let mut cfg = Config::from_file(args.config.as_deref())
        .unwrap_or_default()
        .logger;
    if let Some(output) = args.output {
        cfg.output = output;
    }
    if let Some(syntax) = args.syntax {
        cfg.syntax = syntax;
    }
    if args.max_steps.is_some() {
        cfg.max_steps = args.max_steps;
    }

    let session = StepSession::new().with_step_limit(cfg.max_steps);
    let cancel = session.cancel_token();
    ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
        .context("install ctrl-c handler")?;

    let process = Child::new(&args.debugee, args.args, args.cwd);
    let report = debugger::log_instructions(process, &cfg.output, cfg.syntax, &session)
        .with_context(|| format!("trace {}", args.debugee))?;

    match report.end {
        SessionEnd::Finished(reason) => println!("{}: {reason}", args.debugee),
        SessionEnd::Unexplained(reason) => {
            warn!("stepping interrupted by unexpected stop: {reason}")
        }
        SessionEnd::Interrupted => warn!("stepping canceled"),
        SessionEnd::StepLimit | SessionEnd::Stopped => {}
    }
    println!(
        "{} instructions logged into {}",
        report.steps,
        cfg.output.display()
    );

    Ok(())
}
