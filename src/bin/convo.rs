//! CLI front end: `convo <path>` runs a script file; with no argument it
//! opens an interactive read-eval-print loop. Modeled on `rhai-cli`'s
//! `args.rs`/`bin/rhai.rs` split, trimmed to the options this CLI needs
//! (no LSP/fmt subcommands).

use anyhow::{Context, Result};
use clap::Parser;
use convo::config::RunnerConfig;
use convo::Engine;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser)]
#[clap(name = "convo", version)]
struct ConvoArgs {
    /// Script file to run. With no path, starts an interactive REPL.
    path: Option<PathBuf>,

    /// Increase log verbosity; repeat for more detail (-v, -vv).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML config file overriding the default `convo.toml` lookup.
    #[clap(long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = ConvoArgs::parse();
    setup_logging(args.verbose);

    let result = match &args.path {
        Some(path) => run_file(path, &args),
        None => run_repl(&args),
    };

    match result {
        Ok(()) => exit(0),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "convo exited with an error");
            eprintln!("{err:#}");
            exit(1);
        }
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("convo={level}")));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(args: &ConvoArgs) -> Result<RunnerConfig> {
    let path = args.config.clone().unwrap_or_else(|| PathBuf::from("convo.toml"));
    RunnerConfig::load(&path).map_err(|e| anyhow::anyhow!("{e}"))
}

fn run_file(path: &PathBuf, args: &ConvoArgs) -> Result<()> {
    let config = load_config(args)?;
    let source = std::fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))?;
    let engine = Engine::new(config);
    tracing::info!(path = %path.display(), "running script");
    engine.run_str(&source).map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}

fn run_repl(args: &ConvoArgs) -> Result<()> {
    let config = load_config(args)?;
    let engine = Engine::new(config);
    println!("convo REPL — Ctrl-D to exit");
    let mut input = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        input.clear();
        let bytes_read = std::io::stdin()
            .read_line(&mut input)
            .context("reading from standard input")?;
        if bytes_read == 0 {
            println!();
            return Ok(());
        }
        if input.trim().is_empty() {
            continue;
        }
        match engine.run_repl_line(&input) {
            Ok(Some(value)) => println!("{value}"),
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
}
