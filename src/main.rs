use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use multi_output_status::{spawn_command, Aggregator, Config, Signal};
use simplelog::WriteLogger;
use std::fs::File;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Run shell commands in parallel and show the latest line of each, one row per
/// command, redrawn in place.
#[derive(Parser, Debug)]
#[command(name = "multi-output-status", version)]
struct Args {
    /// Commands to run, each as `NAME=COMMAND` or just `COMMAND`.
    #[arg(required = true, value_name = "COMMAND")]
    commands: Vec<String>,

    /// Milliseconds between redraws.
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Width to assume when the terminal size can't be read.
    #[arg(long, default_value_t = 80)]
    fallback_width: u16,

    /// Write debug logs here. Nothing is logged otherwise, since the terminal
    /// belongs to the display.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Splits `NAME=COMMAND`. A bare command is named after itself.
fn parse_command(arg: &str) -> (&str, &str) {
    match arg.split_once('=') {
        Some((name, command)) if !name.is_empty() && !name.contains(char::is_whitespace) => {
            (name, command)
        }
        _ => (arg, arg),
    }
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    WriteLogger::init(LevelFilter::Debug, simplelog::Config::default(), file)?;
    Ok(())
}

/// Shows the block until every command is done or `interrupt` resolves. The
/// display is stopped before returning either way, including when listening
/// for the interrupt failed. Returns whether it was interrupted.
async fn display_until_finished(
    aggregator: &mut Aggregator,
    interrupt: impl Future<Output = io::Result<()>>,
) -> Result<bool> {
    let cancel = Signal::new();
    aggregator.begin(cancel.clone())?;
    let done = aggregator.done();
    let interrupted = tokio::select! {
        _ = done.wait() => Ok(false),
        result = interrupt => {
            cancel.set();
            result
                .map(|()| true)
                .context("failed to listen for ctrl-c")
        }
    };
    aggregator.stop().await?;
    interrupted
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = Config::default()
        .with_refresh_interval(Duration::from_millis(args.interval_ms))
        .with_fallback_width(args.fallback_width);
    let mut aggregator = Aggregator::new(config);

    let mut children = Vec::new();
    for arg in &args.commands {
        let (name, script) = parse_command(arg);
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        let (stream, task) = spawn_command(name, command)?;
        aggregator.add([stream]);
        children.push((name, task));
    }

    let outcome = display_until_finished(&mut aggregator, tokio::signal::ctrl_c()).await;
    let abandon = !matches!(outcome, Ok(false));

    for (name, task) in children {
        if abandon {
            task.abort();
        }
        match task.await {
            Ok(Ok(status)) => println!("{name}: {status}"),
            Ok(Err(err)) => println!("{name}: {err:#}"),
            Err(err) if err.is_cancelled() => println!("{name}: interrupted"),
            Err(err) => println!("{name}: {err}"),
        }
    }
    outcome.map(|_| ())
}
