use anyhow::{Context, Result};
use setlease_check::LeaseTestRunner;
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let Some(path) = env::args_os().nth(1) else {
        print_usage();
        return Ok(ExitCode::FAILURE);
    };

    init_tracing();

    let runner = LeaseTestRunner::new(PathBuf::from(path)).context("failed to install SIGIO handler")?;
    info!(path = %runner.path().display(), "running lease break cases");

    match runner.run_all() {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(failure) => {
            warn!(cause = %failure.cause, errno = ?failure.cause.errno(), "case failed");
            eprintln!("{failure}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_usage() {
    println!("Usage: setlease-check <filename>");
}

/// RUST_LOG で上書き可能、デフォルトはエラーのみ
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
