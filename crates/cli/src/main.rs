//! spoolctl - operator tool for the retryspool PostgreSQL data backend
//!
//! Stores, reads and deletes message payloads directly, bypassing the queue.
//! Logs go to stderr so payloads written to stdout stay clean.

mod cli;
mod config;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, op::OpContext, Get, Init, Put, Rm, Stat};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

command_enum! {
    (Init, Init),
    (Put, Put),
    (Get, Get),
    (Rm, Rm),
    (Stat, Stat),
}

/// Initialize logging on a non-blocking stderr writer.
/// The returned guard must be kept alive until the program exits.
fn init_logging(log_level: tracing::Level) -> tracing_appender::non_blocking::WorkerGuard {
    let (stderr_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stderr_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
    guard
}

async fn run(args: Args) -> i32 {
    let ctx = match OpContext::from_args(&args) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            let output = output.to_string();
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let guard = init_logging(args.log_level);

    let code = run(args).await;

    // flush buffered log lines before exiting
    drop(guard);
    std::process::exit(code);
}
