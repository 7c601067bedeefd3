//! CLI entry point for the lecture downloader.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use lecture_core::{EngineConfig, HttpTimeouts, LectureService, ServiceEndpoints, default_worker_count};
use tracing::{debug, info};

mod cli;
mod commands;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(command = ?args.command, push = args.push, "CLI arguments parsed");

    let config = engine_config(&args);
    info!(workers = config.workers, lms = %config.endpoints.lms, "lecture downloader starting");

    let service = LectureService::new(config)?;
    let credential = commands::sign_in(&service, &args).await?;

    let all_ok = match &args.command {
        Command::Courses => {
            commands::run_courses_command(&service, &credential).await?;
            true
        }
        Command::Materials(course) => {
            commands::run_materials_command(&service, &credential, &course.course).await?;
            true
        }
        Command::Download(download) => {
            let show_progress = !args.quiet && io::stderr().is_terminal();
            commands::run_download_command(&service, &credential, download, show_progress).await?
        }
    };

    Ok(if all_ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn engine_config(args: &Args) -> EngineConfig {
    let endpoints = args
        .base_url
        .as_deref()
        .map_or_else(ServiceEndpoints::default, ServiceEndpoints::single_origin);
    EngineConfig {
        endpoints,
        timeouts: HttpTimeouts {
            connect: Duration::from_secs(args.connect_timeout),
            request: Duration::from_secs(args.timeout),
        },
        workers: args.workers.map_or_else(default_worker_count, usize::from),
        diagnostics_dir: args.diagnostics_dir.clone(),
    }
}
