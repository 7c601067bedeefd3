//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Download lecture materials from the campus LMS.
///
/// Signs in with a password (from `LECTURE_DL_PASSWORD`) or a push approval
/// on the registered mobile device, then lists courses, resolves materials
/// or downloads them.
#[derive(Parser, Debug)]
#[command(name = "lecture-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Worker pool size for resolution and downloads (default: 2x CPUs, at least 4)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=256))]
    pub workers: Option<u16>,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub connect_timeout: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Point every upstream service at one origin (testing against a mirror)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory where unparsable content descriptors are saved
    #[arg(long)]
    pub diagnostics_dir: Option<PathBuf>,

    /// Student ID used to sign in
    #[arg(short, long, env = "LECTURE_DL_USER")]
    pub user: Option<String>,

    /// Sign in by approving a push notification instead of a password
    #[arg(long)]
    pub push: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List courses grouped by term
    Courses,
    /// List the downloadable materials of a course
    Materials(CourseArgs),
    /// Download the materials of a course
    Download(DownloadArgs),
}

/// Selects one course.
#[derive(ClapArgs, Debug, PartialEq, Eq)]
pub struct CourseArgs {
    /// Course ID as shown by `courses`
    #[arg(long)]
    pub course: String,
}

/// Arguments for `download`.
#[derive(ClapArgs, Debug, PartialEq, Eq)]
pub struct DownloadArgs {
    /// Course ID as shown by `courses`
    #[arg(long)]
    pub course: String,

    /// Destination directory (created if missing)
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,

    /// Only download these materials (indexes as shown by `materials`)
    #[arg(long, num_args = 1..)]
    pub only: Vec<usize>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}
