//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::domain::ApplicationStatus;

/// jb - job board client
#[derive(Parser)]
#[command(
    name = "jb",
    about = "Browse jobs, track applications and review applicants",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List open jobs
    Jobs {
        /// Only show jobs whose title, company, location or skills contain this text
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List jobs posted by the signed-in employer
    MyJobs {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List a user's applications
    Applications {
        /// User ID (defaults to api.user-id from config)
        #[arg(short, long)]
        user: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List applicants for one of your jobs
    Applicants {
        /// Job ID
        job_id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Recent openings plus your own jobs (employer) or applications (applicant)
    Dashboard {
        /// Show the employer view instead of the applicant view
        #[arg(long)]
        employer: bool,

        /// User ID for the applicant view (defaults to api.user-id from config)
        #[arg(short, long, conflicts_with = "employer")]
        user: Option<String>,
    },

    /// Show a single job
    Show {
        /// Job ID
        job_id: String,
    },

    /// Keep the open job list fresh, printing it whenever it changes
    Watch {
        /// Seconds between refresh requests
        #[arg(short, long, default_value = "5")]
        interval: u64,

        /// Stop after this many refresh requests
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Post a job described in a YAML file
    Post {
        /// Path to the job YAML file
        file: PathBuf,
    },

    /// Apply for a job
    Apply {
        /// Job ID
        job_id: String,

        /// Cover letter text
        #[arg(long)]
        cover_letter: String,
    },

    /// Delete one of your jobs
    Delete {
        /// Job ID
        job_id: String,
    },

    /// Record a review decision for an application
    Review {
        /// Application ID
        application_id: String,

        /// Job the application belongs to
        #[arg(short, long)]
        job: String,

        /// New status (applied, shortlisted, rejected, hired)
        #[arg(short, long)]
        status: ApplicationStatus,

        /// Reviewer notes
        #[arg(long)]
        notes: Option<String>,
    },
}

/// Output format for list commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jobboard")
        .join("logs")
        .join("jobboard.log")
}
