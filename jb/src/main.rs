//! jb - job board client
//!
//! CLI entry point for browsing jobs, tracking applications and reviewing applicants.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use jobboard::cli::{Cli, Command, OutputFormat, get_log_path};
use jobboard::config::Config;
use jobboard::coordinator::{CacheEntry, Operation};
use jobboard::domain::{
    Application, ApplicationStatus, Job, NewApplication, NewJob, Record, count_by_status, format_salary,
};
use jobboard::notify::{Level, Notification, NotificationBus};
use jobboard::transport::HttpTransport;
use jobboard::JobBoard;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(base_url = %config.api.base_url, "jb loaded config");

    let transport = HttpTransport::from_config(&config.api).context("Failed to create HTTP client")?;
    if !transport.has_token() {
        warn!(token_env = %config.api.token_env, "No API token set, requests are unauthenticated");
    }

    let bus = Arc::new(NotificationBus::with_default_capacity());
    let printer = spawn_notification_printer(&bus);
    let board = JobBoard::start(config.fetch.clone(), Arc::new(transport), bus.clone());
    drop(bus);

    debug!(command = ?cli.command, "main: dispatching command");
    let result = run_command(&board, &config, cli.command).await;

    let metrics = board.shutdown().await?;
    debug!(?metrics, "main: coordinator stopped");

    // Every sender is gone now, so the printer drains and exits
    printer.await?;
    result
}

async fn run_command(board: &JobBoard, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Jobs { search, format } => {
            debug!(?search, ?format, "main: matched Jobs command");
            cmd_list(board, Operation::OpenJobs, format, search.as_deref()).await
        }
        Command::MyJobs { format } => {
            debug!(?format, "main: matched MyJobs command");
            cmd_list(board, Operation::MyJobs, format, None).await
        }
        Command::Applications { user, format } => {
            debug!(?user, ?format, "main: matched Applications command");
            let user_id = user
                .or_else(|| config.api.user_id.clone())
                .ok_or_else(|| eyre!("No user given; pass --user or set api.user-id in the config"))?;
            cmd_list(board, Operation::UserApplications { user_id }, format, None).await
        }
        Command::Applicants { job_id, format } => {
            debug!(%job_id, ?format, "main: matched Applicants command");
            cmd_list(board, Operation::JobApplicants { job_id }, format, None).await
        }
        Command::Dashboard { employer, user } => {
            debug!(employer, ?user, "main: matched Dashboard command");
            let own = if employer {
                Operation::MyJobs
            } else {
                let user_id = user
                    .or_else(|| config.api.user_id.clone())
                    .ok_or_else(|| eyre!("No user given; pass --user, --employer or set api.user-id in the config"))?;
                Operation::UserApplications { user_id }
            };
            cmd_dashboard(board, own).await
        }
        Command::Show { job_id } => {
            debug!(%job_id, "main: matched Show command");
            let job = board.job(&job_id).await?;
            print_job_detail(&job);
            Ok(())
        }
        Command::Watch { interval, count } => {
            debug!(interval, ?count, "main: matched Watch command");
            cmd_watch(board, Duration::from_secs(interval.max(1)), count).await
        }
        Command::Post { file } => {
            debug!(?file, "main: matched Post command");
            cmd_post(board, &file).await
        }
        Command::Apply { job_id, cover_letter } => {
            debug!(%job_id, "main: matched Apply command");
            let application = board.apply_for_job(&NewApplication { job_id, cover_letter }).await?;
            println!("{} Application {}", "✓".green(), application.id.cyan());
            Ok(())
        }
        Command::Delete { job_id } => {
            debug!(%job_id, "main: matched Delete command");
            board.delete_job(&job_id).await?;
            Ok(())
        }
        Command::Review {
            application_id,
            job,
            status,
            notes,
        } => {
            debug!(%application_id, %job, %status, "main: matched Review command");
            let updated = board
                .update_application_status(&application_id, &job, status, notes)
                .await?;
            println!("{} {} is now {}", "✓".green(), updated.id.cyan(), status_label(&updated));
            Ok(())
        }
    }
}

const RECENT_JOBS: usize = 6;
const RECENT_APPLICATIONS: usize = 5;

/// Subscribe to every operation, request them together and wait until none is loading
async fn load<const N: usize>(board: &JobBoard, operations: [Operation; N]) -> Result<[CacheEntry; N]> {
    debug!(?operations, "load: called");
    let handle = board.handle();
    let mut subs = Vec::with_capacity(N);
    for operation in &operations {
        subs.push(handle.subscribe(operation.clone()).await?);
    }
    for operation in &operations {
        handle.request_data(operation.clone()).await?;
    }
    // Processed after the requests, so every entry is already marked loading
    handle.metrics().await?;

    let mut entries = Vec::with_capacity(N);
    for (operation, sub) in operations.iter().zip(subs.iter_mut()) {
        let entry = sub.wait_for(|e| !e.loading).await?;
        if let Some(error) = &entry.error {
            return Err(eyre!("Could not load {}: {}", operation, error));
        }
        entries.push(entry);
    }
    entries
        .try_into()
        .map_err(|_| eyre!("Expected {} results", N))
}

/// Fetch one list through the coordinator and print it
async fn cmd_list(board: &JobBoard, operation: Operation, format: OutputFormat, search: Option<&str>) -> Result<()> {
    debug!(%operation, ?format, ?search, "cmd_list: called");
    let [entry] = load(board, [operation]).await?;

    let records: Vec<&Record> = entry
        .records
        .iter()
        .filter(|record| match (search, record.as_job()) {
            (Some(term), Some(job)) => job.matches(term),
            _ => true,
        })
        .collect();
    print_records(&records, &format)
}

/// Recent openings next to the user's own jobs or applications
async fn cmd_dashboard(board: &JobBoard, own: Operation) -> Result<()> {
    debug!(%own, "cmd_dashboard: called");
    let employer = own == Operation::MyJobs;
    let [open, mine] = load(board, [Operation::OpenJobs, own]).await?;

    if employer {
        let jobs: Vec<&Job> = mine.records.iter().filter_map(Record::as_job).collect();
        let applicants: u32 = jobs.iter().map(|job| job.application_count).sum();
        println!(
            "{} {}",
            "Your jobs".bold(),
            format!("({} posted, {} applications)", jobs.len(), applicants).dimmed()
        );
        print_records(&mine.records.iter().collect::<Vec<_>>(), &OutputFormat::Text)?;
    } else {
        let applications: Vec<&Application> = mine.records.iter().filter_map(Record::as_application).collect();
        println!(
            "{} {}",
            "My applications".bold(),
            format!("({})", applications.len()).dimmed()
        );
        let counts: Vec<String> = count_by_status(applications.iter().copied())
            .into_iter()
            .map(|(status, n)| format!("{} {}", paint_status(status, status.as_str()), n))
            .collect();
        println!("{}", counts.join("  "));
        let recent: Vec<&Record> = mine.records.iter().take(RECENT_APPLICATIONS).collect();
        print_records(&recent, &OutputFormat::Text)?;
    }

    println!();
    println!("{}", "Recent job openings".bold());
    let recent: Vec<&Record> = open.records.iter().take(RECENT_JOBS).collect();
    print_records(&recent, &OutputFormat::Text)
}

/// Periodically request open jobs and print the list whenever it changes
async fn cmd_watch(board: &JobBoard, interval: Duration, count: Option<u32>) -> Result<()> {
    debug!(?interval, ?count, "cmd_watch: called");
    let handle = board.handle();
    let mut sub = handle.subscribe(Operation::OpenJobs).await?;
    let mut ticker = tokio::time::interval(interval);
    let mut issued = 0u32;

    println!("Watching open jobs every {}s (Ctrl+C to stop)", interval.as_secs());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if count.is_some_and(|limit| issued >= limit) {
                    break;
                }
                handle.request_data(Operation::OpenJobs).await?;
                issued += 1;
            }
            changed = sub.changed() => {
                let entry = changed?;
                if !entry.loading && entry.error.is_none() {
                    println!("{}", format!("-- {} open jobs --", entry.records.len()).dimmed());
                    print_records(&entry.records.iter().collect::<Vec<_>>(), &OutputFormat::Text)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("cmd_watch: interrupted");
                break;
            }
        }
    }
    Ok(())
}

async fn cmd_post(board: &JobBoard, file: &Path) -> Result<()> {
    debug!(?file, "cmd_post: called");
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let job: NewJob = serde_yaml::from_str(&content).context(format!("Failed to parse {}", file.display()))?;

    let created = board.create_job(&job).await?;
    println!("{} Posted {} ({})", "✓".green(), created.title.bold(), created.id.cyan());
    Ok(())
}

fn spawn_notification_printer(bus: &NotificationBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => print_notification(&notification),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notification printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn print_notification(notification: &Notification) {
    match notification.level {
        Level::Success => eprintln!("{} {}", "✓".green(), notification.message),
        Level::Error => eprintln!("{} {}", "✗".red(), notification.message.red()),
    }
}

fn print_records(records: &[&Record], format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "Nothing to show".dimmed());
        return Ok(());
    }
    for record in records {
        match record {
            Record::Job(job) => print_job_line(job),
            Record::Application(app) => print_application_line(app),
        }
    }
    Ok(())
}

fn print_job_line(job: &Job) {
    let inactive = if job.is_active { "" } else { " (inactive)" };
    println!(
        "{}  {}{} - {} | {} | {} | {}",
        job.id.dimmed(),
        job.title.bold(),
        inactive.yellow(),
        job.company.cyan(),
        job.location,
        job.job_type,
        format_salary(job.salary.as_ref())
    );
}

fn print_application_line(app: &Application) {
    let job = app
        .job
        .populated()
        .map(|j| format!("{} at {}", j.title, j.company))
        .unwrap_or_else(|| app.job.id().to_string());
    let applicant = app
        .user
        .populated()
        .map(|u| match &u.email {
            Some(email) => format!("{} <{}>", u.name, email),
            None => u.name.clone(),
        })
        .unwrap_or_else(|| app.user.id().to_string());
    println!(
        "{}  {}  {}  {}",
        app.id.dimmed(),
        status_label(app),
        job.bold(),
        applicant
    );
}

fn status_label(app: &Application) -> ColoredString {
    paint_status(app.status, app.status.as_str())
}

fn paint_status(status: ApplicationStatus, text: &str) -> ColoredString {
    match status {
        ApplicationStatus::Applied => text.blue(),
        ApplicationStatus::Shortlisted => text.yellow(),
        ApplicationStatus::Rejected => text.red(),
        ApplicationStatus::Hired => text.green(),
    }
}

fn print_job_detail(job: &Job) {
    println!("{}", job.title.bold());
    println!("{} - {}", job.company.cyan(), job.location);
    println!("Type:    {}", job.job_type);
    println!("Salary:  {}", format_salary(job.salary.as_ref()));
    println!("Status:  {}", if job.is_active { "open".green() } else { "closed".red() });
    println!("Applied: {}", job.application_count);
    if let Some(posted) = job.created_at {
        println!("Posted:  {}", posted.format("%Y-%m-%d"));
    }
    if !job.skills.is_empty() {
        println!("Skills:  {}", job.skills.join(", "));
    }
    if !job.description.is_empty() {
        println!();
        println!("{}", job.description);
    }
    if !job.requirements.is_empty() {
        println!();
        println!("{}", "Requirements".bold());
        for requirement in &job.requirements {
            println!("  - {}", requirement);
        }
    }
}
