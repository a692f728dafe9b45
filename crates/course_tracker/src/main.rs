//! Main entry point for the course tracker.
//! Watches the courses listed in a registry file and notifies each topic once
//! its course has an open seat.

use std::path::PathBuf;

use clap::Parser;
use course_watch::{CourseRegistry, Season, Supervisor, WatchError};

mod tracker;
use tracker::*;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(
    name = "course-tracker",
    about = "Get notified when a watched course section opens up"
)]
struct Cli {
    /// Upcoming season to watch (fall, spring or summer)
    season: String,

    /// JSON file mapping each notification topic to the CRNs it watches
    registry: PathBuf,

    /// Delivery channel for notifications
    #[arg(long, value_enum, default_value_t = SinkKind::Ntfy)]
    sink: SinkKind,

    /// Also notify when a waitlist spot opens
    #[arg(long)]
    waitlist: bool,

    /// Keep sweeping when a single course check fails
    #[arg(long)]
    isolate_failures: bool,

    /// Back off exponentially between restarts
    #[arg(long)]
    exponential_backoff: bool,

    /// Print the current state of every watched course and exit
    #[arg(long)]
    info: bool,

    /// With --info, report on these CRNs instead of the registry's courses
    #[arg(long = "crn", value_name = "CRN", requires = "info")]
    crns: Vec<String>,
}

impl Cli {
    fn options(&self) -> TrackerOptions {
        TrackerOptions {
            waitlist: self.waitlist,
            isolate_failures: self.isolate_failures,
            exponential_backoff: self.exponential_backoff,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let season: Season = match cli.season.parse() {
        Ok(season) => season,
        Err(e @ WatchError::InvalidSeason(_)) => {
            log::error!("❌ {}", e);
            eprintln!("Could not run course tracker: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    let term = season.term_code(&chrono::Local::now().date_naive());
    log::info!("🚀 Starting course tracker for {} (term {})", season, term);

    let source = build_source()?;

    if cli.info {
        if !cli.crns.is_empty() {
            return print_crn_info(&cli.crns, &term, source).await;
        }
        let registry = CourseRegistry::load(&cli.registry, term, source).await?;
        return print_course_info(&registry).await;
    }

    let sink = build_sink(cli.sink).await?;
    let options = cli.options();
    let supervisor = Supervisor::new(
        &cli.registry,
        term,
        source,
        sink,
        Some(options.poller_config()),
        Some(options.restart_policy()),
    );

    tokio::select! {
        result = supervisor.start() => {
            result?;
            log::info!("✅ Every watched course has been notified, exiting");
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("🛑 Interrupted, exiting");
        }
    }

    Ok(())
}
