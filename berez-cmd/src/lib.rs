//! Command implementations for the Berez CLI.
//!
//! Each subcommand wires a [`berez_state::Session`] (or a bare API client
//! for the endpoints the engine does not cover) to the configured backend
//! and prints the result.

use berez_api::review::ReportType;
use berez_state::ViewMode;
use clap::Subcommand;
use std::path::PathBuf;

pub mod config;
pub mod detail;
pub mod nearby;
pub mod output;
pub mod report;
pub mod review;
pub mod view;
pub mod watch;

pub use config::Config;

#[derive(Subcommand)]
pub enum Command {
    /// Locate yourself and list the fountains nearby
    Nearby {
        /// list or map; overrides the saved preference
        #[arg(long)]
        view: Option<String>,

        /// Also write the list to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Show one fountain with its reviews and photos
    Fountain { id: i64 },

    /// List the reviews of a fountain
    Reviews { id: i64 },

    /// List the photos of a fountain
    Photos { id: i64 },

    /// Rate a fountain
    Review(review::ReviewArgs),

    /// Report a problem with a fountain
    Report {
        id: i64,

        /// broken, missing, incorrect-location or other
        #[arg(short = 't', long = "type")]
        report_type: ReportType,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Submit a new fountain at your current location
    Submit(report::SubmitArgs),

    /// Upload a photo (jpeg, png, gif or webp, at most 10MB)
    UploadPhoto {
        path: PathBuf,

        /// Attach the photo to this fountain
        #[arg(long)]
        fountain: Option<i64>,
    },

    /// Refresh the nearby list periodically
    Watch {
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<usize>,
    },

    /// Show or change the saved list/map preference
    View {
        #[arg(long, conflicts_with = "toggle")]
        set: Option<ViewMode>,

        #[arg(long)]
        toggle: bool,
    },
}

/// Run a command. Must be awaited inside a `tokio::task::LocalSet`.
pub async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Nearby { view, csv } => {
            nearby::run_nearby(&config, view.as_deref(), csv.as_deref()).await
        }
        Command::Fountain { id } => detail::run_fountain(&config, id).await,
        Command::Reviews { id } => detail::run_reviews(&config, id).await,
        Command::Photos { id } => detail::run_photos(&config, id).await,
        Command::Review(args) => review::run_review(&config, &args).await,
        Command::Report {
            id,
            report_type,
            description,
        } => report::run_report(&config, id, report_type, description).await,
        Command::Submit(args) => report::run_submit(&config, &args).await,
        Command::UploadPhoto { path, fountain } => {
            report::run_upload(&config, &path, fountain).await
        }
        Command::Watch { ticks } => watch::run_watch(&config, ticks).await,
        Command::View { set, toggle } => view::run_view(&config, set, toggle),
    }
}
