//! Fire-and-forget submissions: problem reports, new fountains and photos.

use crate::config::Config;
use crate::output;
use berez_api::fountain::FountainType;
use berez_api::review::{FountainReport, FountainSubmission, ReportType};
use clap::Args;
use log::info;
use std::path::Path;

pub async fn run_report(
    config: &Config,
    fountain_id: i64,
    report_type: ReportType,
    description: Option<String>,
) -> anyhow::Result<()> {
    let report = FountainReport {
        fountain_id,
        report_type,
        description: description.filter(|d| !d.trim().is_empty()),
    };
    config.api_client()?.report_fountain(&report).await?;
    println!("Reported fountain {} as {}.", fountain_id, report_type);
    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Street address or landmark
    #[arg(long)]
    pub address: String,

    /// cylindrical, leaf, cooler, square or mushroom
    #[arg(long = "type", default_value = "cylindrical")]
    pub fountain_type: FountainType,

    #[arg(long)]
    pub dog_friendly: bool,

    #[arg(long)]
    pub bottle_refill: bool,

    #[arg(short, long)]
    pub description: Option<String>,
}

/// Submit a new fountain at the user's resolved location.
pub async fn run_submit(config: &Config, args: &SubmitArgs) -> anyhow::Result<()> {
    let (session, client) = config.open_session(None)?;
    let mut events = session.resolver().subscribe();
    let location = session.resolver().resolve().await?;
    output::drain_warnings(&mut events);
    info!("Submitting fountain at {}", location);

    let submission = FountainSubmission {
        address: args.address.trim().to_string(),
        latitude: location.latitude,
        longitude: location.longitude,
        dog_friendly: args.dog_friendly,
        bottle_refill: args.bottle_refill,
        fountain_type: args.fountain_type,
        description: args.description.clone().filter(|d| !d.trim().is_empty()),
    };
    client.submit_fountain(&submission).await?;
    println!("Submitted {} at {} for review.", submission.address, location);
    Ok(())
}

pub async fn run_upload(config: &Config, path: &Path, fountain_id: Option<i64>) -> anyhow::Result<()> {
    let upload = config.api_client()?.upload_photo(path, fountain_id).await?;
    println!("Uploaded photo {}: {}", upload.photo_id, upload.url);
    Ok(())
}
