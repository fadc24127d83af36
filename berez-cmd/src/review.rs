//! Submit a review with an optimistic local rating update.

use crate::config::Config;
use crate::output;
use anyhow::bail;
use berez_api::review::ReviewCreate;
use berez_data::rating::format_rating;
use berez_state::TickReport;
use clap::Args;
use log::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    /// Fountain to review
    pub fountain_id: i64,

    /// General rating, 1-5
    #[arg(short, long)]
    pub rating: u8,

    /// Water temperature rating, 1-5
    #[arg(long)]
    pub temp: Option<u8>,

    /// Stream strength rating, 1-5
    #[arg(long)]
    pub stream: Option<u8>,

    /// Quenching rating, 1-5
    #[arg(long)]
    pub quenching: Option<u8>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Ids of photos uploaded beforehand
    #[arg(long, value_delimiter = ',')]
    pub photos: Vec<i64>,
}

impl ReviewArgs {
    pub fn payload(&self) -> anyhow::Result<ReviewCreate> {
        let review = ReviewCreate::new(self.fountain_id, self.rating)?
            .with_sub_ratings(
                self.temp.unwrap_or(0),
                self.stream.unwrap_or(0),
                self.quenching.unwrap_or(0),
            )?
            .with_description(self.description.as_deref().unwrap_or(""))
            .with_photos(self.photos.clone());
        Ok(review)
    }
}

/// The displayed average is updated before the POST is sent. A failed
/// submission is reported but the local value is not rolled back; the next
/// refresh brings the backend's numbers.
pub async fn run_review(config: &Config, args: &ReviewArgs) -> anyhow::Result<()> {
    let review = args.payload()?;
    let (session, client) = config.open_session(None)?;
    let mut events = session.resolver().subscribe();

    let report = session.tick().await;
    output::drain_warnings(&mut events);
    if !matches!(report, TickReport::Refreshed { .. }) {
        warn!("{}", output::describe_report(&report));
    }

    let before = session.directory().get_by_id(args.fountain_id);
    match (before, session.apply_review(args.fountain_id, args.rating)?) {
        (Some(before), Some(after)) => println!(
            "Fountain {}: {} ({}) -> {} ({})",
            after.id,
            format_rating(&before),
            before.number_of_ratings,
            format_rating(&after),
            after.number_of_ratings
        ),
        _ => info!(
            "Fountain {} is not nearby; skipping the local rating update",
            args.fountain_id
        ),
    }

    match client.submit_review(&review).await {
        Ok(stored) => {
            println!("Review {} saved.", stored.id);
            Ok(())
        }
        Err(e) => bail!(
            "Review submission failed: {}. The local average stays until the next refresh.",
            e
        ),
    }
}
