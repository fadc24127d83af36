//! Fountain detail, reviews and photos.

use crate::config::Config;
use crate::output;
use berez_state::markers;
use berez_state::TickReport;
use log::warn;

/// Open a fountain by id, the deep-link path. The working set is tried
/// first; when the fountain is not in it, it is fetched on its own.
pub async fn run_fountain(config: &Config, id: i64) -> anyhow::Result<()> {
    let (session, client) = config.open_session(None)?;
    let mut events = session.resolver().subscribe();

    // Distance is best effort; the detail view works without a location.
    let report = session.tick().await;
    output::drain_warnings(&mut events);
    if !matches!(report, TickReport::Refreshed { .. }) {
        warn!("{}", output::describe_report(&report));
    }

    let panel = if session.select(id) {
        session.detail()
    } else {
        None
    };
    let panel = match panel {
        Some(panel) => panel,
        None => {
            let fountain = session.directory().find(id).await?;
            markers::detail(&fountain, session.location().as_ref())
        }
    };
    output::print_detail(&panel);

    match client.reviews(id).await {
        Ok(reviews) => {
            println!("Reviews:");
            output::print_reviews(&reviews);
        }
        Err(e) => warn!("Could not load reviews for fountain {}: {}", id, e),
    }
    match client.photos(id).await {
        Ok(photos) => {
            println!("Photos:");
            output::print_photos(&photos);
        }
        Err(e) => warn!("Could not load photos for fountain {}: {}", id, e),
    }
    Ok(())
}

pub async fn run_reviews(config: &Config, id: i64) -> anyhow::Result<()> {
    let reviews = config.api_client()?.reviews(id).await?;
    output::print_reviews(&reviews);
    Ok(())
}

pub async fn run_photos(config: &Config, id: i64) -> anyhow::Result<()> {
    let photos = config.api_client()?.photos(id).await?;
    output::print_photos(&photos);
    Ok(())
}
