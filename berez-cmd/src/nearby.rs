//! One locate-and-list cycle, shown as a list or as map markers.

use crate::config::Config;
use crate::output;
use anyhow::bail;
use berez_state::models::FountainRow;
use berez_state::{TickReport, ViewMode};
use log::info;
use std::path::Path;

/// Write list rows to a CSV file with a header line.
pub fn write_csv(path: &Path, rows: &[FountainRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} fountains to {}", rows.len(), path.display());
    Ok(())
}

/// Locate the user, fetch nearby fountains and render them in the
/// resolved view mode. `view` plays the role of the URL parameter.
pub async fn run_nearby(config: &Config, view: Option<&str>, csv_path: Option<&Path>) -> anyhow::Result<()> {
    let (session, _client) = config.open_session(view)?;
    let mut events = session.resolver().subscribe();

    let report = session.tick().await;
    output::drain_warnings(&mut events);
    match &report {
        TickReport::Refreshed { .. } => info!("{}", output::describe_report(&report)),
        TickReport::FetchFailed { error, .. } => bail!("Could not load fountains: {}", error),
        TickReport::LocationFailed(error) => bail!("{}", error),
        TickReport::Superseded => bail!("Location request was superseded"),
    }

    let rows = session.rows();
    match session.view().mode() {
        ViewMode::List => output::print_rows(&rows),
        ViewMode::Map => output::print_map(session.map_center(), &session.markers()),
    }
    if let Some(path) = csv_path {
        write_csv(path, &rows)?;
    }
    Ok(())
}
