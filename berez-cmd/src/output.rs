//! Plain-text rendering of engine state.

use berez_api::review::{Photo, Review};
use berez_state::markers::{DetailPanel, Marker};
use berez_state::models::FountainRow;
use berez_state::{LocationEvent, TickReport};
use berez_api::location::Coordinates;
use tokio::sync::broadcast;

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn format_row(row: &FountainRow) -> String {
    format!(
        "{:>6}  {:<40}  {:>8}  {:>3} ({:>3})  {:<11}  dog:{:<3}  refill:{}",
        row.id,
        row.address,
        row.distance.as_deref().unwrap_or("?"),
        row.rating,
        row.ratings,
        row.fountain_type.name(),
        yes_no(row.dog_friendly),
        yes_no(row.bottle_refill)
    )
}

pub fn print_rows(rows: &[FountainRow]) {
    if rows.is_empty() {
        println!("No fountains nearby.");
        return;
    }
    println!(
        "{:>6}  {:<40}  {:>8}  {:>9}  {:<11}",
        "ID", "ADDRESS", "DISTANCE", "RATING", "TYPE"
    );
    for row in rows {
        println!("{}", format_row(row));
    }
}

pub fn format_marker(marker: &Marker) -> String {
    format!(
        "{}{:>6}  {:>9.5}, {:>9.5}  {:<5} {}",
        if marker.selected { "*" } else { " " },
        marker.fountain_id,
        marker.latitude,
        marker.longitude,
        marker.color,
        marker.color.hex()
    )
}

pub fn print_map(center: Coordinates, markers: &[Marker]) {
    println!("Map centered on {}", center);
    for marker in markers {
        println!("{}", format_marker(marker));
    }
}

pub fn print_detail(panel: &DetailPanel) {
    let f = &panel.fountain;
    println!("Fountain {}: {}", f.id, f.address);
    println!("  type:          {}", f.fountain_type);
    println!(
        "  rating:        {} from {} ratings",
        berez_data::rating::format_rating(f),
        f.number_of_ratings
    );
    println!("  dog friendly:  {}", yes_no(f.dog_friendly));
    println!("  bottle refill: {}", yes_no(f.bottle_refill));
    if let Some(distance) = &panel.distance {
        println!("  distance:      {}", distance);
    }
    println!("  directions:    {}", panel.directions_url);
}

pub fn print_reviews(reviews: &[Review]) {
    if reviews.is_empty() {
        println!("No reviews yet.");
        return;
    }
    for review in reviews {
        let author = review.username.as_deref().unwrap_or("anonymous");
        let when = review
            .creation_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("  [{}] {} {} {}", review.general_rating, author, when, review.description.as_deref().unwrap_or(""));
    }
}

pub fn print_photos(photos: &[Photo]) {
    if photos.is_empty() {
        println!("No photos yet.");
        return;
    }
    for photo in photos {
        println!("  {:>6}  {}", photo.id, photo.url);
    }
}

pub fn describe_report(report: &TickReport) -> String {
    match report {
        TickReport::Refreshed { location, count } => {
            format!("{} fountains near {}", count, location)
        }
        TickReport::FetchFailed { location, error } => {
            format!("fetch near {} failed, keeping previous list: {}", location, error)
        }
        TickReport::LocationFailed(error) => error.to_string(),
        TickReport::Superseded => "cycle superseded by a newer one".to_string(),
    }
}

/// Print pending approximate-location warnings.
pub fn drain_warnings(events: &mut broadcast::Receiver<LocationEvent>) {
    while let Ok(event) = events.try_recv() {
        if let LocationEvent::ApproximateWarning { reason } = event {
            eprintln!(
                "warning: using approximate IP-based location ({}); pass --lat/--lon for a precise one",
                reason
            );
        }
    }
}
