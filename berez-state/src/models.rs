//! Flat presentation structs for the fountain list and view state.
//!
//! All structs derive `Serialize` so the command layer can print them as
//! JSON or write them to CSV without reshaping.

use crate::view::ViewMode;
use berez_api::fountain::{Fountain, FountainType};
use berez_api::location::Location;
use berez_data::distance::{format_distance, haversine, sort_by_distance};
use berez_data::rating::format_rating;
use serde::Serialize;

/// One fountain card in the list view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FountainRow {
    pub id: i64,
    pub address: String,
    pub fountain_type: FountainType,
    /// Unrounded average; 0 when unrated.
    pub average_rating: f64,
    /// Display form of the average, `-` when unrated.
    pub rating: String,
    pub ratings: u32,
    pub dog_friendly: bool,
    pub bottle_refill: bool,
    /// Meters from the user, when the user's location is known.
    pub distance_m: Option<f64>,
    pub distance: Option<String>,
}

impl FountainRow {
    pub fn new(fountain: &Fountain, origin: Option<&Location>) -> Self {
        let distance_m = origin.map(|at| haversine(at, fountain));
        Self {
            id: fountain.id,
            address: fountain.address.clone(),
            fountain_type: fountain.fountain_type,
            average_rating: fountain.average_general_rating,
            rating: format_rating(fountain),
            ratings: fountain.number_of_ratings,
            dog_friendly: fountain.dog_friendly,
            bottle_refill: fountain.bottle_refill,
            distance_m,
            distance: distance_m.map(format_distance),
        }
    }
}

/// List rows, nearest first when the user's location is known.
pub fn rows(fountains: &[Fountain], origin: Option<&Location>) -> Vec<FountainRow> {
    let mut sorted = fountains.to_vec();
    if let Some(at) = origin {
        sort_by_distance(&mut sorted, at);
    }
    sorted.iter().map(|f| FountainRow::new(f, origin)).collect()
}

/// What a view needs to restore itself.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub selected_fountain_id: Option<i64>,
}
