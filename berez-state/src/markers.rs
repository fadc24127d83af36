//! Map markers, fountain selection and the detail panel.

use berez_api::fountain::Fountain;
use berez_api::location::{Coordinates, Location, DEFAULT_CENTER};
use berez_data::distance::{directions_url, format_distance, haversine};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Gray,
    Blue,
    Amber,
    Red,
}

impl MarkerColor {
    /// Unrated fountains (average 0) are gray.
    pub fn for_rating(average: f64) -> Self {
        if average <= 0.0 {
            MarkerColor::Gray
        } else if average >= 4.0 {
            MarkerColor::Blue
        } else if average >= 3.0 {
            MarkerColor::Amber
        } else {
            MarkerColor::Red
        }
    }

    /// A fountain with no ratings is gray whatever average it carries.
    pub fn for_fountain(fountain: &Fountain) -> Self {
        if fountain.is_rated() {
            Self::for_rating(fountain.average_general_rating)
        } else {
            MarkerColor::Gray
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            MarkerColor::Gray => "#9CA3AF",
            MarkerColor::Blue => "#0066CC",
            MarkerColor::Amber => "#F59E0B",
            MarkerColor::Red => "#EF4444",
        }
    }
}

impl fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarkerColor::Gray => "gray",
            MarkerColor::Blue => "blue",
            MarkerColor::Amber => "amber",
            MarkerColor::Red => "red",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub fountain_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub color: MarkerColor,
    pub selected: bool,
}

/// Which fountain, if any, the detail panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    selected: Option<i64>,
}

impl Selection {
    pub fn select(&mut self, id: i64) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn id(&self) -> Option<i64> {
        self.selected
    }

    pub fn resolve<'a>(&self, fountains: &'a [Fountain]) -> Option<&'a Fountain> {
        let id = self.selected?;
        fountains.iter().find(|f| f.id == id)
    }

    /// Drop the selection if its fountain is no longer in `fountains`.
    /// Returns true when it was cleared.
    pub fn reconcile(&mut self, fountains: &[Fountain]) -> bool {
        match self.selected {
            Some(_) if self.resolve(fountains).is_none() => {
                self.selected = None;
                true
            }
            _ => false,
        }
    }
}

pub fn present(fountains: &[Fountain], selection: &Selection) -> Vec<Marker> {
    fountains
        .iter()
        .map(|f| Marker {
            fountain_id: f.id,
            latitude: f.latitude,
            longitude: f.longitude,
            color: MarkerColor::for_fountain(f),
            selected: selection.id() == Some(f.id),
        })
        .collect()
}

/// Map center: the user when known, else the default city.
pub fn center(location: Option<&Location>) -> Coordinates {
    location.map(Location::coordinates).unwrap_or(DEFAULT_CENTER)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub fountain: Fountain,
    pub distance_m: Option<f64>,
    pub distance: Option<String>,
    pub directions_url: String,
}

/// Build the detail panel; distance is measured from `location` when known.
pub fn detail(fountain: &Fountain, location: Option<&Location>) -> DetailPanel {
    let distance_m = location.map(|at| haversine(at, fountain));
    DetailPanel {
        fountain: fountain.clone(),
        distance_m,
        distance: distance_m.map(format_distance),
        directions_url: directions_url(fountain),
    }
}
