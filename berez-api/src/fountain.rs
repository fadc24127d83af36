use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::location::Coordinates;

/// Physical kind of a drinking fountain.
///
/// The backend names the variants after the municipal catalogue, hence the
/// `_fountain` suffixes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FountainType {
    #[default]
    #[serde(rename = "cylindrical_fountain", alias = "cylindrical")]
    Cylindrical,
    // The backend model shipped with a misspelled variant for a while.
    #[serde(rename = "leaf_fountain", alias = "leaf_fountaian", alias = "leaf")]
    Leaf,
    #[serde(rename = "cooler")]
    Cooler,
    #[serde(rename = "square_fountain", alias = "square")]
    Square,
    #[serde(rename = "mushroom_fountain", alias = "mushroom")]
    Mushroom,
}

impl FountainType {
    pub const ALL: [FountainType; 5] = [
        FountainType::Cylindrical,
        FountainType::Leaf,
        FountainType::Cooler,
        FountainType::Square,
        FountainType::Mushroom,
    ];

    /// Short name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            FountainType::Cylindrical => "cylindrical",
            FountainType::Leaf => "leaf",
            FountainType::Cooler => "cooler",
            FountainType::Square => "square",
            FountainType::Mushroom => "mushroom",
        }
    }
}

impl fmt::Display for FountainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FountainType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        FountainType::ALL
            .into_iter()
            .find(|t| t.name() == lowered || format!("{}_fountain", t.name()) == lowered)
            .ok_or_else(|| format!("unknown fountain type: {}", s))
    }
}

/// Moderation state of a fountain entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FountainStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

/// A public drinking fountain as served by the backend.
///
/// The rating fields are the only ones the client ever changes locally (via
/// the optimistic rating overlay); everything else is replaced by a refetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fountain {
    pub id: i64,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub dog_friendly: bool,
    #[serde(default)]
    pub bottle_refill: bool,
    #[serde(rename = "type", default)]
    pub fountain_type: FountainType,
    /// Mean of all general ratings, 0 when unrated.
    #[serde(default)]
    pub average_general_rating: f64,
    #[serde(default)]
    pub number_of_ratings: u32,
    #[serde(default)]
    pub status: FountainStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
}

impl Fountain {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn is_rated(&self) -> bool {
        self.number_of_ratings > 0
    }
}

/// Paginated proximity response: `GET /fountains/{longitude},{latitude}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FountainPage {
    pub items: Vec<Fountain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}
