//! Collaborator traits the engine depends on.
//!
//! The engine runs on a single-threaded event loop, so the futures these
//! traits return are not required to be `Send`.

use async_trait::async_trait;

use crate::error::{PositionError, Result};
use crate::fountain::Fountain;
use crate::location::Coordinates;

/// Proximity and single-fountain reads against the backend.
#[async_trait(?Send)]
pub trait FountainSource {
    /// `GET /fountains/{longitude},{latitude}`: fountains ordered by proximity.
    async fn nearby(&self, at: Coordinates) -> Result<Vec<Fountain>>;

    /// `GET /fountains/{id}`
    async fn fountain(&self, id: i64) -> Result<Fountain>;
}

/// IP-based geolocation, the approximate fallback tier.
#[async_trait(?Send)]
pub trait IpLocator {
    async fn locate(&self) -> Result<Coordinates>;
}

/// The platform's high-accuracy position source.
#[async_trait(?Send)]
pub trait PositionSource {
    async fn current_position(&self) -> std::result::Result<Coordinates, PositionError>;
}

/// A precise position supplied up front, e.g. from command-line flags.
///
/// Without coordinates it behaves like a platform with no positioning
/// hardware and always reports [`PositionError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPosition(pub Option<Coordinates>);

#[async_trait(?Send)]
impl PositionSource for StaticPosition {
    async fn current_position(&self) -> std::result::Result<Coordinates, PositionError> {
        self.0.ok_or(PositionError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_position_without_coordinates_is_unsupported() {
        let source = StaticPosition(None);
        assert_eq!(
            source.current_position().await,
            Err(PositionError::Unsupported)
        );
    }

    #[tokio::test]
    async fn static_position_reports_its_coordinates() {
        let here = Coordinates::new(32.0853, 34.7818);
        let source = StaticPosition(Some(here));
        assert_eq!(source.current_position().await, Ok(here));
    }
}
