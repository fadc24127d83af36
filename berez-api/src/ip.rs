//! IP-based geolocation client, the approximate tier of the location chain.

use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::location::Coordinates;
use crate::source::IpLocator;

pub const DEFAULT_IP_LOCATOR_URL: &str = "http://ip-api.com/json";

/// The subset of the ip-api.com response we read. Other services returning
/// `{ lat, lon }` work as well.
#[derive(Debug, Deserialize)]
struct IpLookup {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IpApiLocator {
    client: Client,
    url: String,
}

impl IpApiLocator {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait(?Send)]
impl IpLocator for IpApiLocator {
    async fn locate(&self) -> Result<Coordinates> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                detail: "geolocation lookup rejected".to_string(),
            });
        }
        let lookup: IpLookup = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if lookup.status.as_deref() == Some("fail") {
            let reason = lookup.message.unwrap_or_else(|| "unknown reason".to_string());
            warn!("[Berez] ip: lookup failed: {}", reason);
            return Err(ApiError::Transport(format!(
                "geolocation service failed: {}",
                reason
            )));
        }
        match (lookup.lat, lookup.lon) {
            (Some(lat), Some(lon)) => {
                info!("[Berez] ip: approximate position {}, {}", lat, lon);
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(ApiError::Decode(
                "geolocation response is missing lat/lon".to_string(),
            )),
        }
    }
}
