//! Connection and engine settings shared by every subcommand.

use anyhow::{bail, Context};
use berez_api::client::{ApiClient, DEFAULT_API_URL};
use berez_api::ip::{IpApiLocator, DEFAULT_IP_LOCATOR_URL};
use berez_api::location::Coordinates;
use berez_api::source::StaticPosition;
use berez_state::{FilePreferenceStore, Session, SessionConfig, ViewStateController};
use clap::Args;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

const PREFS_FILE: &str = "berez-prefs.json";

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Base URL of the Berez backend
    #[arg(long, env = "BEREZ_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// IP geolocation endpoint returning { lat, lon }
    #[arg(long, env = "BEREZ_IP_LOCATOR_URL", default_value = DEFAULT_IP_LOCATOR_URL)]
    pub ip_locator_url: String,

    /// Bearer token for reviews and submissions
    #[arg(long, env = "BEREZ_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Preference file holding the last view mode
    #[arg(long, env = "BEREZ_PREFS")]
    pub prefs: Option<PathBuf>,

    /// Precise latitude; without --lat/--lon the IP lookup is used
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Precise longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Seconds to wait for the precise position (5-10)
    #[arg(long, default_value_t = 10)]
    pub precise_timeout: u64,

    /// Seconds between refreshes in watch mode
    #[arg(long, default_value_t = 30)]
    pub refresh_interval: u64,
}

impl Config {
    pub fn api_client(&self) -> anyhow::Result<ApiClient> {
        let client = ApiClient::new(&self.api_url)
            .with_context(|| format!("Failed to build client for {}", self.api_url))?;
        Ok(client.with_token(self.token.clone()))
    }

    pub fn ip_locator(&self) -> anyhow::Result<IpApiLocator> {
        Ok(IpApiLocator::new(&self.ip_locator_url)?)
    }

    pub fn position_source(&self) -> anyhow::Result<StaticPosition> {
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => {
                if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                    bail!("--lat/--lon out of range: {}, {}", latitude, longitude);
                }
                Ok(StaticPosition(Some(Coordinates::new(latitude, longitude))))
            }
            _ => Ok(StaticPosition(None)),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            refresh_interval: Duration::from_secs(self.refresh_interval.max(1)),
            precise_timeout: Duration::from_secs(self.precise_timeout),
        }
    }

    /// `--prefs`, else `~/.config/berez/prefs.json`, else `./berez-prefs.json`.
    pub fn prefs_path(&self) -> PathBuf {
        if let Some(path) = &self.prefs {
            return path.clone();
        }
        match std::env::var_os("HOME").filter(|home| !home.is_empty()) {
            Some(home) => PathBuf::from(home).join(".config").join("berez").join("prefs.json"),
            None => PathBuf::from(PREFS_FILE),
        }
    }

    pub fn view(&self, param: Option<&str>) -> ViewStateController {
        ViewStateController::open(FilePreferenceStore::new(self.prefs_path()), param)
    }

    /// Wire up a session against the configured backend. The client is
    /// returned as well for the endpoints the engine does not cover.
    pub fn open_session(&self, view_param: Option<&str>) -> anyhow::Result<(Session, ApiClient)> {
        let client = self.api_client()?;
        let session = Session::new(
            self.position_source()?,
            self.ip_locator()?,
            Rc::new(client.clone()),
            self.view(view_param),
            self.session_config(),
        );
        Ok((session, client))
    }
}
