//! Runtime configuration: which locations to forecast, which providers to
//! read (in priority order) and where their artifacts live.
//!
//! Stored as a JSON file on disk; every field is optional:
//! ```json
//! {
//!   "data_dir": "data",
//!   "timezone": "Europe/Stockholm",
//!   "locations": [{ "name": "umeå", "latitude": 63.82, "longitude": 20.26 }],
//!   "providers": [
//!     { "id": "smhi", "artifact": "weather_smhi_{location}.json" },
//!     { "id": "yr", "artifact": "{location}_yr.json" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::providers::ProviderId;

/// A forecast location with fixed coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    /// ASCII slug for URLs: lower-case, å/ä → a, ö → o, spaces → '-'.
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'å' | 'ä' => 'a',
                'ö' => 'o',
                ' ' => '-',
                other => other,
            })
            .collect()
    }
}

/// One entry of the provider priority list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    /// Artifact filename template; `{location}` is replaced by the location name.
    pub artifact: String,
}

impl ProviderConfig {
    pub fn artifact_path(&self, data_dir: &Path, location: &str) -> PathBuf {
        data_dir.join(self.artifact.replace("{location}", location))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// IANA zone every adapter reports wall-clock time in.
    pub timezone: String,
    pub locations: Vec<Location>,
    /// Declared provider priority; list order drives reconciliation order.
    pub providers: Vec<ProviderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let provider = |id: ProviderId, artifact: &str| ProviderConfig {
            id,
            artifact: artifact.to_string(),
        };

        Self {
            data_dir: PathBuf::from("data"),
            timezone: "Europe/Stockholm".to_string(),
            locations: vec![
                Location::new("eskilstuna", 59.37, 16.51),
                Location::new("stockholm", 59.33, 18.06),
                Location::new("göteborg", 57.71, 11.97),
                Location::new("lomma", 55.68, 13.07),
                Location::new("malmö", 55.60, 13.00),
                Location::new("umeå", 63.82, 20.26),
            ],
            providers: vec![
                provider(ProviderId::OpenWeather, "{location}.json"),
                provider(ProviderId::Smhi, "weather_smhi_{location}.json"),
                provider(ProviderId::Yr, "{location}_yr.json"),
                provider(ProviderId::WeatherApi, "weatherapi_{location}.json"),
                provider(ProviderId::Msn, "msn_{location}.json"),
                provider(ProviderId::OpenMeteo, "openmeteo_{location}.json"),
            ],
        }
    }
}

impl AppConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects unknown time zones and provider ids listed twice.
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        for (i, p) in self.providers.iter().enumerate() {
            if self.providers[..i].iter().any(|q| q.id == p.id) {
                anyhow::bail!("provider {} listed more than once", p.id);
            }
            if !p.artifact.contains("{location}") {
                anyhow::bail!("artifact template for {} lacks {{location}}", p.id);
            }
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {e}", self.timezone))
    }

    /// Where adapters keep snapshots of raw upstream responses.
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn provider(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }
}
