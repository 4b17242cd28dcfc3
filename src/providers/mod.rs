//! Provider adapters.
//!
//! Each adapter fetches one provider's forecast for a location and reduces
//! the provider's own payload shape to [`NormalizedRecord`]s in local
//! wall-clock time. Payload parsing is kept in pure `parse_*` functions so it
//! can be tested without a network.

pub mod msn;
pub mod openmeteo;
pub mod openweather;
pub mod smhi;
pub mod weatherapi;
pub mod yr;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{AppConfig, Location};
use crate::fetch::auth::{StaticHeader, UrlParam};
use crate::fetch::BasicClient;
use crate::output::write_json;
use crate::record::NormalizedRecord;

/// Identifies the caller to providers that require it.
pub const USER_AGENT: &str = concat!(
    "vader_combiner/",
    env!("CARGO_PKG_VERSION")
);

/// The known providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenWeather,
    Smhi,
    Yr,
    WeatherApi,
    Msn,
    OpenMeteo,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        Self::OpenWeather,
        Self::Smhi,
        Self::Yr,
        Self::WeatherApi,
        Self::Msn,
        Self::OpenMeteo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenWeather => "openweather",
            Self::Smhi => "smhi",
            Self::Yr => "yr",
            Self::WeatherApi => "weatherapi",
            Self::Msn => "msn",
            Self::OpenMeteo => "openmeteo",
        }
    }

    /// How this provider's artifact is laid out on disk.
    pub fn artifact_shape(&self) -> ArtifactShape {
        match self {
            Self::Yr => ArtifactShape::DateKeyed,
            _ => ArtifactShape::Flat,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown provider '{s}'"))
    }
}

/// On-disk artifact layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactShape {
    /// `[{"time", "temp", "desc"}, ...]`
    Flat,
    /// `{"YYYY-MM-DD": [{"time": "HH:MM", "temp", "desc"}, ...], ...}`
    DateKeyed,
}

/// Produces normalized hourly records for a location.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>>;
}

/// JSON `body` with the array at the JSON pointer `head.0` cut to its first
/// `head.1` items. `None` when the body is not JSON.
pub fn raw_snapshot(body: &[u8], head: Option<(&str, usize)>) -> Option<serde_json::Value> {
    let mut value: serde_json::Value = serde_json::from_slice(body).ok()?;
    if let Some((pointer, keep)) = head {
        if let Some(items) = value.pointer_mut(pointer).and_then(|v| v.as_array_mut()) {
            items.truncate(keep);
        }
    }
    Some(value)
}

/// Saves a snapshot of an upstream response as
/// `<dir>/<provider>_<location>.json`.
///
/// Failures are logged and never affect the fetch.
pub fn save_raw(
    dir: &Path,
    provider: ProviderId,
    location: &str,
    body: &[u8],
    head: Option<(&str, usize)>,
) {
    let Some(snapshot) = raw_snapshot(body, head) else {
        warn!(%provider, location, "Response is not JSON, raw snapshot skipped");
        return;
    };

    let path = dir.join(format!("{provider}_{location}.json"));
    match write_json(&path, &snapshot) {
        Ok(()) => debug!(path = %path.display(), "Raw response saved"),
        Err(e) => warn!(error = %format_args!("{e:#}"), "Failed to save raw response"),
    }
}

/// Provider API keys, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openweather: Option<String>,
    pub weatherapi: Option<String>,
}

impl ApiKeys {
    /// Reads `OWM_API_KEY` and `WEATHERAPI_KEY`; blank values count as missing.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openweather: var("OWM_API_KEY"),
            weatherapi: var("WEATHERAPI_KEY"),
        }
    }
}

/// Builds adapters for the configured providers, in priority order.
///
/// `only` restricts the set when non-empty. Providers that need a key that
/// is not available are returned in the second list instead.
pub fn build_providers(
    config: &AppConfig,
    keys: &ApiKeys,
    only: &[ProviderId],
) -> Result<(Vec<Arc<dyn ForecastProvider>>, Vec<ProviderId>)> {
    let tz = config.tz()?;
    let raw_dir = config.raw_dir();
    let mut providers: Vec<Arc<dyn ForecastProvider>> = Vec::new();
    let mut skipped = Vec::new();

    for id in config.providers.iter().map(|p| p.id) {
        if !only.is_empty() && !only.contains(&id) {
            continue;
        }

        let provider: Option<Arc<dyn ForecastProvider>> = match id {
            ProviderId::OpenWeather => keys.openweather.as_deref().map(|key| {
                Arc::new(openweather::OpenWeather::new(
                    UrlParam::new(BasicClient::new(), "appid", key),
                    tz,
                )) as Arc<dyn ForecastProvider>
            }),
            ProviderId::Smhi => Some(Arc::new(
                smhi::Smhi::new(BasicClient::new(), tz).with_raw_dir(&raw_dir),
            )),
            ProviderId::Yr => Some(Arc::new(
                yr::Yr::new(
                    StaticHeader::user_agent(BasicClient::new(), USER_AGENT)?,
                    tz,
                )
                .with_raw_dir(&raw_dir),
            )),
            ProviderId::WeatherApi => keys.weatherapi.as_deref().map(|key| {
                Arc::new(
                    weatherapi::WeatherApi::new(UrlParam::new(BasicClient::new(), "key", key), tz)
                        .with_raw_dir(&raw_dir),
                ) as Arc<dyn ForecastProvider>
            }),
            ProviderId::Msn => Some(Arc::new(msn::Msn::new(
                StaticHeader::user_agent(BasicClient::new(), USER_AGENT)?,
                tz,
            ))),
            ProviderId::OpenMeteo => {
                Some(Arc::new(openmeteo::OpenMeteo::new(BasicClient::new(), tz)))
            }
        };

        match provider {
            Some(p) => providers.push(p),
            None => {
                warn!(provider = %id, "API key missing, provider skipped");
                skipped.push(id);
            }
        }
    }

    Ok((providers, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip_through_text() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>(), Ok(id));
            assert_eq!(
                serde_json::to_string(&id).unwrap(),
                format!("\"{}\"", id.as_str())
            );
        }
        assert_eq!("YR".parse::<ProviderId>(), Ok(ProviderId::Yr));
        assert!("accuweather".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_only_yr_is_date_keyed() {
        for id in ProviderId::ALL {
            let expected = if id == ProviderId::Yr {
                ArtifactShape::DateKeyed
            } else {
                ArtifactShape::Flat
            };
            assert_eq!(id.artifact_shape(), expected);
        }
    }

    #[test]
    fn test_build_skips_keyed_providers_without_keys() {
        let config = AppConfig::default();
        let (providers, skipped) = build_providers(&config, &ApiKeys::default(), &[]).unwrap();

        let ids: Vec<_> = providers.iter().map(|p| p.id()).collect();
        assert_eq!(
            ids,
            vec![
                ProviderId::Smhi,
                ProviderId::Yr,
                ProviderId::Msn,
                ProviderId::OpenMeteo
            ]
        );
        assert_eq!(skipped, vec![ProviderId::OpenWeather, ProviderId::WeatherApi]);
    }

    #[test]
    fn test_build_respects_filter() {
        let config = AppConfig::default();
        let keys = ApiKeys {
            openweather: Some("k".into()),
            weatherapi: None,
        };
        let (providers, skipped) =
            build_providers(&config, &keys, &[ProviderId::OpenWeather, ProviderId::Smhi])
                .unwrap();

        let ids: Vec<_> = providers.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![ProviderId::OpenWeather, ProviderId::Smhi]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_raw_snapshot_keeps_head_of_series() {
        let body = br#"{"approvedTime": "x", "timeSeries": [1, 2, 3, 4, 5]}"#;

        let head = raw_snapshot(body, Some(("/timeSeries", 3))).unwrap();
        assert_eq!(head, serde_json::json!({"approvedTime": "x", "timeSeries": [1, 2, 3]}));

        let full = raw_snapshot(body, None).unwrap();
        assert_eq!(full["timeSeries"].as_array().unwrap().len(), 5);

        let missing = raw_snapshot(body, Some(("/properties/timeseries", 3))).unwrap();
        assert_eq!(missing, full);

        assert!(raw_snapshot(b"<html>", None).is_none());
    }

    #[test]
    fn test_save_raw_writes_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");

        save_raw(&raw, ProviderId::WeatherApi, "malmö", br#"{"forecast": {}}"#, None);
        save_raw(&raw, ProviderId::Smhi, "malmö", b"not json", None);

        let written = std::fs::read_to_string(raw.join("weatherapi_malmö.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value, serde_json::json!({"forecast": {}}));
        assert!(!raw.join("smhi_malmö.json").exists());
    }
}
