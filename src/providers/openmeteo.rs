//! Open-Meteo hourly forecast.
//!
//! Requested with `timezone=<tz>`, so `hourly.time` is already local
//! (`"2025-08-07T15:00"`) and only needs canonicalizing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use super::{ForecastProvider, ProviderId};
use crate::config::Location;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::record::NormalizedRecord;
use crate::time::normalize_time;

pub const BASE_URL: &str = "https://api.open-meteo.com";

#[derive(Debug, Deserialize)]
struct OmResponse {
    hourly: OmHourly,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<u16>>,
}

/// Text for a WMO weather interpretation code.
/// See: https://open-meteo.com/en/docs#weathervariables
pub fn wmo_text(code: u16) -> Option<&'static str> {
    let text = match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 => "fog",
        48 => "depositing rime fog",
        51 => "light drizzle",
        53 => "moderate drizzle",
        55 => "dense drizzle",
        56 => "light freezing drizzle",
        57 => "dense freezing drizzle",
        61 => "slight rain",
        63 => "moderate rain",
        65 => "heavy rain",
        66 => "light freezing rain",
        67 => "heavy freezing rain",
        71 => "slight snowfall",
        73 => "moderate snowfall",
        75 => "heavy snowfall",
        77 => "snow grains",
        80 => "slight rain showers",
        81 => "moderate rain showers",
        82 => "violent rain showers",
        85 => "slight snow showers",
        86 => "heavy snow showers",
        95 => "thunderstorm",
        96 => "thunderstorm with slight hail",
        99 => "thunderstorm with heavy hail",
        _ => return None,
    };
    Some(text)
}

/// Reduces a `/v1/forecast` body to records. The parallel `hourly` arrays
/// are zipped; a position without a temperature is skipped.
pub fn parse_forecast(body: &[u8]) -> Result<Vec<NormalizedRecord>> {
    let response: OmResponse =
        serde_json::from_slice(body).context("decoding Open-Meteo forecast")?;
    let hourly = response.hourly;

    let records = hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| {
            let temp = hourly.temperature_2m.get(i).copied().flatten()?;
            let desc = hourly
                .weathercode
                .get(i)
                .copied()
                .flatten()
                .and_then(wmo_text);
            Some(NormalizedRecord::new(
                normalize_time(raw),
                temp,
                desc,
                ProviderId::OpenMeteo.as_str(),
            ))
        })
        .collect();

    Ok(records)
}

pub struct OpenMeteo<C> {
    client: C,
    base_url: String,
    tz: Tz,
}

impl<C: HttpClient> OpenMeteo<C> {
    pub fn new(client: C, tz: Tz) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            tz,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl<C: HttpClient> ForecastProvider for OpenMeteo<C> {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    #[tracing::instrument(skip(self, location), fields(provider = "openmeteo", location = %location.name))]
    async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&hourly=temperature_2m,weathercode&timezone={}",
            self.base_url,
            location.latitude,
            location.longitude,
            self.tz.name()
        );
        let body = fetch_bytes(&self.client, &url).await?;
        let records = parse_forecast(&body)?;
        debug!(records = records.len(), "Parsed Open-Meteo forecast");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use chrono_tz::Europe::Stockholm;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = r#"{
        "latitude": 59.37,
        "longitude": 16.51,
        "timezone": "Europe/Stockholm",
        "hourly_units": { "time": "iso8601", "temperature_2m": "°C" },
        "hourly": {
            "time": ["2025-08-07T15:00", "2025-08-07T16:00", "2025-08-07T17:00"],
            "temperature_2m": [21.3, null, 19.8],
            "weathercode": [2, 3, 42]
        }
    }"#;

    #[test]
    fn test_parse_forecast() {
        let records = parse_forecast(BODY.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].time(), "2025-08-07 15:00:00");
        assert_eq!(records[0].description(), "partly cloudy");
        assert_eq!(records[1].time(), "2025-08-07 17:00:00");
        assert_eq!(records[1].description(), "unknown");
    }

    #[test]
    fn test_short_arrays_do_not_panic() {
        let body = br#"{"hourly": {"time": ["2025-08-07T15:00", "2025-08-07T16:00"], "temperature_2m": [20.0]}}"#;
        let records = parse_forecast(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description(), "unknown");
    }

    #[test]
    fn test_wmo_text() {
        assert_eq!(wmo_text(0), Some("clear sky"));
        assert_eq!(wmo_text(99), Some("thunderstorm with heavy hail"));
        assert_eq!(wmo_text(4), None);
    }

    #[tokio::test]
    async fn test_forecast_requests_local_timezone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("timezone", "Europe/Stockholm"))
            .and(query_param("hourly", "temperature_2m,weathercode"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;

        let om = OpenMeteo::new(BasicClient::new(), Stockholm).with_base_url(&server.uri());
        let records = om
            .forecast(&Location::new("eskilstuna", 59.37, 16.51))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }
}
