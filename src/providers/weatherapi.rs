//! WeatherAPI.com hourly forecast.
//!
//! Each hour carries both `time_epoch` and a `time` string local to the
//! queried point. The epoch is converted to the configured zone; the string
//! is only used when the epoch is missing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ForecastProvider, ProviderId, save_raw};
use crate::config::Location;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::record::NormalizedRecord;
use crate::time::{normalize_time, unix_to_local_canonical};

pub const BASE_URL: &str = "https://api.weatherapi.com";
const FORECAST_DAYS: u8 = 3;

#[derive(Debug, Deserialize)]
struct WaResponse {
    forecast: WaForecast,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    #[serde(default)]
    forecastday: Vec<WaDay>,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    #[serde(default)]
    hour: Vec<WaHour>,
}

#[derive(Debug, Deserialize)]
struct WaHour {
    time_epoch: Option<i64>,
    time: Option<String>,
    temp_c: Option<f64>,
    condition: Option<WaCondition>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: Option<String>,
}

/// Reduces a `/v1/forecast.json` body to records in `tz`.
pub fn parse_forecast(body: &[u8], tz: Tz) -> Result<Vec<NormalizedRecord>> {
    let response: WaResponse =
        serde_json::from_slice(body).context("decoding WeatherAPI forecast")?;

    let records = response
        .forecast
        .forecastday
        .iter()
        .flat_map(|day| day.hour.iter())
        .filter_map(|hour| {
            let time = match hour.time_epoch {
                Some(epoch) => unix_to_local_canonical(epoch, tz)?,
                None => normalize_time(hour.time.as_deref()?),
            };
            let temp = hour.temp_c?;
            let desc = hour.condition.as_ref().and_then(|c| c.text.as_deref());
            Some(NormalizedRecord::new(
                time,
                temp,
                desc,
                ProviderId::WeatherApi.as_str(),
            ))
        })
        .collect();

    Ok(records)
}

pub struct WeatherApi<C> {
    client: C,
    base_url: String,
    tz: Tz,
    raw_dir: Option<PathBuf>,
}

impl<C: HttpClient> WeatherApi<C> {
    pub fn new(client: C, tz: Tz) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
            tz,
            raw_dir: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Keep each full response under `dir`.
    pub fn with_raw_dir(mut self, dir: &Path) -> Self {
        self.raw_dir = Some(dir.to_path_buf());
        self
    }
}

#[async_trait]
impl<C: HttpClient> ForecastProvider for WeatherApi<C> {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    #[tracing::instrument(skip(self, location), fields(provider = "weatherapi", location = %location.name))]
    async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>> {
        let url = format!(
            "{}/v1/forecast.json?q={},{}&days={}&aqi=no&alerts=no",
            self.base_url, location.latitude, location.longitude, FORECAST_DAYS
        );
        let body = fetch_bytes(&self.client, &url).await?;
        if let Some(dir) = &self.raw_dir {
            save_raw(dir, ProviderId::WeatherApi, &location.name, &body, None);
        }
        let records = parse_forecast(&body, self.tz)?;
        debug!(records = records.len(), "Parsed WeatherAPI forecast");
        Ok(records)
    }
}
