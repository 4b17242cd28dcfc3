//! SMHI point forecast (`pmp3g`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ForecastProvider, ProviderId, save_raw};
use crate::config::Location;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::record::NormalizedRecord;
use crate::time::to_local_canonical;

pub const BASE_URL: &str = "https://opendata-download-metfcst.smhi.se";

/// Forecast steps kept in the raw snapshot.
const RAW_STEPS: usize = 3;

#[derive(Debug, Deserialize)]
struct SmhiResponse {
    #[serde(rename = "timeSeries", default)]
    time_series: Vec<SmhiStep>,
}

#[derive(Debug, Deserialize)]
struct SmhiStep {
    #[serde(rename = "validTime")]
    valid_time: String,
    #[serde(default)]
    parameters: Vec<SmhiParameter>,
}

#[derive(Debug, Deserialize)]
struct SmhiParameter {
    name: String,
    #[serde(default)]
    values: Vec<f64>,
}

impl SmhiStep {
    fn value(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.values.first().copied())
    }
}

/// Text for SMHI's `Wsymb2` weather symbol.
pub fn symbol_text(symbol: u8) -> Option<&'static str> {
    let text = match symbol {
        1 => "clear sky",
        2 => "nearly clear sky",
        3 => "variable cloudiness",
        4 => "halfclear sky",
        5 => "cloudy sky",
        6 => "overcast",
        7 => "fog",
        8 => "light rain showers",
        9 => "moderate rain showers",
        10 => "heavy rain showers",
        11 => "thunderstorm",
        12 => "light sleet showers",
        13 => "moderate sleet showers",
        14 => "heavy sleet showers",
        15 => "light snow showers",
        16 => "moderate snow showers",
        17 => "heavy snow showers",
        18 => "light rain",
        19 => "moderate rain",
        20 => "heavy rain",
        21 => "thunder",
        22 => "light sleet",
        23 => "moderate sleet",
        24 => "heavy sleet",
        25 => "light snowfall",
        26 => "moderate snowfall",
        27 => "heavy snowfall",
        _ => return None,
    };
    Some(text)
}

/// Reduces an SMHI `data.json` body to records.
///
/// Steps without a temperature (`t`) or with an unparsable `validTime` are
/// skipped; an unknown symbol gives an `unknown` description.
pub fn parse_forecast(body: &[u8], tz: Tz) -> Result<Vec<NormalizedRecord>> {
    let response: SmhiResponse =
        serde_json::from_slice(body).context("decoding SMHI forecast")?;

    let records = response
        .time_series
        .iter()
        .filter_map(|step| {
            let instant = DateTime::parse_from_rfc3339(&step.valid_time).ok()?;
            let temp = step.value("t")?;
            let desc = step
                .value("Wsymb2")
                .and_then(|s| symbol_text(s as u8));
            Some(NormalizedRecord::new(
                to_local_canonical(&instant, tz),
                temp,
                desc,
                ProviderId::Smhi.as_str(),
            ))
        })
        .collect();

    Ok(records)
}

pub struct Smhi<C> {
    client: C,
    base_url: String,
    tz: Tz,
    raw_dir: Option<PathBuf>,
}

impl<C: HttpClient> Smhi<C> {
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

    /// Keep the first few steps of each response under `dir`.
    pub fn with_raw_dir(mut self, dir: &Path) -> Self {
        self.raw_dir = Some(dir.to_path_buf());
        self
    }
}

#[async_trait]
impl<C: HttpClient> ForecastProvider for Smhi<C> {
    fn id(&self) -> ProviderId {
        ProviderId::Smhi
    }

    #[tracing::instrument(skip(self, location), fields(provider = "smhi", location = %location.name))]
    async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>> {
        let url = format!(
            "{}/api/category/pmp3g/version/2/geotype/point/lon/{}/lat/{}/data.json",
            self.base_url, location.longitude, location.latitude
        );
        let body = fetch_bytes(&self.client, &url).await?;
        if let Some(dir) = &self.raw_dir {
            let head = Some(("/timeSeries", RAW_STEPS));
            save_raw(dir, ProviderId::Smhi, &location.name, &body, head);
        }
        let records = parse_forecast(&body, self.tz)?;
        debug!(records = records.len(), "Parsed SMHI forecast");
        Ok(records)
    }
}
