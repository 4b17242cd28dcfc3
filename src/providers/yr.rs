//! MET Norway `locationforecast/2.0/compact`, the API behind yr.no.
//!
//! Requests must carry an identifying `User-Agent`; wrap the client in
//! [`StaticHeader::user_agent`](crate::fetch::auth::StaticHeader::user_agent).

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

pub const BASE_URL: &str = "https://api.met.no";

/// Forecast steps kept in the raw snapshot.
const RAW_STEPS: usize = 3;

/// Symbol suffixes that only encode the sun's position.
const VARIANTS: &[&str] = &["_day", "_night", "_polartwilight"];

#[derive(Debug, Deserialize)]
struct YrResponse {
    properties: YrProperties,
}

#[derive(Debug, Deserialize)]
struct YrProperties {
    #[serde(default)]
    timeseries: Vec<YrStep>,
}

#[derive(Debug, Deserialize)]
struct YrStep {
    time: String,
    data: YrData,
}

#[derive(Debug, Deserialize)]
struct YrData {
    instant: YrInstant,
    next_1_hours: Option<YrPeriod>,
}

#[derive(Debug, Deserialize)]
struct YrInstant {
    details: YrDetails,
}

#[derive(Debug, Deserialize)]
struct YrDetails {
    air_temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YrPeriod {
    summary: YrSummary,
}

#[derive(Debug, Deserialize)]
struct YrSummary {
    symbol_code: String,
}

/// `"partlycloudy_day"` → `"partlycloudy"`, `"lightrainshowers_night"` →
/// `"lightrainshowers"`, `"heavy_rain"`-style codes get spaces.
pub fn symbol_text(code: &str) -> String {
    let base = VARIANTS
        .iter()
        .find_map(|v| code.strip_suffix(v))
        .unwrap_or(code);
    base.replace('_', " ")
}

/// Reduces a `compact` forecast body to records.
///
/// Only steps with a `next_1_hours` summary describe a single hour; later
/// six-hourly steps still carry a temperature and are kept with an
/// `unknown` description.
pub fn parse_forecast(body: &[u8], tz: Tz) -> Result<Vec<NormalizedRecord>> {
    let response: YrResponse =
        serde_json::from_slice(body).context("decoding MET Norway forecast")?;

    let records = response
        .properties
        .timeseries
        .iter()
        .filter_map(|step| {
            let instant = DateTime::parse_from_rfc3339(&step.time).ok()?;
            let temp = step.data.instant.details.air_temperature?;
            let desc = step
                .data
                .next_1_hours
                .as_ref()
                .map(|p| symbol_text(&p.summary.symbol_code));
            Some(NormalizedRecord::new(
                to_local_canonical(&instant, tz),
                temp,
                desc.as_deref(),
                ProviderId::Yr.as_str(),
            ))
        })
        .collect();

    Ok(records)
}

pub struct Yr<C> {
    client: C,
    base_url: String,
    tz: Tz,
    raw_dir: Option<PathBuf>,
}

impl<C: HttpClient> Yr<C> {
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
impl<C: HttpClient> ForecastProvider for Yr<C> {
    fn id(&self) -> ProviderId {
        ProviderId::Yr
    }

    #[tracing::instrument(skip(self, location), fields(provider = "yr", location = %location.name))]
    async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>> {
        // MET Norway asks for at most four decimals.
        let url = format!(
            "{}/weatherapi/locationforecast/2.0/compact?lat={:.4}&lon={:.4}",
            self.base_url, location.latitude, location.longitude
        );
        let body = fetch_bytes(&self.client, &url).await?;
        if let Some(dir) = &self.raw_dir {
            let head = Some(("/properties/timeseries", RAW_STEPS));
            save_raw(dir, ProviderId::Yr, &location.name, &body, head);
        }
        let records = parse_forecast(&body, self.tz)?;
        debug!(records = records.len(), "Parsed MET Norway forecast");
        Ok(records)
    }
}
