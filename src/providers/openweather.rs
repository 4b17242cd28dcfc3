//! OpenWeatherMap 5 day / 3 hour forecast.
//!
//! The API key is sent as the `appid` query parameter by wrapping the client
//! in [`UrlParam`](crate::fetch::auth::UrlParam).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use super::{ForecastProvider, ProviderId};
use crate::config::Location;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::record::NormalizedRecord;
use crate::time::unix_to_local_canonical;

pub const BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Deserialize)]
struct OwmResponse {
    #[serde(default)]
    list: Vec<OwmItem>,
}

#[derive(Debug, Deserialize)]
struct OwmItem {
    dt: Option<i64>,
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    description: Option<String>,
}

/// Reduces a `/data/2.5/forecast` body (metric units) to records.
pub fn parse_forecast(body: &[u8], tz: Tz) -> Result<Vec<NormalizedRecord>> {
    let response: OwmResponse =
        serde_json::from_slice(body).context("decoding OpenWeatherMap forecast")?;

    let records = response
        .list
        .iter()
        .filter_map(|item| {
            let time = unix_to_local_canonical(item.dt?, tz)?;
            let temp = item.main.as_ref()?.temp?;
            let desc = item.weather.first().and_then(|w| w.description.as_deref());
            Some(NormalizedRecord::new(
                time,
                temp,
                desc,
                ProviderId::OpenWeather.as_str(),
            ))
        })
        .collect();

    Ok(records)
}

pub struct OpenWeather<C> {
    client: C,
    base_url: String,
    tz: Tz,
}

impl<C: HttpClient> OpenWeather<C> {
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
impl<C: HttpClient> ForecastProvider for OpenWeather<C> {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    #[tracing::instrument(skip(self, location), fields(provider = "openweather", location = %location.name))]
    async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>> {
        let url = format!(
            "{}/data/2.5/forecast?lat={}&lon={}&units=metric&lang=en",
            self.base_url, location.latitude, location.longitude
        );
        let body = fetch_bytes(&self.client, &url).await?;
        let records = parse_forecast(&body, self.tz)?;
        debug!(records = records.len(), "Parsed OpenWeatherMap forecast");
        Ok(records)
    }
}
