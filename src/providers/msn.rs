//! MSN Weather portal page.
//!
//! The page embeds its data as a Next.js `__NEXT_DATA__` JSON script; the
//! hourly list lives under `props.pageProps.forecasts.hourly`.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::debug;

use super::{ForecastProvider, ProviderId};
use crate::config::Location;
use crate::fetch::{HttpClient, fetch_text};
use crate::record::NormalizedRecord;
use crate::time::{normalize_time, to_local_canonical};

pub const BASE_URL: &str = "https://www.msn.com";

fn next_data_re() -> &'static Regex {
    static NEXT_DATA_RE: OnceLock<Regex> = OnceLock::new();
    NEXT_DATA_RE.get_or_init(|| {
        Regex::new(r#"(?s)<script[^>]*\bid\s*=\s*["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
            .expect("valid __NEXT_DATA__ regex")
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NextData {
    props: Props,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageProps {
    forecasts: Forecasts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Forecasts {
    hourly: Vec<MsnHour>,
}

#[derive(Debug, Deserialize)]
struct MsnHour {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    temperature: Option<f64>,
    #[serde(rename = "iconPhrase")]
    icon_phrase: Option<String>,
}

/// Returns the body of the `__NEXT_DATA__` script tag, if present.
pub fn extract_next_data(html: &str) -> Option<&str> {
    next_data_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Reduces an MSN weather page to records.
///
/// `dateTime` values carry an offset and are converted to `tz`; values
/// without one are taken as local time.
///
/// # Errors
///
/// Fails when the page has no `__NEXT_DATA__` script, the script is not
/// JSON, or it holds no hourly list.
pub fn parse_page(html: &str, tz: Tz) -> Result<Vec<NormalizedRecord>> {
    let script = extract_next_data(html).ok_or_else(|| anyhow!("__NEXT_DATA__ not found"))?;
    let data: NextData = serde_json::from_str(script).context("decoding __NEXT_DATA__")?;

    let hourly = data.props.page_props.forecasts.hourly;
    if hourly.is_empty() {
        return Err(anyhow!("no hourly forecast in __NEXT_DATA__"));
    }

    let records = hourly
        .iter()
        .filter_map(|h| {
            let raw = h.date_time.as_deref()?;
            let time = match DateTime::parse_from_rfc3339(raw) {
                Ok(instant) => to_local_canonical(&instant, tz),
                Err(_) => normalize_time(raw),
            };
            let temp = h.temperature?;
            Some(NormalizedRecord::new(
                time,
                temp,
                h.icon_phrase.as_deref(),
                ProviderId::Msn.as_str(),
            ))
        })
        .collect();

    Ok(records)
}

pub struct Msn<C> {
    client: C,
    base_url: String,
    tz: Tz,
}

impl<C: HttpClient> Msn<C> {
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
impl<C: HttpClient> ForecastProvider for Msn<C> {
    fn id(&self) -> ProviderId {
        ProviderId::Msn
    }

    #[tracing::instrument(skip(self, location), fields(provider = "msn", location = %location.name))]
    async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>> {
        let url = format!("{}/en-us/weather/{}", self.base_url, location.slug());
        let html = fetch_text(&self.client, &url).await?;
        let records = parse_page(&html, self.tz)?;
        debug!(records = records.len(), "Parsed MSN page");
        Ok(records)
    }
}
