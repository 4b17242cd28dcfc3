//! Per-provider JSON artifacts: the hand-off between a fetch run and a
//! later combine run.
//!
//! Each provider writes its records in the layout its
//! [`ArtifactShape`] declares. Reading tolerates partial data: entries
//! missing `time` or `temp` are dropped, a missing `desc` becomes `unknown`,
//! and every time goes through the time normalizer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::ForecastError;
use crate::output::write_json;
use crate::providers::ArtifactShape;
use crate::record::NormalizedRecord;
use crate::time::{normalize_date_hour, normalize_time};

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEntry {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    temp: Option<f64>,
    #[serde(default)]
    desc: Option<String>,
}

impl ArtifactEntry {
    fn from_record(time: &str, record: &NormalizedRecord) -> Self {
        Self {
            time: Some(time.to_string()),
            temp: Some(record.temperature()),
            desc: Some(record.description().to_string()),
        }
    }
}

type DateKeyed = BTreeMap<String, Vec<ArtifactEntry>>;

/// Reads `provider`'s artifact at `path` into records.
///
/// # Errors
///
/// Every failure is reported as [`ForecastError::ProviderDataMissing`]: a
/// missing or unreadable file, JSON that does not match `shape`, or a file
/// without a single usable entry.
pub fn read_artifact(
    path: &Path,
    provider: &str,
    location: &str,
    shape: ArtifactShape,
) -> Result<Vec<NormalizedRecord>, ForecastError> {
    let missing = |reason: String| ForecastError::missing(provider, location, reason);

    if !path.exists() {
        return Err(missing(format!("{} not found", path.display())));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| missing(format!("reading {}: {e}", path.display())))?;

    let records = parse_artifact(&content, provider, shape)
        .map_err(|e| missing(format!("{} is not a {shape:?} artifact: {e}", path.display())))?;

    if records.is_empty() {
        return Err(missing(format!("{} has no usable entries", path.display())));
    }

    debug!(provider, location, records = records.len(), "Read artifact");
    Ok(records)
}

/// Parses artifact text in the given shape.
pub fn parse_artifact(
    content: &str,
    provider: &str,
    shape: ArtifactShape,
) -> serde_json::Result<Vec<NormalizedRecord>> {
    let record = |time: String, e: &ArtifactEntry| {
        e.temp
            .map(|temp| NormalizedRecord::new(time, temp, e.desc.as_deref(), provider))
    };

    let records = match shape {
        ArtifactShape::Flat => {
            let entries: Vec<ArtifactEntry> = serde_json::from_str(content)?;
            entries
                .iter()
                .filter_map(|e| record(normalize_time(e.time.as_deref()?), e))
                .collect()
        }
        ArtifactShape::DateKeyed => {
            let days: DateKeyed = serde_json::from_str(content)?;
            days.iter()
                .flat_map(|(date, hours)| hours.iter().map(move |h| (date, h)))
                .filter_map(|(date, h)| record(normalize_date_hour(date, h.time.as_deref()?), h))
                .collect()
        }
    };

    Ok(records)
}

/// Writes `records` to `path` in the given shape.
pub fn write_artifact(
    path: &Path,
    shape: ArtifactShape,
    records: &[NormalizedRecord],
) -> anyhow::Result<()> {
    match shape {
        ArtifactShape::Flat => {
            let entries: Vec<ArtifactEntry> = records
                .iter()
                .map(|r| ArtifactEntry::from_record(r.time(), r))
                .collect();
            write_json(path, &entries)
        }
        ArtifactShape::DateKeyed => {
            let mut days = DateKeyed::new();
            for r in records {
                // Canonical "YYYY-MM-DD HH:MM:SS" splits into the date key and "HH:MM".
                let (date, clock) = r.time().split_once(' ').unwrap_or((r.time(), ""));
                let hour = clock.get(..5).unwrap_or(clock);
                days.entry(date.to_string())
                    .or_default()
                    .push(ArtifactEntry::from_record(hour, r));
            }
            write_json(path, &days)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(time: &str, temp: f64, desc: &str) -> NormalizedRecord {
        NormalizedRecord::new(time, temp, Some(desc), "yr")
    }

    #[test]
    fn test_parse_flat_skips_incomplete_entries() {
        let content = r#"[
            {"time": "2025-08-07T15:00:00Z", "temp": 20.5, "desc": "Clear"},
            {"time": "2025-08-07 16:00", "temp": 19.0},
            {"time": "2025-08-07 17:00:00", "desc": "rain"},
            {"temp": 18.0, "desc": "rain"}
        ]"#;

        let records = parse_artifact(content, "smhi", ArtifactShape::Flat).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].time(), "2025-08-07 15:00:00");
        assert_eq!(records[0].description(), "clear");
        assert_eq!(records[0].source(), "smhi");
        assert_eq!(records[1].time(), "2025-08-07 16:00:00");
        assert_eq!(records[1].description(), "unknown");
    }

    #[test]
    fn test_parse_date_keyed() {
        let content = r#"{
            "2025-08-07": [
                {"time": "15:00", "temp": 20.0, "desc": "cloudy"},
                {"temp": 21.0, "desc": "cloudy"}
            ],
            "2025-08-08": [{"time": "00:00", "temp": 14.0, "desc": "clearsky"}]
        }"#;

        let records = parse_artifact(content, "yr", ArtifactShape::DateKeyed).unwrap();
        let times: Vec<_> = records.iter().map(|r| r.time()).collect();
        assert_eq!(times, vec!["2025-08-07 15:00:00", "2025-08-08 00:00:00"]);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        assert!(parse_artifact("[]", "yr", ArtifactShape::DateKeyed).is_err());
        assert!(parse_artifact(r#"{"temp": 20.0}"#, "smhi", ArtifactShape::Flat).is_err());
    }

    #[test]
    fn test_read_missing_file_is_provider_data_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_artifact(
            &dir.path().join("msn_lomma.json"),
            "msn",
            "lomma",
            ArtifactShape::Flat,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::ProviderDataMissing { ref provider, ref location, .. }
                if provider == "msn" && location == "lomma"
        ));
    }

    #[test]
    fn test_read_empty_list_is_provider_data_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(read_artifact(&path, "smhi", "umeå", ArtifactShape::Flat).is_err());
    }

    #[test]
    fn test_write_then_read_date_keyed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umeå_yr.json");
        let records = vec![
            rec("2025-08-07 23:00:00", 12.0, "cloudy"),
            rec("2025-08-08 00:00:00", 11.5, "fog"),
        ];

        write_artifact(&path, ArtifactShape::DateKeyed, &records).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["2025-08-07"][0]["time"], "23:00");
        assert_eq!(raw["2025-08-08"][0]["temp"], 11.5);

        let back = read_artifact(&path, "yr", "umeå", ArtifactShape::DateKeyed).unwrap();
        assert_eq!(back, records);
    }
}
