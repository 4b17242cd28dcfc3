//! Output formatting and persistence for artifacts and combined forecasts.
//!
//! Supports log rendering and atomic pretty-printed JSON files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::consensus::types::CombinedSeries;

/// Logs a combined series one line per hour at `debug`.
pub fn print_pretty(location: &str, series: &CombinedSeries) {
    for e in series {
        debug!(
            location,
            time = %e.time,
            avg_temp = e.average_temperature,
            desc = %e.description,
            reliability = e.reliability.as_str(),
            sources = e.sources_used.len(),
            "Combined hour"
        );
    }
}

/// Renders `value` as pretty-printed JSON with non-ASCII kept verbatim.
pub fn to_json_pretty(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes `value` as pretty JSON to `path`.
///
/// Writes a sibling temp file first and renames it into place, so readers
/// never observe a half-written file. Creates the parent directory if needed.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    let body = to_json_pretty(value)?;
    fs::write(tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(tmp, path).with_context(|| format!("replacing {}", path.display()))?;

    debug!(path = %path.display(), "Wrote JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::reliability::Reliability;
    use crate::consensus::types::CombinedEntry;

    fn series() -> CombinedSeries {
        vec![CombinedEntry {
            time: "2025-08-07 15:00:00".into(),
            average_temperature: 21.3,
            description: "partly cloudy".into(),
            reliability: Reliability::Medium,
            sources_used: vec!["openweather".into(), "yr".into(), "weatherapi".into()],
        }]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty("stockholm", &series());
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&to_json_pretty(&series()).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "time": "2025-08-07 15:00:00",
                "avg_temp": 21.3,
                "desc": "partly cloudy",
                "reliability": "medium",
                "sources_used": ["openweather", "yr", "weatherapi"]
            }])
        );
    }

    #[test]
    fn test_non_ascii_is_kept() {
        let text = to_json_pretty(&vec!["göteborg"]).unwrap();
        assert!(text.contains("göteborg"));
    }

    #[test]
    fn test_write_json_creates_dirs_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("combined_umeå.json");

        write_json(&path, &vec![1, 2]).unwrap();
        write_json(&path, &vec![3]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let back: Vec<i32> = serde_json::from_str(&content).unwrap();
        assert_eq!(back, vec![3]);
        assert!(!dir.path().join("nested").join("combined_umeå.json.tmp").exists());
    }
}
