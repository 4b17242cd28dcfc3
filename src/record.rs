//! The per-hour observation shape every provider is reduced to, and the
//! per-location map the reconciliation engine consumes.

use std::collections::BTreeMap;

/// Description used when a provider reports no condition text.
pub const UNKNOWN_DESCRIPTION: &str = "unknown";

/// One provider's forecast for one canonical hour.
///
/// Fields are private so a record cannot change after an adapter produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    time: String,
    temperature: f64,
    description: String,
    source: String,
}

impl NormalizedRecord {
    /// Builds a record. `time` must already be canonical; the description is
    /// trimmed and lower-cased, and an empty one becomes [`UNKNOWN_DESCRIPTION`].
    pub fn new(
        time: impl Into<String>,
        temperature: f64,
        description: Option<&str>,
        source: impl Into<String>,
    ) -> Self {
        let description = match description.map(str::trim) {
            Some(d) if !d.is_empty() => d.to_lowercase(),
            _ => UNKNOWN_DESCRIPTION.to_string(),
        };

        Self {
            time: time.into(),
            temperature,
            description,
            source: source.into(),
        }
    }

    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Records of a single provider keyed by canonical timestamp.
pub type SourceSeries = BTreeMap<String, NormalizedRecord>;

/// Provider id → canonical timestamp → record, for one location.
///
/// Providers are kept in insertion order, which callers must make equal to
/// the declared provider priority: the engine iterates in this order for
/// description tie-breaks and `sources_used`.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    sources: Vec<(String, SourceSeries)>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the series of `provider`.
    ///
    /// Records that share a canonical timestamp collapse to the last one.
    /// Providers with no records are not added.
    pub fn insert(
        &mut self,
        provider: impl Into<String>,
        records: impl IntoIterator<Item = NormalizedRecord>,
    ) {
        let provider = provider.into();
        let mut series = SourceSeries::new();
        for record in records {
            series.insert(record.time.clone(), record);
        }

        if series.is_empty() {
            self.sources.retain(|(id, _)| *id != provider);
            return;
        }

        match self.sources.iter_mut().find(|(id, _)| *id == provider) {
            Some((_, existing)) => *existing = series,
            None => self.sources.push((provider, series)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of providers with at least one record.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn get(&self, provider: &str) -> Option<&SourceSeries> {
        self.sources
            .iter()
            .find(|(id, _)| id == provider)
            .map(|(_, series)| series)
    }

    /// Iterates providers in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceSeries)> {
        self.sources
            .iter()
            .map(|(id, series)| (id.as_str(), series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(time: &str, temp: f64, source: &str) -> NormalizedRecord {
        NormalizedRecord::new(time, temp, Some("Clear"), source)
    }

    #[test]
    fn test_description_is_lowercased_and_defaulted() {
        let r = NormalizedRecord::new("2025-08-07 15:00:00", 20.0, Some("  Partly Cloudy "), "yr");
        assert_eq!(r.description(), "partly cloudy");

        let r = NormalizedRecord::new("2025-08-07 15:00:00", 20.0, None, "yr");
        assert_eq!(r.description(), UNKNOWN_DESCRIPTION);

        let r = NormalizedRecord::new("2025-08-07 15:00:00", 20.0, Some(""), "yr");
        assert_eq!(r.description(), UNKNOWN_DESCRIPTION);
    }

    #[test]
    fn test_duplicate_timestamps_last_write_wins() {
        let mut map = SourceMap::new();
        map.insert(
            "smhi",
            vec![
                rec("2025-08-07 15:00:00", 18.0, "smhi"),
                rec("2025-08-07 15:00:00", 19.5, "smhi"),
            ],
        );

        let series = map.get("smhi").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series["2025-08-07 15:00:00"].temperature(), 19.5);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut map = SourceMap::new();
        map.insert("yr", vec![rec("2025-08-07 15:00:00", 18.0, "yr")]);
        map.insert("openweather", vec![rec("2025-08-07 15:00:00", 18.0, "openweather")]);
        map.insert("yr", vec![rec("2025-08-07 16:00:00", 17.0, "yr")]);

        let ids: Vec<_> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["yr", "openweather"]);
        assert!(map.get("yr").unwrap().contains_key("2025-08-07 16:00:00"));
    }

    #[test]
    fn test_empty_provider_is_not_added() {
        let mut map = SourceMap::new();
        map.insert("msn", Vec::new());
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }
}
