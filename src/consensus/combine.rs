use crate::consensus::reliability::classify;
use crate::consensus::types::{CombinedEntry, CombinedSeries};
use crate::consensus::utility::{mean, round_tenth};
use crate::record::{NormalizedRecord, SourceMap};
use std::collections::BTreeMap;

/// Minimum number of distinct providers that must report a timestamp.
pub const QUORUM: usize = 2;

/// Reconciles one location's providers into a single series.
///
/// Keeps every canonical timestamp reported by at least [`QUORUM`] providers
/// and emits one [`CombinedEntry`] per kept timestamp, ascending by time.
/// Providers are visited in the map's priority order, which fixes both the
/// description tie-break and the order of `sources_used`.
///
/// Pure: no I/O, and the same map always yields the same series.
pub fn combine_location(sources: &SourceMap) -> CombinedSeries {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, series) in sources.iter() {
        for time in series.keys() {
            *counts.entry(time.as_str()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .filter(|&(_, n)| n >= QUORUM)
        .map(|(time, _)| combine_hour(sources, time))
        .collect()
}

fn combine_hour(sources: &SourceMap, time: &str) -> CombinedEntry {
    let contributors: Vec<(&str, &NormalizedRecord)> = sources
        .iter()
        .filter_map(|(id, series)| series.get(time).map(|r| (id, r)))
        .collect();

    let temps: Vec<f64> = contributors.iter().map(|(_, r)| r.temperature()).collect();
    let descs: Vec<&str> = contributors.iter().map(|(_, r)| r.description()).collect();

    CombinedEntry {
        time: time.to_string(),
        average_temperature: round_tenth(mean(&temps)),
        description: majority_description(&descs).unwrap_or_default().to_string(),
        reliability: classify(&temps),
        sources_used: contributors.iter().map(|(id, _)| id.to_string()).collect(),
    }
}

/// Most frequent description; ties go to the one seen first.
pub fn majority_description<'a>(descs: &[&'a str]) -> Option<&'a str> {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for &d in descs {
        match tally.iter_mut().find(|(seen, _)| *seen == d) {
            Some((_, n)) => *n += 1,
            None => tally.push((d, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (d, n) in tally {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((d, n));
        }
    }
    best.map(|(d, _)| d)
}
