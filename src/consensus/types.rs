//! Data types produced by the reconciliation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::consensus::reliability::Reliability;

/// Reconciled forecast for one canonical hour of one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedEntry {
    pub time: String,
    #[serde(rename = "avg_temp")]
    pub average_temperature: f64,
    #[serde(rename = "desc")]
    pub description: String,
    pub reliability: Reliability,
    pub sources_used: Vec<String>,
}

/// Entries of one location, ordered by time.
pub type CombinedSeries = Vec<CombinedEntry>;

/// Location name → combined series for one reconciliation run.
pub type CombinedCorpus = BTreeMap<String, CombinedSeries>;

/// Per-location outcome of a driver run, used for the closing log summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSummary {
    pub location: String,
    pub providers: usize,
    pub entries: usize,
}
