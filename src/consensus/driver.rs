use crate::artifact::read_artifact;
use crate::config::AppConfig;
use crate::consensus::combine::combine_location;
use crate::consensus::types::{CombinedCorpus, CombinedSeries, LocationSummary};
use crate::error::ForecastError;
use crate::output::{print_pretty, write_json};
use crate::record::SourceMap;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

/// Reads every configured provider's artifact for `location`, in priority
/// order. Providers without usable data are logged and left out.
pub fn load_source_map(config: &AppConfig, location: &str) -> SourceMap {
    let mut sources = SourceMap::new();

    for provider in &config.providers {
        let path = provider.artifact_path(&config.data_dir, location);
        match read_artifact(&path, provider.id.as_str(), location, provider.id.artifact_shape()) {
            Ok(records) => {
                info!(provider = %provider.id, records = records.len(), "Loaded records");
                sources.insert(provider.id.as_str(), records);
            }
            Err(e) => warn!(error = %e, "Provider excluded"),
        }
    }

    sources
}

/// Builds and reconciles the source map for one location.
#[tracing::instrument(skip(config))]
pub fn combine_for_location(config: &AppConfig, location: &str) -> (CombinedSeries, usize) {
    let sources = load_source_map(config, location);
    if sources.is_empty() {
        let e = ForecastError::NoProvidersAvailable(location.to_string());
        warn!(error = %e, "Location skipped");
        return (Vec::new(), 0);
    }

    let series = combine_location(&sources);
    info!(
        providers = sources.len(),
        entries = series.len(),
        "Location combined"
    );
    print_pretty(location, &series);
    (series, sources.len())
}

/// Path of a location's combined output.
pub fn combined_path(config: &AppConfig, location: &str) -> PathBuf {
    config.data_dir.join(format!("combined_{location}.json"))
}

/// Path of the all-locations corpus.
pub fn corpus_path(config: &AppConfig) -> PathBuf {
    config.data_dir.join("combined.json")
}

/// Reconciles every configured location, writes `combined_<location>.json`
/// for each (an empty array when nothing was available) and then the
/// corpus as `combined.json`.
///
/// # Errors
///
/// Only file-system failures while writing outputs are errors; missing or
/// broken provider data never is.
#[tracing::instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn combine_all(config: &AppConfig) -> Result<(CombinedCorpus, Vec<LocationSummary>)> {
    let mut corpus = CombinedCorpus::new();
    let mut summaries = Vec::new();

    for location in &config.locations {
        let (series, providers) = combine_for_location(config, &location.name);

        write_json(&combined_path(config, &location.name), &series)?;

        summaries.push(LocationSummary {
            location: location.name.clone(),
            providers,
            entries: series.len(),
        });
        corpus.insert(location.name.clone(), series);
    }

    let path = corpus_path(config);
    write_json(&path, &corpus)?;
    info!(
        locations = corpus.len(),
        path = %path.display(),
        "Corpus written"
    );

    Ok((corpus, summaries))
}
