//! Fetch runner: every (provider, location) pair is fetched concurrently
//! and written as that provider's artifact.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::artifact::write_artifact;
use crate::config::AppConfig;
use crate::providers::ForecastProvider;

/// Outcome counts of a [`fetch_all`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Providers not run at all (e.g. missing API key).
    pub skipped: usize,
}

enum Outcome {
    Written,
    Failed,
}

/// Fetches every provider for every configured location, at most
/// `concurrency` requests at a time.
///
/// A failing pair is logged and counted; its previous artifact, if any, is
/// left untouched.
#[tracing::instrument(skip(config, providers), fields(providers = providers.len()))]
pub async fn fetch_all(
    config: &AppConfig,
    providers: Vec<Arc<dyn ForecastProvider>>,
    concurrency: usize,
) -> Result<FetchSummary> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::new();

    for provider in &providers {
        let Some(provider_config) = config.provider(provider.id()).cloned() else {
            warn!(provider = %provider.id(), "Provider not configured, skipping");
            continue;
        };

        for location in &config.locations {
            let sem = semaphore.clone();
            let provider = provider.clone();
            let location = location.clone();
            let path = provider_config.artifact_path(&config.data_dir, &location.name);

            let span = tracing::info_span!(
                "fetch_provider",
                provider = %provider.id(),
                location = %location.name,
            );

            let task = tokio::spawn(
                async move {
                    let Ok(_permit) = sem.acquire().await else {
                        return Outcome::Failed;
                    };

                    let start = std::time::Instant::now();
                    let records = match provider.forecast(&location).await {
                        Ok(records) => records,
                        Err(e) => {
                            error!(error = %format_args!("{e:#}"), "Fetch failed");
                            return Outcome::Failed;
                        }
                    };

                    let elapsed = start.elapsed();
                    if elapsed.as_secs() > 15 {
                        warn!(elapsed_secs = elapsed.as_secs(), "Fetch was slow");
                    }

                    if records.is_empty() {
                        warn!("Provider returned no records");
                        return Outcome::Failed;
                    }

                    match write_artifact(&path, provider.id().artifact_shape(), &records) {
                        Ok(()) => {
                            info!(records = records.len(), path = %path.display(), "Artifact written");
                            Outcome::Written
                        }
                        Err(e) => {
                            error!(error = %format_args!("{e:#}"), "Failed to write artifact");
                            Outcome::Failed
                        }
                    }
                }
                .instrument(span),
            );

            tasks.push(task);
        }
    }

    let mut summary = FetchSummary::default();
    for task in tasks {
        match task.await {
            Ok(Outcome::Written) => summary.succeeded += 1,
            Ok(Outcome::Failed) => summary.failed += 1,
            Err(e) => {
                error!(error = %e, "Fetch task panicked");
                summary.failed += 1;
            }
        }
    }

    debug!(?summary, "Fetch round finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Location;
    use crate::providers::ProviderId;
    use crate::record::NormalizedRecord;
    use async_trait::async_trait;

    struct Fixed {
        id: ProviderId,
        fail_for: Option<&'static str>,
    }

    #[async_trait]
    impl ForecastProvider for Fixed {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn forecast(&self, location: &Location) -> Result<Vec<NormalizedRecord>> {
            if self.fail_for == Some(location.name.as_str()) {
                anyhow::bail!("upstream down");
            }
            Ok(vec![NormalizedRecord::new(
                "2025-08-07 15:00:00",
                20.0,
                Some("clear"),
                self.id.as_str(),
            )])
        }
    }

    #[tokio::test]
    async fn test_fetch_all_writes_artifacts_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            locations: vec![
                Location::new("lomma", 55.68, 13.07),
                Location::new("umeå", 63.82, 20.26),
            ],
            ..AppConfig::default()
        };
        let providers: Vec<Arc<dyn ForecastProvider>> = vec![
            Arc::new(Fixed {
                id: ProviderId::Smhi,
                fail_for: None,
            }),
            Arc::new(Fixed {
                id: ProviderId::Yr,
                fail_for: Some("umeå"),
            }),
        ];

        let summary = fetch_all(&config, providers, 2).await.unwrap();
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);

        assert!(dir.path().join("weather_smhi_lomma.json").exists());
        assert!(dir.path().join("weather_smhi_umeå.json").exists());
        assert!(dir.path().join("lomma_yr.json").exists());
        assert!(!dir.path().join("umeå_yr.json").exists());
    }
}
