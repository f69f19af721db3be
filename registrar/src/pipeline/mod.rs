//! Run aggregator: drives registration across all collections.
//!
//! ```text
//! collection URL ─▶ fetch first record ─▶ 856 fields ─▶ eligible? ─▶ register ─▶ tally
//! ```
//!
//! Collections are processed in the order given, link fields in source order,
//! one network call at a time. Totals only ever grow, and only on a confirmed
//! `201 Created`.
//!
//! # Example
//!
//! ```rust,ignore
//! use marcload::{Registrar, RegistrationConfig, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RegistrationConfig::new("provider.example", "space", "storage", "token");
//!     let registrar = Registrar::new(config, RunOptions::default())?;
//!     let summary = registrar.run(&["https://catalog.example/c.xml".to_string()]).await?;
//!     println!("Registered {} files", summary.totals.count);
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};

use crate::config::{CollectionErrorPolicy, RegistrationConfig, RunOptions};
use crate::error::{CollectionError, ConfigError, ConfigResult, RunError, RunResult};
use crate::links::{is_eligible, link_fields};
use crate::logs::{LogBroadcaster, LOG_BROADCASTER};
use crate::marc::fetch::CollectionFetcher;
use crate::register::RegistrationClient;

// =============================================================================
// Totals and summary
// =============================================================================

/// Successfully registered files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Registered file count
    pub count: u64,
    /// Sum of declared sizes of registered files, in bytes
    pub size: u64,
    /// Registered files that declared no size
    pub unsized_count: u64,
}

impl RunTotals {
    /// Account for one confirmed registration.
    pub fn record_success(&mut self, size: Option<u64>) {
        self.count += 1;
        match size {
            Some(bytes) => self.size = self.size.saturating_add(bytes),
            None => self.unsized_count += 1,
        }
    }
}

/// A collection that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedCollection {
    pub url: String,
    pub error: String,
}

/// Everything a run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub totals: RunTotals,
    /// Eligible link fields submitted for registration
    pub attempted: u64,
    /// Submissions that did not end in `201 Created`
    pub failed: u64,
    /// Link fields not eligible for registration
    pub skipped: u64,
    /// Collections processed to the end
    pub collections_processed: usize,
    /// Collections abandoned under [`CollectionErrorPolicy::Continue`]
    pub failed_collections: Vec<FailedCollection>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    fn start() -> Self {
        Self {
            totals: RunTotals::default(),
            attempted: 0,
            failed: 0,
            skipped: 0,
            collections_processed: 0,
            failed_collections: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Wall-clock duration in seconds, once the run has finished.
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

// =============================================================================
// Registrar
// =============================================================================

/// Runs the fetch → extract → filter → register pipeline.
pub struct Registrar {
    fetcher: CollectionFetcher,
    client: RegistrationClient,
    options: RunOptions,
    logs: LogBroadcaster,
}

impl Registrar {
    /// Build a registrar logging to the process-wide broadcaster.
    pub fn new(config: RegistrationConfig, options: RunOptions) -> ConfigResult<Self> {
        Self::with_logs(config, options, LOG_BROADCASTER.clone())
    }

    /// Build a registrar logging to `logs`.
    pub fn with_logs(
        config: RegistrationConfig,
        options: RunOptions,
        logs: LogBroadcaster,
    ) -> ConfigResult<Self> {
        let fetcher = CollectionFetcher::new(options.timeout, options.connect_timeout, logs.clone())?;
        let client = RegistrationClient::new(config, &options, logs.clone())?;

        Ok(Self {
            fetcher,
            client,
            options,
            logs,
        })
    }

    /// Process every collection in order and report the totals.
    ///
    /// Under [`CollectionErrorPolicy::Abort`] the first collection error ends
    /// the run; the totals gathered so far are reported before it is returned
    /// and the caller reports the error itself.
    pub async fn run(&self, collections: &[String]) -> RunResult<RunSummary> {
        if collections.is_empty() {
            return Err(ConfigError::NoCollections.into());
        }

        let mut summary = RunSummary::start();

        for url in collections {
            self.logs.info(format!("Processing collection {}", url));

            let before = (summary.totals.count, summary.failed, summary.skipped);
            match self.process_collection(url, &mut summary).await {
                Ok(()) => {
                    summary.collections_processed += 1;
                    self.logs.success(format!(
                        "Collection {}: {} registered, {} failed, {} skipped",
                        url,
                        summary.totals.count - before.0,
                        summary.failed - before.1,
                        summary.skipped - before.2
                    ));
                }
                Err(source) => match self.options.error_policy {
                    CollectionErrorPolicy::Abort => {
                        summary.finished_at = Some(Utc::now());
                        self.report(&summary);
                        return Err(RunError::Collection {
                            url: url.clone(),
                            source,
                        });
                    }
                    CollectionErrorPolicy::Continue => {
                        self.logs.error(format!(
                            "Collection {} failed, continuing with the next one: {}",
                            url, source
                        ));
                        summary.failed_collections.push(FailedCollection {
                            url: url.clone(),
                            error: source.to_string(),
                        });
                    }
                },
            }
        }

        summary.finished_at = Some(Utc::now());
        self.report(&summary);
        Ok(summary)
    }

    /// Register every eligible link field of one collection.
    async fn process_collection(
        &self,
        url: &str,
        summary: &mut RunSummary,
    ) -> Result<(), CollectionError> {
        let record = self.fetcher.fetch_first_record(url).await?;
        if record.is_none() {
            self.logs.warning(format!("Collection {} holds no records", url));
        }

        for field in link_fields(record.as_ref()) {
            if !is_eligible(&field) {
                summary.skipped += 1;
                continue;
            }

            let request = self.client.build_request(&field)?;
            summary.attempted += 1;

            if self.client.register(&request).await.is_success() {
                summary.totals.record_success(request.size);
                if self.options.should_report_progress(summary.totals.count) {
                    self.logs
                        .info(format!("Registered {} files", summary.totals.count));
                }
            } else {
                summary.failed += 1;
            }
        }

        Ok(())
    }

    /// Final report lines.
    fn report(&self, summary: &RunSummary) {
        self.logs.info("");
        self.logs.info(format!(
            "Total registered files count: {}",
            summary.totals.count
        ));
        self.logs.info(format!("Total size: {}", summary.totals.size));

        if summary.totals.unsized_count > 0 {
            self.logs.warning(format!(
                "Registered without declared size: {}",
                summary.totals.unsized_count
            ));
        }
        if summary.failed > 0 {
            self.logs
                .warning(format!("Failed registrations: {}", summary.failed));
        }
        for failed in &summary.failed_collections {
            self.logs
                .warning(format!("Skipped collection {}: {}", failed.url, failed.error));
        }
        if let Some(secs) = summary.elapsed_secs() {
            self.logs.info(format!("Finished in {:.1}s", secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn collection_file(xml: &str) -> (NamedTempFile, String) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        let url = format!("file://{}", file.path().display());
        (file, url)
    }

    fn registrar(policy: CollectionErrorPolicy) -> (Registrar, LogBroadcaster) {
        let logs = LogBroadcaster::new();
        let config = RegistrationConfig::new("provider.invalid", "space", "storage", "token");
        let options = RunOptions {
            error_policy: policy,
            ..RunOptions::default()
        };
        (Registrar::with_logs(config, options, logs.clone()).unwrap(), logs)
    }

    fn messages(rx: &mut tokio::sync::broadcast::Receiver<crate::logs::LogEntry>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            out.push(entry.message);
        }
        out
    }

    #[test]
    fn test_totals_record_success() {
        let mut totals = RunTotals::default();
        totals.record_success(Some(1000));
        totals.record_success(Some(500));
        totals.record_success(None);
        assert_eq!(
            totals,
            RunTotals {
                count: 3,
                size: 1500,
                unsized_count: 1
            }
        );
    }

    #[tokio::test]
    async fn test_ineligible_fields_make_no_calls() {
        let (_file, url) = collection_file(
            r#"<collection><record>
                <datafield tag="856" ind1="1" ind2=" ">
                    <subfield code="u">ftp://media.example/a.mp4</subfield>
                    <subfield code="q">MP4</subfield>
                </datafield>
                <datafield tag="856" ind1="4" ind2=" ">
                    <subfield code="u">https://media.example/a.pdf</subfield>
                    <subfield code="q">PDF</subfield>
                    <subfield code="w">broken</subfield>
                </datafield>
            </record></collection>"#,
        );
        let (registrar, _logs) = registrar(CollectionErrorPolicy::Abort);

        let summary = registrar.run(&[url]).await.unwrap();
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.totals, RunTotals::default());
        assert_eq!(summary.collections_processed, 1);
    }

    #[tokio::test]
    async fn test_format_error_aborts_and_still_reports() {
        let (_file, url) = collection_file(
            r#"<record>
                <datafield tag="856" ind1="4" ind2=" ">
                    <subfield code="u">/a.mp4</subfield>
                    <subfield code="q">MP4</subfield>
                    <subfield code="w">(OCoLC)12345</subfield>
                </datafield>
            </record>"#,
        );
        let (registrar, logs) = registrar(CollectionErrorPolicy::Abort);
        let mut rx = logs.subscribe();

        let err = registrar.run(&[url.clone(), url]).await.unwrap_err();
        assert!(matches!(err, RunError::Collection { .. }));

        let messages = messages(&mut rx);
        assert_eq!(
            messages.iter().filter(|m| m.starts_with("Processing collection")).count(),
            1
        );
        assert!(messages.contains(&"Total registered files count: 0".to_string()));
        assert!(messages.contains(&"Total size: 0".to_string()));
        assert!(!messages.iter().any(|m| m.contains("failed")));
    }

    #[tokio::test]
    async fn test_continue_policy_records_failed_collection() {
        let (_good, good_url) = collection_file("<collection/>");
        let (registrar, _logs) = registrar(CollectionErrorPolicy::Continue);

        let summary = registrar
            .run(&["file:///no/such/collection.xml".to_string(), good_url])
            .await
            .unwrap();

        assert_eq!(summary.collections_processed, 1);
        assert_eq!(summary.failed_collections.len(), 1);
        assert_eq!(summary.failed_collections[0].url, "file:///no/such/collection.xml");
        assert!(summary.finished_at.is_some());
    }
}
