//! Retrieval of collection documents.
//!
//! A collection URL is expected to describe exactly one catalog entry: the
//! document is downloaded to a transient file, parsed, and only its first
//! record is returned.

use std::time::Duration;

use futures::StreamExt;
use reqwest::Url;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use super::encoding::decode_document;
use super::{parse_marcxml, Record};
use crate::error::{ConfigError, ConfigResult, FetchError, FetchResult};
use crate::logs::LogBroadcaster;

/// Downloads and parses MARCXML collection documents.
#[derive(Debug, Clone)]
pub struct CollectionFetcher {
    http: reqwest::Client,
    logs: LogBroadcaster,
}

impl CollectionFetcher {
    pub fn new(
        timeout: Duration,
        connect_timeout: Duration,
        logs: LogBroadcaster,
    ) -> ConfigResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { http, logs })
    }

    /// Fetch a collection and return its first record, or `None` when the
    /// collection holds no records.
    pub async fn fetch_first_record(&self, collection_url: &str) -> FetchResult<Option<Record>> {
        let records = self.fetch_records(collection_url).await?;
        if records.len() > 1 {
            self.logs.warning(format!(
                "Collection {} holds {} records, only the first is registered",
                collection_url,
                records.len()
            ));
        }
        Ok(records.into_iter().next())
    }

    /// Fetch a collection and return all of its records.
    pub async fn fetch_records(&self, collection_url: &str) -> FetchResult<Vec<Record>> {
        let unsupported = || FetchError::UnsupportedUrl(collection_url.to_string());
        let url = Url::parse(collection_url).map_err(|_| unsupported())?;

        let bytes = match url.scheme() {
            "http" | "https" => self.download(url).await?,
            "file" => {
                let path = url.to_file_path().map_err(|_| unsupported())?;
                tokio::fs::read(path).await?
            }
            _ => return Err(unsupported()),
        };

        let text = decode_document(&bytes)?;
        parse_marcxml(&text)
    }

    /// Stream the document into a transient file and read it back.
    ///
    /// The file is removed when this function returns.
    async fn download(&self, url: Url) -> FetchResult<Vec<u8>> {
        let http_error = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(url.clone()).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let tmp = NamedTempFile::new()?;
        let mut file = tokio::fs::File::from_std(tmp.reopen()?);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http_error)?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        let bytes = tokio::fs::read(tmp.path()).await?;
        Ok(bytes)
    }
}
