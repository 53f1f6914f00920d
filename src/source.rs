use crate::http::build_client;
use crate::models::Row;
use std::io::Read;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("inventory source is not configured")]
    Missing,
    #[error("failed to download inventory: {0}")]
    Download(String),
    #[error("failed to read inventory file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed inventory csv: {0}")]
    Csv(#[from] csv::Error),
}

/// Loads every row from a local CSV path or an http(s) URL.
pub async fn load_rows(location: &str) -> Result<Vec<Row>, SourceError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(SourceError::Missing);
    }

    let raw = if location.starts_with("http://") || location.starts_with("https://") {
        download(location).await?
    } else {
        tokio::fs::read(location).await?
    };

    let rows = parse_rows(raw.as_slice())?;
    info!(target = "listing.pipeline", rows = rows.len(), "inventory_loaded");
    Ok(rows)
}

pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<Row>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    reader
        .deserialize::<Row>()
        .map(|record| record.map_err(SourceError::from))
        .collect()
}

async fn download(url: &str) -> Result<Vec<u8>, SourceError> {
    let response = build_client()
        .get(url)
        .send()
        .await
        .map_err(|err| SourceError::Download(err.to_string()))?;
    if !response.status().is_success() {
        return Err(SourceError::Download(format!(
            "HTTP {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|err| SourceError::Download(err.to_string()))?;
    Ok(bytes.to_vec())
}
