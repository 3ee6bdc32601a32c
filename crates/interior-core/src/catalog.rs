//! Flat-file image catalog: a CSV with a header row listing image ids and URLs.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One catalog row, keyed by header name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CatalogImage {
    columns: BTreeMap<String, String>,
}

impl CatalogImage {
    pub fn image_id(&self) -> Option<&str> {
        self.get("image_id")
    }

    pub fn image_url(&self) -> Option<&str> {
        self.get("image_url")
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct CatalogReader {
    csv_path: PathBuf,
}

impl CatalogReader {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self { csv_path: csv_path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.csv_path
    }

    pub fn read_all(&self) -> Result<Vec<CatalogImage>> {
        let content = self.read_file_content()?;
        let images = parse_csv(&content);
        tracing::debug!(path = %self.csv_path.display(), rows = images.len(), "catalog loaded");
        Ok(images)
    }

    fn read_file_content(&self) -> Result<String> {
        let bytes = fs::read(&self.csv_path)
            .map_err(|e| Error::Catalog(format!("failed to read {}: {e}", self.csv_path.display())))?;
        match String::from_utf8(bytes) {
            Ok(content) => Ok(content),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).to_string()),
        }
    }
}

/// Header row names the columns; cells are trimmed and missing trailing cells
/// become empty strings. Blank lines are skipped.
pub fn parse_csv(content: &str) -> Vec<CatalogImage> {
    let mut lines = content.lines().map(|l| l.trim_end_matches('\r')).filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else { return Vec::new() };
    let headers: Vec<String> = header.split(',').map(|h| h.trim().to_string()).collect();
    lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').collect();
            let columns = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), values.get(i).map(|v| v.trim()).unwrap_or_default().to_string()))
                .collect();
            CatalogImage { columns }
        })
        .collect()
}
