//! JSON, CSV and plain-text file helpers.

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub type CsvRecord = BTreeMap<String, String>;

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, AppError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Pretty-printed with two-space indentation and a trailing newline.
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<(), AppError> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

/// First row is the header; each following row becomes a header -> field map.
pub fn read_csv(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<CsvRecord>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Writes `fieldnames` as the header, or the first row's keys when `fieldnames` is empty.
/// Fields a row lacks are written empty.
pub fn write_csv(path: impl AsRef<Path>, rows: &[CsvRecord], fieldnames: &[&str]) -> Result<(), AppError> {
    let header: Vec<String> = if fieldnames.is_empty() {
        rows.first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        fieldnames.iter().map(|f| f.to_string()).collect()
    };
    let mut writer = csv::Writer::from_path(path)?;
    if !header.is_empty() {
        writer.write_record(&header)?;
    }
    for row in rows {
        writer.write_record(header.iter().map(|h| row.get(h).map(String::as_str).unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_text(path: impl AsRef<Path>) -> Result<String, AppError> {
    Ok(fs::read_to_string(path)?)
}

pub fn write_text(path: impl AsRef<Path>, content: &str) -> Result<(), AppError> {
    fs::write(path, content)?;
    Ok(())
}
