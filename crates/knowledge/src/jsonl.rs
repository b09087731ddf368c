//! Append-only JSON Lines files.

use ragdesk_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Append one record as a JSON line, creating parent directories as needed.
pub fn append_line<T: Serialize>(path: &Path, record: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open {:?}: {}", path, e)))?;

    let json_line = serde_json::to_string(record)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize record: {}", e)))?;

    writeln!(file, "{}", json_line)
        .map_err(|e| AppError::Knowledge(format!("Failed to write to {:?}: {}", path, e)))?;

    file.sync_all()
        .map_err(|e| AppError::Knowledge(format!("Failed to sync {:?}: {}", path, e)))?;

    Ok(())
}

/// Read every record. A missing file reads as empty; blank lines are skipped.
pub fn read_lines<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open {:?}: {}", path, e)))?;

    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            AppError::Knowledge(format!("Failed to read line {}: {}", line_num + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str(&line).map_err(|e| {
            AppError::Knowledge(format!(
                "Failed to parse line {} in {:?}: {}",
                line_num + 1,
                path,
                e
            ))
        })?;

        records.push(record);
    }

    Ok(records)
}
