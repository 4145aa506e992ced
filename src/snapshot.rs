//! JSON snapshots written next to the HTML.
//!
//! - `latest.json`: the latest-items list, exactly as fetched.
//! - `category.json`: the category list after empty categories are pruned.
//!
//! Output is compact JSON in struct field order, so identical content gives
//! byte-identical files.

use crate::types::{Category, Item};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const LATEST_FILE: &str = "latest.json";
pub const CATEGORY_FILE: &str = "category.json";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn write_latest(export: &Path, latest: &[Item]) -> Result<PathBuf, SnapshotError> {
    write_json(&export.join(LATEST_FILE), latest)
}

pub fn write_categories(export: &Path, categories: &[Category]) -> Result<PathBuf, SnapshotError> {
    write_json(&export.join(CATEGORY_FILE), categories)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, SnapshotError> {
    let json = serde_json::to_vec(value)?;
    fs::write(path, json)?;
    Ok(path.to_path_buf())
}
