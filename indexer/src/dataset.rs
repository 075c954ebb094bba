//! Reading catalog rows from CSV, JSON, JSON-array and JSONL files.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use vitrine_core::{Document, ProductId};
use walkdir::WalkDir;

/// One dataset row: a product plus, optionally, a historical query that found
/// it at `search_page`/`position`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRow {
    pub product_id: ProductId,
    #[serde(default)]
    pub seller_id: Option<u64>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub search_page: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub concatenated_tags: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "truthy")]
    pub express_delivery: bool,
    #[serde(default)]
    pub minimum_quantity: Option<u32>,
    #[serde(default)]
    pub view_counts: Option<f64>,
    #[serde(default)]
    pub order_counts: Option<f64>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub category: Option<String>,
}

/// Non-string values (numbers, null) and blank cells in a text column count as absent.
fn text_or_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn truthy<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "sim"),
        _ => false,
    })
}

impl DatasetRow {
    /// The indexed part of the row; evaluation fields are dropped.
    pub fn to_document(&self) -> Document {
        Document {
            product_id: self.product_id,
            seller_id: self.seller_id.unwrap_or_default(),
            title: self.title.clone(),
            concatenated_tags: self.concatenated_tags.clone(),
            creation_date: self.creation_date.clone(),
            price: self.price.unwrap_or_default(),
            weight: self.weight.filter(|w| w.is_finite()),
            express_delivery: self.express_delivery,
            minimum_quantity: self.minimum_quantity.unwrap_or(1),
            view_counts: self.view_counts,
            order_counts: self.order_counts,
            category: self.category.clone().unwrap_or_default(),
        }
    }
}

const EXTENSIONS: [&str; 3] = ["csv", "json", "jsonl"];

/// Collect `.csv`/`.json`/`.jsonl` files under `input` (or `input` itself), sorted.
fn input_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if EXTENSIONS.contains(&ext) {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

pub fn load_rows(input: &Path) -> Result<Vec<DatasetRow>> {
    let files = input_files(input);
    if files.is_empty() {
        anyhow::bail!("no dataset files found at {}", input.display());
    }
    let mut rows = Vec::new();
    for file in files {
        let before = rows.len();
        match file.extension().and_then(|s| s.to_str()) {
            Some("csv") => read_csv(&file, &mut rows)?,
            Some("jsonl") => read_jsonl(&file, &mut rows)?,
            _ => read_json(&file, &mut rows)?,
        }
        tracing::debug!(file = %file.display(), rows = rows.len() - before, "read dataset file");
    }
    tracing::info!(rows = rows.len(), "dataset loaded");
    Ok(rows)
}

/// Header-driven: columns are matched to fields by name and extra columns are
/// ignored. Empty numeric cells read as absent.
fn read_csv(file: &Path, rows: &mut Vec<DatasetRow>) -> Result<()> {
    let mut reader = csv::Reader::from_path(file)
        .with_context(|| format!("opening {}", file.display()))?;
    for (n, record) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = record.with_context(|| format!("{}: record {}", file.display(), n + 1))?;
        rows.push(row);
    }
    Ok(())
}

fn read_jsonl(file: &Path, rows: &mut Vec<DatasetRow>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let row: DatasetRow = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), n + 1))?;
        rows.push(row);
    }
    Ok(())
}

fn read_json(file: &Path, rows: &mut Vec<DatasetRow>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        Value::Array(arr) => {
            for v in arr {
                rows.push(serde_json::from_value(v)?);
            }
        }
        Value::Object(_) => rows.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping file that is neither an object nor an array"),
    }
    Ok(())
}
