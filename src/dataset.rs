//! Tabular dataset model.
//!
//! Datasets are already-parsed tables: ordered rows of named cells plus a
//! typed column list. The pipeline only needs read access to one designated
//! text column and the ability to materialize a new dataset from a
//! projection; CSV parsing and export live outside this crate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DatasetError;

/// Semantic type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// The primary text column the pipeline translates.
    Prompt,
    /// Supporting context text.
    Context,
    /// Model completion text.
    Completion,
    /// Generic text.
    Text,
}

/// A named, typed dataset column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Metadata attached to a dataset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub row_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// How the dataset came to exist (e.g., "upload", "translation").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Job that produced this dataset, if it is a translation output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_job_id: Option<String>,
}

/// One row: a mapping from column name to cell value.
///
/// `BTreeMap` keeps serialized rows in a stable key order.
pub type Row = BTreeMap<String, Value>;

/// An already-parsed tabular dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub metadata: DatasetMetadata,
}

impl Dataset {
    /// Creates a new dataset with a fresh id and timestamps.
    pub fn new(name: impl Into<String>, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            metadata: DatasetMetadata {
                row_count: rows.len(),
                created_at: now,
                updated_at: now,
                source_type: None,
                source_job_id: None,
            },
            columns,
            rows,
        }
    }

    /// Sets the source type on the metadata.
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.metadata.source_type = Some(source_type.into());
        self
    }

    /// Links the job that produced this dataset.
    pub fn with_source_job(mut self, job_id: impl Into<String>) -> Self {
        self.metadata.source_job_id = Some(job_id.into());
        self
    }

    /// Resolves the designated text column for translation.
    ///
    /// Picks the first `prompt`-typed column, else the first `text`-typed
    /// column, else the first column at all. Fails only when the dataset has
    /// zero columns.
    pub fn text_column(&self) -> Result<&Column, DatasetError> {
        self.columns
            .iter()
            .find(|col| col.column_type == ColumnType::Prompt)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|col| col.column_type == ColumnType::Text)
            })
            .or_else(|| self.columns.first())
            .ok_or(DatasetError::NoTextColumn)
    }

    /// Stringifies the cell of `column` in `row`; missing or null cells
    /// become the empty string.
    pub fn row_text(row: &Row, column: &Column) -> String {
        match row.get(&column.name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Infers column types from column names.
///
/// A name containing "prompt", "context", or "completion" gets that type;
/// everything else is generic text.
pub fn detect_column_types(names: &[String]) -> Vec<Column> {
    names
        .iter()
        .map(|name| {
            let lower = name.to_lowercase();
            let column_type = if lower.contains("prompt") {
                ColumnType::Prompt
            } else if lower.contains("context") {
                ColumnType::Context
            } else if lower.contains("completion") {
                ColumnType::Completion
            } else {
                ColumnType::Text
            };
            Column::new(name.clone(), column_type)
        })
        .collect()
}
