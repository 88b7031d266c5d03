mod column;
mod csv;
mod record;
pub mod stats;
pub mod store;
#[cfg(test)]
pub(crate) mod tests;

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::info;

pub use column::{Column, month_name, reason_description};
pub use csv::parse_csv;
pub use record::AbsenceRecord;

/// Read-only table of absence records shared by every query.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<AbsenceRecord>,
}

impl Dataset {
    pub fn new(records: Vec<AbsenceRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[AbsenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn values(&self, column: Column) -> Vec<f64> {
        column_values(&self.records, column)
    }

    pub fn unique_count(&self, column: Column) -> usize {
        self.records
            .iter()
            .map(|record| record.value(column).to_bits())
            .collect::<HashSet<u64>>()
            .len()
    }
}

pub fn column_values<'a, I>(records: I, column: Column) -> Vec<f64>
where
    I: IntoIterator<Item = &'a AbsenceRecord>,
{
    records
        .into_iter()
        .map(|record| record.value(column))
        .collect()
}

#[derive(Debug, Clone)]
pub enum DatasetSource {
    Sqlite(PathBuf),
    Csv(PathBuf),
}

impl DatasetSource {
    pub fn load(&self) -> Result<Dataset> {
        let records = match self {
            Self::Sqlite(path) => {
                let connection = store::open_read_only(path)?;
                store::load_records(&connection)
                    .with_context(|| format!("failed to load records from {}", path.display()))?
            }
            Self::Csv(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                parse_csv(&text).with_context(|| format!("failed to parse {}", path.display()))?
            }
        };
        Ok(Dataset::new(records))
    }

    fn describe(&self) -> String {
        match self {
            Self::Sqlite(path) => format!("sqlite:{}", path.display()),
            Self::Csv(path) => format!("csv:{}", path.display()),
        }
    }
}

/// Loads the dataset on first use and hands out the same shared copy
/// afterwards. A failed load is not cached.
#[derive(Debug)]
pub struct DatasetLoader {
    source: Option<DatasetSource>,
    cell: OnceCell<Arc<Dataset>>,
}

impl DatasetLoader {
    pub fn new(source: DatasetSource) -> Self {
        Self {
            source: Some(source),
            cell: OnceCell::new(),
        }
    }

    pub fn preloaded(dataset: Dataset) -> Self {
        Self {
            source: None,
            cell: OnceCell::new_with(Some(Arc::new(dataset))),
        }
    }

    pub async fn get(&self) -> Result<Arc<Dataset>> {
        let dataset = self
            .cell
            .get_or_try_init(|| async {
                let source = self
                    .source
                    .as_ref()
                    .context("no dataset source configured")?;
                let dataset = source.load()?;
                info!(
                    source = %source.describe(),
                    records = dataset.len(),
                    "dataset loaded"
                );
                Ok::<_, anyhow::Error>(Arc::new(dataset))
            })
            .await?;
        Ok(Arc::clone(dataset))
    }
}
