use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub csv_path: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestCounts {
    pub records_parsed: usize,
    pub records_stored: i64,
    pub unique_employees: usize,
}

/// Record of one `ingest` run, written next to the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub source_sha256: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
}
