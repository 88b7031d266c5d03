use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::resolve_db_path;
use crate::dataset::{Column, Dataset, store};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());

    info!(cache_root = %args.cache_root.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing; run `ingest` first");
        return Ok(());
    }

    let connection = store::open_read_only(&db_path)?;
    let metadata = store::load_metadata(&connection)?;
    let dataset = Dataset::new(store::load_records(&connection)?);
    let field = |key: &str| metadata.get(key).cloned().unwrap_or_default();

    info!(
        path = %db_path.display(),
        records = dataset.len(),
        employees = dataset.unique_count(Column::EmployeeId),
        "database status"
    );
    info!(
        schema_version = %field("schema_version"),
        source_path = %field("source_path"),
        source_sha256 = %field("source_sha256"),
        ingested_at = %field("ingested_at"),
        "ingest metadata"
    );

    if dataset.is_empty() {
        warn!(path = %db_path.display(), "database holds no records");
    }

    let stored_version = field("schema_version");
    if stored_version != store::DB_SCHEMA_VERSION {
        warn!(
            stored = %stored_version,
            expected = store::DB_SCHEMA_VERSION,
            "database schema version differs; re-run `ingest`"
        );
    }

    Ok(())
}
