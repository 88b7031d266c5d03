use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::cli::IngestArgs;
use crate::commands::{manifest_dir, resolve_db_path};
use crate::dataset::{Column, Dataset, parse_csv, store};
use crate::model::{IngestCounts, IngestPaths, IngestRunManifest};
use crate::util::{
    ensure_directory, ensure_parent_directory, now_utc_string, sha256_hex, utc_compact_string,
    write_json_pretty,
};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = manifest_dir(&cache_root);
    ensure_directory(&manifest_dir)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = resolve_db_path(&cache_root, args.db_path.as_deref());
    ensure_parent_directory(&db_path)?;

    info!(
        csv = %args.csv_path.display(),
        db = %db_path.display(),
        run_id = %run_id,
        "starting ingest"
    );

    let raw = fs::read(&args.csv_path)
        .with_context(|| format!("failed to read {}", args.csv_path.display()))?;
    let source_sha256 = sha256_hex(&raw);
    let text = String::from_utf8(raw)
        .with_context(|| format!("{} is not valid UTF-8", args.csv_path.display()))?;
    let records = parse_csv(&text)
        .with_context(|| format!("failed to parse {}", args.csv_path.display()))?;
    let dataset = Dataset::new(records);

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    store::configure_connection(&connection)?;
    store::ensure_schema(&connection)?;

    let updated_at = now_utc_string();
    let metadata = BTreeMap::from([
        (
            "schema_version".to_string(),
            store::DB_SCHEMA_VERSION.to_string(),
        ),
        ("source_sha256".to_string(), source_sha256.clone()),
        (
            "source_path".to_string(),
            args.csv_path.display().to_string(),
        ),
        ("ingested_at".to_string(), updated_at.clone()),
        ("record_count".to_string(), dataset.len().to_string()),
    ]);
    let inserted = store::replace_records(&mut connection, dataset.records(), &metadata)?;
    let records_stored = store::query_count(&connection, "SELECT COUNT(*) FROM absences")?;

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: store::DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at,
        command: render_ingest_command(&args),
        source_sha256,
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            csv_path: args.csv_path.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts: IngestCounts {
            records_parsed: inserted,
            records_stored,
            unique_employees: dataset.unique_count(Column::EmployeeId),
        },
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote ingest run manifest");
    info!(records = records_stored, "ingest completed");

    Ok(())
}

fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "absence-insight".to_string(),
        "ingest".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--csv-path".to_string(),
        args.csv_path.display().to_string(),
    ];
    if let Some(db_path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(db_path.display().to_string());
    }
    if let Some(manifest_path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(manifest_path.display().to_string());
    }
    command.join(" ")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::dataset::tests::SAMPLE_CSV;

    #[test]
    fn ingest_writes_store_and_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("absences.csv");
        fs::write(&csv_path, SAMPLE_CSV).expect("write csv");
        let cache_root = dir.path().join("cache");
        let manifest_path = dir.path().join("run.json");

        run(IngestArgs {
            cache_root: cache_root.clone(),
            csv_path: csv_path.clone(),
            db_path: None,
            manifest_path: Some(manifest_path.clone()),
        })
        .expect("ingest");

        let db_path = cache_root.join("absence.sqlite");
        let connection = store::open_read_only(&db_path).expect("open store");
        assert_eq!(store::load_records(&connection).expect("records").len(), 12);
        let metadata = store::load_metadata(&connection).expect("metadata");
        assert_eq!(
            metadata.get("source_sha256"),
            Some(&sha256_hex(SAMPLE_CSV.as_bytes()))
        );
        assert_eq!(metadata.get("record_count").map(String::as_str), Some("12"));

        let manifest: IngestRunManifest =
            serde_json::from_str(&fs::read_to_string(&manifest_path).expect("manifest"))
                .expect("parse manifest");
        assert_eq!(manifest.status, "completed");
        assert_eq!(manifest.counts.records_stored, 12);
        assert_eq!(manifest.counts.unique_employees, 9);
        assert_eq!(PathBuf::from(manifest.paths.db_path), db_path);
    }

    #[test]
    fn ingest_rejects_malformed_csv_without_touching_existing_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("absences.csv");
        fs::write(&csv_path, SAMPLE_CSV).expect("write csv");
        let args = IngestArgs {
            cache_root: dir.path().to_path_buf(),
            csv_path: csv_path.clone(),
            db_path: None,
            manifest_path: None,
        };
        run(args.clone()).expect("first ingest");

        fs::write(&csv_path, "ID;Age\n1;30\n").expect("overwrite csv");
        let err = run(args).expect_err("missing columns");
        assert!(format!("{err:#}").contains("missing columns"));

        let connection =
            store::open_read_only(&dir.path().join("absence.sqlite")).expect("open store");
        assert_eq!(store::load_records(&connection).expect("records").len(), 12);
    }
}
