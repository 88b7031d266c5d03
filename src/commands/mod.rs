pub mod ingest;
pub mod llm_status;
pub mod query;
pub mod status;
pub mod suggest;

use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "absence.sqlite";

pub(crate) fn manifest_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests")
}

pub(crate) fn resolve_db_path(cache_root: &Path, db_path: Option<&Path>) -> PathBuf {
    db_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cache_root.join(DB_FILE_NAME))
}
