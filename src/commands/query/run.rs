use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::{LlmArgs, QueryArgs};
use crate::commands::resolve_db_path;
use crate::dataset::{DatasetLoader, DatasetSource};
use crate::llm::{OllamaClient, OllamaSettings, TextGenerator};
use crate::nlp::{NlpService, QueryExecutor};

use super::output::{write_json_response, write_text_response};

const MIN_QUERY_CHARS: usize = 3;
const MAX_QUERY_CHARS: usize = 500;

pub async fn run(args: QueryArgs) -> Result<()> {
    let query = validate_query(&args.query)?;

    let source = match &args.csv_path {
        Some(csv_path) => DatasetSource::Csv(csv_path.clone()),
        None => {
            let db_path = resolve_db_path(&args.cache_root, args.db_path.as_deref());
            if !db_path.exists() {
                bail!(
                    "database {} not found; run `ingest` first or pass --csv-path",
                    db_path.display()
                );
            }
            DatasetSource::Sqlite(db_path)
        }
    };

    let executor = QueryExecutor::new(
        Arc::new(DatasetLoader::new(source)),
        build_generator(&args.llm),
        Duration::from_secs(args.llm.llm_timeout_secs),
    );
    let service = NlpService::new(executor)?;

    let started = Instant::now();
    let response = service.process_query(query).await;
    info!(
        intent = ?response.intent,
        success = response.success,
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "query completed"
    );

    if args.json {
        write_json_response(&response)?;
    } else {
        write_text_response(query, &response)?;
    }

    if !response.success {
        warn!(interpretation = %response.interpretation, "query was not answered");
        bail!("{}", response.message);
    }
    Ok(())
}

fn build_generator(llm: &LlmArgs) -> Option<Arc<dyn TextGenerator>> {
    if llm.no_llm {
        info!("text generator disabled");
        return None;
    }
    Some(Arc::new(OllamaClient::new(OllamaSettings {
        base_url: llm.llm_url.clone(),
        model: llm.llm_model.clone(),
        timeout: Duration::from_secs(llm.llm_timeout_secs),
    })))
}

/// Trimmed query, or an error when it is outside the accepted length.
pub(crate) fn validate_query(raw: &str) -> Result<&str> {
    let query = raw.trim();
    let length = query.chars().count();
    if length < MIN_QUERY_CHARS {
        bail!("query must be at least {MIN_QUERY_CHARS} characters");
    }
    if length > MAX_QUERY_CHARS {
        bail!("query must be at most {MAX_QUERY_CHARS} characters (got {length})");
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_query_trims_and_bounds_length() {
        assert_eq!(
            validate_query("  average age  ").expect("valid"),
            "average age"
        );
        assert!(validate_query("   ").is_err());
        assert!(validate_query(" hi ").is_err());
        assert_eq!(validate_query("why").expect("three chars"), "why");
        assert!(validate_query(&"a".repeat(500)).is_ok());
        assert!(validate_query(&"a".repeat(501)).is_err());
    }
}
