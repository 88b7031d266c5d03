use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::Result;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::dataset::{Column, Dataset, reason_description, stats};
use crate::llm::{GenerationError, build_nlp_query_prompt};

use super::QueryExecutor;
use super::result::{QueryResult, ResponseSource, ResultData, ResultType};

const GENERAL_TEMPERATURE: f32 = 0.3;
const GENERAL_MAX_TOKENS: u32 = 200;
const TOP_REASONS: usize = 5;

impl QueryExecutor {
    pub(super) async fn run_general(&self, dataset: &Dataset, query: &str) -> Result<QueryResult> {
        let context = context_summary(dataset);

        match self.ask_generator(query, &context).await {
            Ok(response) => {
                info!("general question answered by text generator");
                Ok(QueryResult::ok(
                    ResultType::Text,
                    ResultData::Response {
                        response: response.clone(),
                        source: ResponseSource::Ai,
                    },
                    response,
                    "General question answered by AI",
                    0,
                ))
            }
            Err(err) => {
                warn!(error = %err, "text generator unavailable, returning dataset overview");
                let message = format!(
                    "Here's an overview of the dataset that might help answer your question:\n\n{context}"
                );
                Ok(QueryResult::ok(
                    ResultType::Text,
                    ResultData::Response {
                        response: context,
                        source: ResponseSource::Fallback,
                    },
                    message,
                    "Providing dataset overview (LLM unavailable)",
                    0,
                ))
            }
        }
    }

    /// One availability check and one generation attempt, both inside the
    /// configured time bound.
    async fn ask_generator(&self, query: &str, context: &str) -> Result<String, GenerationError> {
        let generator = self.generator.as_ref().ok_or(GenerationError::Unavailable)?;
        let prompt = build_nlp_query_prompt(query, context);

        let attempt = async {
            if !generator.is_available().await {
                return Err(GenerationError::Unavailable);
            }
            generator
                .generate(&prompt, GENERAL_TEMPERATURE, GENERAL_MAX_TOKENS)
                .await
        };

        let response = timeout(self.generator_timeout, attempt)
            .await
            .map_err(|_| GenerationError::Timeout(self.generator_timeout))??;
        if response.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(response)
    }
}

/// Plain-text statistics handed to the generator, and shown as-is when it
/// cannot answer.
pub(super) fn context_summary(dataset: &Dataset) -> String {
    let hours = dataset.values(Column::AbsenceHours);
    let ages = dataset.values(Column::Age);

    let mut summary = String::from("Dataset Overview:\n");
    let _ = writeln!(summary, "- Total records: {}", dataset.len());
    let _ = writeln!(
        summary,
        "- Average absence: {} hours",
        format_optional(stats::mean(&hours), 2)
    );
    let _ = writeln!(
        summary,
        "- Max absence: {} hours",
        format_optional(stats::max(&hours), 0)
    );
    let _ = writeln!(
        summary,
        "- Unique employees: {}",
        dataset.unique_count(Column::EmployeeId)
    );

    summary.push_str("\nTop absence reasons (by frequency):\n");
    for (code, count) in top_reasons(dataset) {
        let _ = writeln!(summary, "  {code} ({}): {count}", reason_description(code));
    }

    summary.push_str("\nAge distribution:\n");
    let _ = writeln!(
        summary,
        "- Mean: {} years",
        format_optional(stats::mean(&ages), 1)
    );
    let _ = write!(
        summary,
        "- Range: {} to {} years",
        format_optional(stats::min(&ages), 0),
        format_optional(stats::max(&ages), 0)
    );
    summary
}

/// Most frequent reason codes, ties broken by the lower code.
fn top_reasons(dataset: &Dataset) -> Vec<(i64, usize)> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for record in dataset.records() {
        *counts.entry(record.reason_code).or_default() += 1;
    }
    let mut ranked = counts.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
    ranked.truncate(TOP_REASONS);
    ranked
}

fn format_optional(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:.decimals$}"))
}
