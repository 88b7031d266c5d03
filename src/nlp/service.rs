use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use super::entities::EntityExtractor;
use super::executor::{QueryExecutor, ResultData, ResultType};
use super::intent::{Intent, IntentClassifier};

pub const SUGGESTED_QUERIES: [&str; 8] = [
    "Show employees with more than 20 hours of absence",
    "What's the average absence by education level?",
    "Compare absence between smokers and non-smokers",
    "Show monthly absence trends",
    "How many employees have disciplinary failures?",
    "List high-risk employees",
    "What's the average BMI of employees?",
    "Show employees over 40 years old",
];

const MAX_SUGGESTIONS: usize = 4;
const FILTER_FOLLOW_UPS: &[&str] = &["average", "compare", "trend"];
const AGGREGATE_FOLLOW_UPS: &[&str] = &["show", "list", "compare"];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExampleQuery {
    pub query: &'static str,
    pub description: &'static str,
    pub expected_result_type: ResultType,
}

pub const EXAMPLE_QUERIES: [ExampleQuery; 8] = [
    ExampleQuery {
        query: "Show employees with more than 20 hours of absence",
        description: "Filter employees by absence threshold",
        expected_result_type: ResultType::Table,
    },
    ExampleQuery {
        query: "What's the average absence hours?",
        description: "Calculate overall average absence",
        expected_result_type: ResultType::Metric,
    },
    ExampleQuery {
        query: "Compare absence between smokers and non-smokers",
        description: "Group comparison by lifestyle factor",
        expected_result_type: ResultType::ChartData,
    },
    ExampleQuery {
        query: "Show monthly absence trends",
        description: "Time series analysis of absence patterns",
        expected_result_type: ResultType::ChartData,
    },
    ExampleQuery {
        query: "How many employees have disciplinary failures?",
        description: "Count employees with specific attribute",
        expected_result_type: ResultType::Metric,
    },
    ExampleQuery {
        query: "List high-risk employees",
        description: "Filter for employees above risk threshold",
        expected_result_type: ResultType::Table,
    },
    ExampleQuery {
        query: "What's the average BMI of employees over 40?",
        description: "Aggregate with filter condition",
        expected_result_type: ResultType::Metric,
    },
    ExampleQuery {
        query: "Show absence by education level",
        description: "Group statistics by education category",
        expected_result_type: ResultType::ChartData,
    },
];

/// Everything a caller needs to render one answered query.
#[derive(Debug, Clone, Serialize)]
pub struct NlpResponse {
    pub success: bool,
    /// `None` only when the query was rejected before classification.
    pub intent: Option<Intent>,
    pub confidence: f64,
    pub matched_patterns: Vec<String>,
    pub result_type: ResultType,
    pub data: Option<ResultData>,
    pub message: String,
    pub interpretation: String,
    pub row_count: usize,
    pub suggestions: Vec<String>,
}

pub struct NlpService {
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    executor: QueryExecutor,
}

impl NlpService {
    pub fn new(executor: QueryExecutor) -> Result<Self> {
        Ok(Self {
            classifier: IntentClassifier::new()?,
            extractor: EntityExtractor::new()?,
            executor,
        })
    }

    pub async fn process_query(&self, query: &str) -> NlpResponse {
        let query = query.trim();
        if query.is_empty() {
            return NlpResponse {
                success: false,
                intent: None,
                confidence: 0.0,
                matched_patterns: Vec::new(),
                result_type: ResultType::Text,
                data: None,
                message: "Please enter a query.".to_string(),
                interpretation: "Empty query".to_string(),
                row_count: 0,
                suggestions: owned(SUGGESTED_QUERIES.iter().copied().take(MAX_SUGGESTIONS)),
            };
        }

        let classification = self.classifier.classify(query);
        debug!(
            intent = %classification.intent,
            confidence = classification.confidence,
            patterns = ?classification.matched_patterns,
            "query classified"
        );

        let entities = self.extractor.extract(query);
        debug!(
            fields = entities.fields.len(),
            conditions = entities.conditions.len(),
            aggregations = entities.aggregations.len(),
            groups = entities.groups.len(),
            "entities extracted"
        );

        let result = self.executor.execute(&classification, &entities, query).await;
        info!(
            intent = %classification.intent,
            success = result.success,
            row_count = result.row_count,
            "query processed"
        );

        NlpResponse {
            success: result.success,
            intent: Some(classification.intent),
            confidence: classification.confidence,
            suggestions: relevant_suggestions(classification.intent, query),
            matched_patterns: classification.matched_patterns,
            result_type: result.result_type,
            data: result.data,
            message: result.message,
            interpretation: result.interpretation,
            row_count: result.row_count,
        }
    }
}

/// Follow-up queries that do not repeat the leading words of `query`,
/// nudged toward a different kind of question.
fn relevant_suggestions(intent: Intent, query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut relevant = SUGGESTED_QUERIES
        .iter()
        .copied()
        .filter(|suggestion| {
            !suggestion
                .to_lowercase()
                .split_whitespace()
                .take(3)
                .any(|word| lowered.contains(word))
        })
        .collect::<Vec<_>>();

    let follow_ups = match intent {
        Intent::Filter => Some(FILTER_FOLLOW_UPS),
        Intent::Aggregate => Some(AGGREGATE_FOLLOW_UPS),
        _ => None,
    };
    if let Some(words) = follow_ups {
        relevant.sort_by_key(|suggestion| {
            let lowered = suggestion.to_lowercase();
            !words.iter().any(|word| lowered.contains(word))
        });
    }

    owned(relevant.into_iter().take(MAX_SUGGESTIONS))
}

fn owned<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    items.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::dataset::DatasetLoader;
    use crate::dataset::tests::sample_dataset;

    fn service() -> NlpService {
        let executor = QueryExecutor::new(
            Arc::new(DatasetLoader::preloaded(sample_dataset())),
            None,
            Duration::from_millis(100),
        );
        NlpService::new(executor).expect("service")
    }

    #[tokio::test]
    async fn filter_query_runs_end_to_end() {
        let response = service()
            .process_query("  Show employees with more than 20 hours of absence ")
            .await;

        assert!(response.success);
        assert_eq!(response.intent, Some(Intent::Filter));
        assert_eq!(response.result_type, ResultType::Table);
        assert_eq!(response.row_count, 3);
        assert_eq!(
            response.suggestions,
            vec![
                "What's the average absence by education level?",
                "What's the average BMI of employees?",
            ]
        );
    }

    #[tokio::test]
    async fn aggregate_query_prefers_listing_follow_ups() {
        let response = service().process_query("What is the average age?").await;

        assert_eq!(response.intent, Some(Intent::Aggregate));
        assert_eq!(response.result_type, ResultType::Metric);
        assert_eq!(response.message, "Average Age: 37.83");
        assert_eq!(
            response.suggestions,
            vec![
                "Show employees with more than 20 hours of absence",
                "Compare absence between smokers and non-smokers",
                "Show monthly absence trends",
                "List high-risk employees",
            ]
        );
    }

    #[tokio::test]
    async fn low_signal_query_answers_with_overview() {
        let response = service().process_query("hello there").await;

        assert!(response.success);
        assert_eq!(response.intent, Some(Intent::General));
        assert_eq!(response.confidence, 0.5);
        assert!(response.message.contains("- Total records: 12"));
        // "the" inside "there" drops the two "What's the ..." suggestions
        assert_eq!(
            response.suggestions,
            vec![
                "Show employees with more than 20 hours of absence",
                "Compare absence between smokers and non-smokers",
                "Show monthly absence trends",
                "How many employees have disciplinary failures?",
            ]
        );
    }

    #[tokio::test]
    async fn blank_query_is_rejected_before_classification() {
        let response = service().process_query("   ").await;

        assert!(!response.success);
        assert_eq!(response.intent, None);
        assert_eq!(response.message, "Please enter a query.");
        assert_eq!(response.suggestions.len(), 4);
        assert_eq!(
            serde_json::to_value(&response).expect("json")["intent"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn example_catalogue_covers_every_result_shape() {
        assert_eq!(EXAMPLE_QUERIES.len(), 8);
        for result_type in [ResultType::Table, ResultType::Metric, ResultType::ChartData] {
            assert!(
                EXAMPLE_QUERIES
                    .iter()
                    .any(|example| example.expected_result_type == result_type)
            );
        }
    }
}
