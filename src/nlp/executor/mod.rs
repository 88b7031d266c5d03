mod aggregate;
mod compare;
mod filter;
mod general;
mod result;
mod trend;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::dataset::DatasetLoader;
use crate::llm::TextGenerator;

use super::entities::ExtractedEntities;
use super::intent::{ClassificationResult, Intent};

pub use result::{
    GroupStats, MetricValue, QueryResult, ResponseSource, ResultData, ResultType, TrendPoint,
};

pub const PREDICTIONS_ROUTE: &str = "/predictions";

/// Runs a classified query against the shared dataset. Never returns an
/// error: handler faults come back as `success = false` results.
pub struct QueryExecutor {
    dataset: Arc<DatasetLoader>,
    generator: Option<Arc<dyn TextGenerator>>,
    generator_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(
        dataset: Arc<DatasetLoader>,
        generator: Option<Arc<dyn TextGenerator>>,
        generator_timeout: Duration,
    ) -> Self {
        Self {
            dataset,
            generator,
            generator_timeout,
        }
    }

    pub async fn execute(
        &self,
        classification: &ClassificationResult,
        entities: &ExtractedEntities,
        query: &str,
    ) -> QueryResult {
        let intent = classification.intent;
        match self.dispatch(intent, entities, query).await {
            Ok(result) => {
                debug!(
                    intent = %intent,
                    result_type = result.result_type.as_str(),
                    row_count = result.row_count,
                    "query executed"
                );
                result
            }
            Err(err) => {
                let cause = format!("{err:#}");
                warn!(intent = %intent, error = %cause, "query execution failed");
                QueryResult::failure(query, &err)
            }
        }
    }

    async fn dispatch(
        &self,
        intent: Intent,
        entities: &ExtractedEntities,
        query: &str,
    ) -> Result<QueryResult> {
        if intent == Intent::Predict {
            return Ok(predict_redirect());
        }

        let dataset = self.dataset.get().await?;
        match intent {
            Intent::Filter => filter::run(&dataset, entities, query),
            Intent::Aggregate => aggregate::run(&dataset, entities),
            Intent::Compare => compare::run(&dataset, entities, query),
            Intent::Trend => trend::run(&dataset),
            Intent::General => self.run_general(&dataset, query).await,
            Intent::Predict => Ok(predict_redirect()),
        }
    }
}

fn predict_redirect() -> QueryResult {
    QueryResult::ok(
        ResultType::Text,
        ResultData::Redirect {
            redirect: PREDICTIONS_ROUTE.to_string(),
        },
        "For predictions, please use the Predictions page where you can input employee details and get AI-powered predictions with explanations.",
        "Prediction request detected",
        0,
    )
}
