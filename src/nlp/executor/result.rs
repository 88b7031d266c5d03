use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::dataset::{AbsenceRecord, Column};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
    Table,
    Metric,
    ChartData,
    Text,
}

impl ResultType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Metric => "metric",
            Self::ChartData => "chart_data",
            Self::Text => "text",
        }
    }
}

/// An aggregated number. Counts stay integral in the JSON output.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(usize),
    Number(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GroupStats {
    pub mean: Option<f64>,
    pub count: usize,
    pub std: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub period_num: i64,
    pub mean: f64,
    pub count: usize,
    pub total: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Ai,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultData {
    Records {
        records: Vec<AbsenceRecord>,
    },
    Single {
        label: String,
        value: Option<MetricValue>,
        sample_size: usize,
    },
    Grouped {
        label: String,
        group_by: Column,
        groups: BTreeMap<i64, Option<MetricValue>>,
    },
    Comparison {
        group_by: Column,
        target: Column,
        data: BTreeMap<i64, GroupStats>,
    },
    Trend {
        time_column: Column,
        target: Column,
        data: Vec<TrendPoint>,
    },
    Redirect {
        redirect: String,
    },
    Response {
        response: String,
        source: ResponseSource,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResult {
    pub success: bool,
    pub result_type: ResultType,
    pub data: Option<ResultData>,
    pub message: String,
    pub interpretation: String,
    pub row_count: usize,
}

impl QueryResult {
    pub(super) fn ok(
        result_type: ResultType,
        data: ResultData,
        message: impl Into<String>,
        interpretation: impl Into<String>,
        row_count: usize,
    ) -> Self {
        Self {
            success: true,
            result_type,
            data: Some(data),
            message: message.into(),
            interpretation: interpretation.into(),
            row_count,
        }
    }

    pub(super) fn failure(query: &str, err: &anyhow::Error) -> Self {
        Self {
            success: false,
            result_type: ResultType::Text,
            data: None,
            message: format!("Error executing query: {err:#}"),
            interpretation: format!("Failed to process: {query}"),
            row_count: 0,
        }
    }
}
