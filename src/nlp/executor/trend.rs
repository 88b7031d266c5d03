use anyhow::Result;

use crate::dataset::{Column, Dataset, column_values, month_name, stats};

use super::aggregate::group_records;
use super::result::{QueryResult, ResultData, ResultType, TrendPoint};

const TIME_COLUMN: Column = Column::Month;
const TARGET: Column = Column::AbsenceHours;

pub(super) fn run(dataset: &Dataset) -> Result<QueryResult> {
    let rows = dataset.records().iter().collect::<Vec<_>>();

    let mut data = Vec::new();
    for (month, members) in group_records(&rows, TIME_COLUMN) {
        let values = column_values(members, TARGET);
        let Some(mean) = stats::mean(&values) else {
            continue;
        };
        data.push(TrendPoint {
            period: month_name(month),
            period_num: month,
            mean: stats::round2(mean),
            count: values.len(),
            total: stats::round2(stats::sum(&values)),
        });
    }

    let row_count = data.len();
    Ok(QueryResult::ok(
        ResultType::ChartData,
        ResultData::Trend {
            time_column: TIME_COLUMN,
            target: TARGET,
            data,
        },
        format!("Trend of {} over months", TARGET.label()),
        format!("Analyzing {} trend by month", TARGET.label()),
        row_count,
    ))
}
