use std::collections::BTreeMap;

use anyhow::Result;

use crate::dataset::{Column, Dataset, column_values, stats};
use crate::nlp::entities::ExtractedEntities;

use super::aggregate::group_records;
use super::result::{GroupStats, QueryResult, ResultData, ResultType};

const TARGET: Column = Column::AbsenceHours;

/// Inferred grouping columns, checked in order against the raw query.
const GROUP_HINTS: &[(&str, Column)] = &[
    ("smoker", Column::SocialSmoker),
    ("drinker", Column::SocialDrinker),
    ("education", Column::Education),
    ("age", Column::Age),
];

fn resolve_group(entities: &ExtractedEntities, query: &str) -> Column {
    if let Some(&group) = entities.groups.first() {
        return group;
    }
    let lowered = query.to_lowercase();
    GROUP_HINTS
        .iter()
        .find(|(hint, _)| lowered.contains(hint))
        .map_or(Column::Education, |&(_, column)| column)
}

pub(super) fn run(dataset: &Dataset, entities: &ExtractedEntities, query: &str) -> Result<QueryResult> {
    let group_by = resolve_group(entities, query);
    let rows = dataset.records().iter().collect::<Vec<_>>();

    let data = group_records(&rows, group_by)
        .into_iter()
        .map(|(key, members)| {
            let values = column_values(members, TARGET);
            let summary = GroupStats {
                mean: stats::mean(&values).map(stats::round2),
                count: values.len(),
                std: stats::std_dev(&values).map(stats::round2),
            };
            (key, summary)
        })
        .collect::<BTreeMap<_, _>>();

    let row_count = data.len();
    Ok(QueryResult::ok(
        ResultType::ChartData,
        ResultData::Comparison {
            group_by,
            target: TARGET,
            data,
        },
        format!("Comparison of {} by {}", TARGET.label(), group_by.label()),
        format!(
            "Comparing {} across different {} groups",
            TARGET.label(),
            group_by.label()
        ),
        row_count,
    ))
}
