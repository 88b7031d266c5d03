use std::collections::BTreeMap;

use anyhow::Result;

use crate::dataset::{AbsenceRecord, Column, Dataset, column_values, stats};
use crate::nlp::entities::{Aggregation, Condition, ExtractedEntities};

use super::filter::apply_conditions;
use super::result::{MetricValue, QueryResult, ResultData, ResultType};

pub(super) fn run(dataset: &Dataset, entities: &ExtractedEntities) -> Result<QueryResult> {
    let target = entities
        .fields
        .first()
        .copied()
        .unwrap_or(Column::AbsenceHours);
    let aggregation = entities
        .aggregations
        .first()
        .copied()
        .unwrap_or(Aggregation::Mean);

    let selected = apply_conditions(dataset.records(), &entities.conditions);
    let label = metric_label(aggregation, target);
    let mut interpretation = format!("Calculating {aggregation} of {}", target.label());

    if let Some(&group_by) = entities.groups.first() {
        let groups = group_records(&selected, group_by)
            .into_iter()
            .map(|(key, rows)| {
                let values = column_values(rows, target);
                (key, aggregate(aggregation, &values))
            })
            .collect::<BTreeMap<_, _>>();
        interpretation.push_str(&format!(" grouped by {}", group_by.label()));
        push_where(&mut interpretation, &entities.conditions);
        let row_count = groups.len();
        return Ok(QueryResult::ok(
            ResultType::ChartData,
            ResultData::Grouped {
                label: label.clone(),
                group_by,
                groups,
            },
            format!("{label} by {}", group_by.label()),
            interpretation,
            row_count,
        ));
    }

    let values = column_values(selected.iter().copied(), target);
    let value = aggregate(aggregation, &values);
    push_where(&mut interpretation, &entities.conditions);
    let rendered = value.map_or_else(|| "n/a".to_string(), |value| value.to_string());

    Ok(QueryResult::ok(
        ResultType::Metric,
        ResultData::Single {
            label: label.clone(),
            value,
            sample_size: selected.len(),
        },
        format!("{label}: {rendered}"),
        interpretation,
        1,
    ))
}

/// Rows bucketed by the integer code of `column`, keys ascending.
pub(super) fn group_records<'a>(
    records: &[&'a AbsenceRecord],
    column: Column,
) -> BTreeMap<i64, Vec<&'a AbsenceRecord>> {
    let mut groups: BTreeMap<i64, Vec<&AbsenceRecord>> = BTreeMap::new();
    for &record in records {
        groups
            .entry(record.value(column).round() as i64)
            .or_default()
            .push(record);
    }
    groups
}

fn aggregate(aggregation: Aggregation, values: &[f64]) -> Option<MetricValue> {
    let number = match aggregation {
        Aggregation::Count => return Some(MetricValue::Count(values.len())),
        Aggregation::Sum => Some(stats::sum(values)),
        Aggregation::Mean => stats::mean(values),
        Aggregation::Max => stats::max(values),
        Aggregation::Min => stats::min(values),
        Aggregation::Median => stats::median(values),
    };
    number.map(|value| MetricValue::Number(stats::round2(value)))
}

fn metric_label(aggregation: Aggregation, target: Column) -> String {
    let prefix = match aggregation {
        Aggregation::Count => return "Count".to_string(),
        Aggregation::Mean => "Average",
        Aggregation::Sum => "Total",
        Aggregation::Max => "Maximum",
        Aggregation::Min => "Minimum",
        Aggregation::Median => "Median",
    };
    format!("{prefix} {}", target.label())
}

fn push_where(interpretation: &mut String, conditions: &[Condition]) {
    if conditions.is_empty() {
        return;
    }
    let clauses = conditions
        .iter()
        .map(Condition::describe)
        .collect::<Vec<_>>();
    interpretation.push_str(&format!(" where {}", clauses.join(" AND ")));
}
