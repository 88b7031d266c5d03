use anyhow::{Context, Result};

use crate::dataset::{AbsenceRecord, Column, Dataset, stats};
use crate::nlp::entities::{Condition, ExtractedEntities};

use super::result::{QueryResult, ResultData, ResultType};

pub(super) const MAX_TABLE_ROWS: usize = 100;
const RISK_MULTIPLIER: f64 = 1.5;

/// Rows matching every condition, in dataset order.
pub(super) fn apply_conditions<'a>(
    records: &'a [AbsenceRecord],
    conditions: &[Condition],
) -> Vec<&'a AbsenceRecord> {
    records
        .iter()
        .filter(|record| {
            conditions
                .iter()
                .all(|condition| condition.comparison.matches(record.value(condition.field)))
        })
        .collect()
}

pub(super) fn run(dataset: &Dataset, entities: &ExtractedEntities, query: &str) -> Result<QueryResult> {
    let mut selected = apply_conditions(dataset.records(), &entities.conditions);
    let mut applied = entities
        .conditions
        .iter()
        .map(Condition::describe)
        .collect::<Vec<_>>();

    if entities.conditions.is_empty() && query.to_lowercase().contains("risk") {
        let average = stats::mean(&dataset.values(Column::AbsenceHours))
            .context("cannot derive a risk threshold from an empty dataset")?;
        let threshold = average * RISK_MULTIPLIER;
        selected.retain(|record| record.absence_hours > threshold);
        applied.push(format!(
            "{} > {threshold:.1} hours (high risk)",
            Column::AbsenceHours.label()
        ));
    }

    let total = selected.len();
    let records = selected
        .into_iter()
        .take(MAX_TABLE_ROWS)
        .cloned()
        .collect::<Vec<_>>();

    let mut message = format!("Found {total} matching records");
    if total > MAX_TABLE_ROWS {
        message.push_str(&format!(" (showing first {MAX_TABLE_ROWS})"));
    }
    let interpretation = if applied.is_empty() {
        "Showing all records".to_string()
    } else {
        format!("Filtering: {}", applied.join(" AND "))
    };

    Ok(QueryResult::ok(
        ResultType::Table,
        ResultData::Records { records },
        message,
        interpretation,
        total,
    ))
}
