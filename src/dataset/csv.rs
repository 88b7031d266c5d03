use anyhow::{Context, Result, bail};

use super::column::Column;
use super::record::AbsenceRecord;

const DELIMITER: char = ';';

/// Parses the semicolon-separated absenteeism export. Row identifiers follow
/// data-line order starting at 1.
pub fn parse_csv(text: &str) -> Result<Vec<AbsenceRecord>> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_start_matches('\u{feff}')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines.next().context("dataset is empty: missing header row")?;
    let columns = parse_header(header)
        .with_context(|| format!("invalid header on line {header_line}"))?;

    let mut records = Vec::new();
    for (line_number, line) in lines {
        let cells = line.split(DELIMITER).collect::<Vec<&str>>();
        if cells.len() != columns.len() {
            bail!(
                "line {line_number}: expected {} cells, found {}",
                columns.len(),
                cells.len()
            );
        }

        let mut record = AbsenceRecord {
            row_id: records.len() as i64 + 1,
            ..AbsenceRecord::default()
        };
        for (column, cell) in columns.iter().zip(cells) {
            let raw = cell.trim().parse::<f64>().with_context(|| {
                format!(
                    "line {line_number}: invalid number {:?} for {}",
                    cell.trim(),
                    column.label()
                )
            })?;
            record
                .set(*column, raw)
                .map_err(|message| anyhow::anyhow!("line {line_number}: {message}"))?;
        }
        records.push(record);
    }

    Ok(records)
}

fn parse_header(header: &str) -> Result<Vec<Column>> {
    let mut columns = Vec::new();
    for raw in header.split(DELIMITER) {
        let column = Column::from_label(raw)
            .with_context(|| format!("unrecognized column header {:?}", raw.trim()))?;
        if columns.contains(&column) {
            bail!("duplicate column header {:?}", raw.trim());
        }
        columns.push(column);
    }

    let missing = Column::ALL
        .into_iter()
        .filter(|column| !columns.contains(column))
        .map(Column::label)
        .collect::<Vec<&str>>();
    if !missing.is_empty() {
        bail!("missing columns: {}", missing.join(", "));
    }

    Ok(columns)
}
