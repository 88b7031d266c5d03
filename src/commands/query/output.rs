use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::nlp::NlpResponse;
use crate::nlp::executor::{MetricValue, ResponseSource, ResultData};

pub(super) fn write_json_response(response: &NlpResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize query json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_text_response(query: &str, response: &NlpResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    render_text(&mut output, query, response)?;
    output.flush()?;
    Ok(())
}

fn render_text<W: Write>(output: &mut W, query: &str, response: &NlpResponse) -> io::Result<()> {
    writeln!(output, "Query: {query}")?;
    match response.intent {
        Some(intent) => writeln!(
            output,
            "Intent: {intent} (confidence {:.2})",
            response.confidence
        )?,
        None => writeln!(output, "Intent: none")?,
    }
    writeln!(output, "Interpretation: {}", response.interpretation)?;
    writeln!(
        output,
        "Result: {} rows={}",
        response.result_type.as_str(),
        response.row_count
    )?;
    writeln!(output)?;
    writeln!(output, "{}", response.message)?;

    if let Some(data) = &response.data {
        render_data(output, data)?;
    }

    if !response.suggestions.is_empty() {
        writeln!(output)?;
        writeln!(output, "Try also:")?;
        for suggestion in &response.suggestions {
            writeln!(output, "  - {suggestion}")?;
        }
    }
    Ok(())
}

fn render_data<W: Write>(output: &mut W, data: &ResultData) -> io::Result<()> {
    match data {
        ResultData::Records { records } => {
            if records.is_empty() {
                return Ok(());
            }
            writeln!(output)?;
            writeln!(output, "row\temployee\treason\tmonth\tage\thours")?;
            for record in records {
                writeln!(
                    output,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    record.row_id,
                    record.employee_id,
                    record.reason_code,
                    record.month,
                    record.age,
                    record.absence_hours
                )?;
            }
        }
        ResultData::Single { sample_size, .. } => {
            writeln!(output, "Sample size: {sample_size}")?;
        }
        ResultData::Grouped {
            group_by, groups, ..
        } => {
            writeln!(output)?;
            for (key, value) in groups {
                writeln!(output, "{}={key}\t{}", group_by.as_str(), format_metric(*value))?;
            }
        }
        ResultData::Comparison { group_by, data, .. } => {
            writeln!(output)?;
            for (key, stats) in data {
                writeln!(
                    output,
                    "{}={key}\tmean={}\tcount={}\tstd={}",
                    group_by.as_str(),
                    format_number(stats.mean),
                    stats.count,
                    format_number(stats.std)
                )?;
            }
        }
        ResultData::Trend { data, .. } => {
            writeln!(output)?;
            for point in data {
                writeln!(
                    output,
                    "{:>2} {:<9}\tmean={}\tcount={}\ttotal={}",
                    point.period_num, point.period, point.mean, point.count, point.total
                )?;
            }
        }
        ResultData::Redirect { redirect } => {
            writeln!(output, "Redirect: {redirect}")?;
        }
        ResultData::Response { source, .. } => {
            let source = match source {
                ResponseSource::Ai => "text generator",
                ResponseSource::Fallback => "dataset overview",
            };
            writeln!(output, "Source: {source}")?;
        }
    }
    Ok(())
}

fn format_metric(value: Option<MetricValue>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| value.to_string())
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| value.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::dataset::Column;
    use crate::nlp::executor::{GroupStats, ResultType};
    use crate::nlp::intent::Intent;

    fn response(data: ResultData) -> NlpResponse {
        NlpResponse {
            success: true,
            intent: Some(Intent::Compare),
            confidence: 0.213,
            matched_patterns: vec!["compare.verb".to_string()],
            result_type: ResultType::ChartData,
            data: Some(data),
            message: "Comparison of Absenteeism time in hours by Social smoker".to_string(),
            interpretation: "Comparing groups".to_string(),
            row_count: 2,
            suggestions: vec!["Show monthly absence trends".to_string()],
        }
    }

    fn rendered(response: &NlpResponse) -> String {
        let mut buffer = Vec::new();
        render_text(&mut buffer, "compare smokers", response).expect("render");
        String::from_utf8(buffer).expect("utf8")
    }

    #[test]
    fn comparison_renders_one_line_per_group() {
        let data = BTreeMap::from([
            (
                0,
                GroupStats {
                    mean: Some(8.89),
                    count: 9,
                    std: Some(9.94),
                },
            ),
            (
                1,
                GroupStats {
                    mean: Some(24.33),
                    count: 1,
                    std: None,
                },
            ),
        ]);
        let text = rendered(&response(ResultData::Comparison {
            group_by: Column::SocialSmoker,
            target: Column::AbsenceHours,
            data,
        }));

        assert!(text.starts_with("Query: compare smokers\nIntent: compare (confidence 0.21)\n"));
        assert!(text.contains("Result: chart_data rows=2\n"));
        assert!(text.contains("social_smoker=0\tmean=8.89\tcount=9\tstd=9.94\n"));
        assert!(text.contains("social_smoker=1\tmean=24.33\tcount=1\tstd=n/a\n"));
        assert!(text.ends_with("Try also:\n  - Show monthly absence trends\n"));
    }

    #[test]
    fn grouped_metrics_render_counts_and_missing_values() {
        let groups = BTreeMap::from([(1, Some(MetricValue::Count(8))), (4, None)]);
        let text = rendered(&response(ResultData::Grouped {
            label: "Count".to_string(),
            group_by: Column::Education,
            groups,
        }));

        assert!(text.contains("education=1\t8\n"));
        assert!(text.contains("education=4\tn/a\n"));
    }
}
