use std::fmt;
use std::ops::Range;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::dataset::Column;

/// Alias phrases in match order. Several aliases may name the same column.
const FIELD_ALIASES: &[(&str, Column)] = &[
    ("absence", Column::AbsenceHours),
    ("absent", Column::AbsenceHours),
    ("absenteeism", Column::AbsenceHours),
    ("hours", Column::AbsenceHours),
    ("absence hours", Column::AbsenceHours),
    ("time off", Column::AbsenceHours),
    ("age", Column::Age),
    ("years old", Column::Age),
    ("bmi", Column::Bmi),
    ("body mass", Column::Bmi),
    ("weight", Column::Weight),
    ("height", Column::Height),
    ("service", Column::ServiceTime),
    ("tenure", Column::ServiceTime),
    ("years of service", Column::ServiceTime),
    ("experience", Column::ServiceTime),
    ("workload", Column::Workload),
    ("work load", Column::Workload),
    ("target", Column::HitTarget),
    ("performance", Column::HitTarget),
    ("distance", Column::Distance),
    ("commute", Column::Distance),
    ("transport", Column::TransportationExpense),
    ("transportation", Column::TransportationExpense),
    ("education", Column::Education),
    ("reason", Column::ReasonCode),
    ("absence reason", Column::ReasonCode),
    ("day", Column::DayOfWeek),
    ("weekday", Column::DayOfWeek),
    ("month", Column::Month),
    ("season", Column::Season),
    ("children", Column::Children),
    ("kids", Column::Children),
    ("son", Column::Children),
    ("sons", Column::Children),
    ("pets", Column::Pets),
    ("pet", Column::Pets),
    ("drinker", Column::SocialDrinker),
    ("drinking", Column::SocialDrinker),
    ("smoker", Column::SocialSmoker),
    ("smoking", Column::SocialSmoker),
    ("disciplinary", Column::DisciplinaryFailure),
    ("discipline", Column::DisciplinaryFailure),
    ("employee id", Column::EmployeeId),
];

const AGGREGATION_KEYWORDS: &[(&str, Aggregation)] = &[
    ("average", Aggregation::Mean),
    ("avg", Aggregation::Mean),
    ("mean", Aggregation::Mean),
    ("total", Aggregation::Sum),
    ("sum", Aggregation::Sum),
    ("count", Aggregation::Count),
    ("number", Aggregation::Count),
    ("how many", Aggregation::Count),
    ("maximum", Aggregation::Max),
    ("max", Aggregation::Max),
    ("highest", Aggregation::Max),
    ("most", Aggregation::Max),
    ("minimum", Aggregation::Min),
    ("min", Aggregation::Min),
    ("lowest", Aggregation::Min),
    ("least", Aggregation::Min),
    ("median", Aggregation::Median),
];

const GROUP_KEYWORDS: &[(&str, Column)] = &[
    ("by age", Column::Age),
    ("by education", Column::Education),
    // the dataset has no department; reason is the closest grouping
    ("by department", Column::ReasonCode),
    ("by reason", Column::ReasonCode),
    ("by month", Column::Month),
    ("by day", Column::DayOfWeek),
    ("by season", Column::Season),
    ("per employee", Column::EmployeeId),
];

const NUMBER: &str = r"(?P<value>\d+(?:\.\d+)?)";

const GREATER_THAN_PATTERNS: &[&str] = &[r"(greater|more|over|above|>)\s*(than)?", r">\s*=?"];
const LESS_THAN_PATTERNS: &[&str] = &[r"(less|fewer|under|below|<)\s*(than)?", r"<\s*=?"];
// a bare "=" must not be the tail of "!=", ">=", "<=" or "=="
const EQUALS_PATTERNS: &[&str] = &[r"(equals?|is|are|(?:^|[^!<>=])=)\s*(to)?", r"=="];
const NOT_EQUALS_PATTERNS: &[&str] = &[r"(not|isn't|aren't|!=)\s*(equal)?"];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Mean,
    Sum,
    Count,
    Max,
    Min,
    Median,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Median => "median",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ComparisonKind {
    GreaterThan,
    LessThan,
    Equals,
    NotEquals,
}

impl ComparisonKind {
    fn with_value(self, value: f64) -> Comparison {
        match self {
            Self::GreaterThan => Comparison::GreaterThan(value),
            Self::LessThan => Comparison::LessThan(value),
            Self::Equals => Comparison::Equals(value),
            Self::NotEquals => Comparison::NotEquals(value),
        }
    }
}

/// Operator and operand of one filter clause. `Between` always holds
/// `(low, high)` with `low <= high`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "operator", content = "value", rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan(f64),
    LessThan(f64),
    Equals(f64),
    NotEquals(f64),
    Between(f64, f64),
}

impl Comparison {
    pub fn between(first: f64, second: f64) -> Self {
        Self::Between(first.min(second), first.max(second))
    }

    pub fn operator_name(&self) -> &'static str {
        match self {
            Self::GreaterThan(_) => "greater_than",
            Self::LessThan(_) => "less_than",
            Self::Equals(_) => "equals",
            Self::NotEquals(_) => "not_equals",
            Self::Between(..) => "between",
        }
    }

    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Self::GreaterThan(limit) => value > limit,
            Self::LessThan(limit) => value < limit,
            Self::Equals(target) => value == target,
            Self::NotEquals(target) => value != target,
            Self::Between(low, high) => value >= low && value <= high,
        }
    }

    fn operands(&self) -> Vec<f64> {
        match *self {
            Self::GreaterThan(value)
            | Self::LessThan(value)
            | Self::Equals(value)
            | Self::NotEquals(value) => vec![value],
            Self::Between(low, high) => vec![low, high],
        }
    }
}

/// One conjunctive filter clause on a canonical column.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Condition {
    pub field: Column,
    #[serde(flatten)]
    pub comparison: Comparison,
}

impl Condition {
    pub fn new(field: Column, comparison: Comparison) -> Self {
        Self { field, comparison }
    }

    pub fn describe(&self) -> String {
        let label = self.field.label();
        match self.comparison {
            Comparison::GreaterThan(value) => format!("{label} > {value}"),
            Comparison::LessThan(value) => format!("{label} < {value}"),
            Comparison::Equals(value) => format!("{label} = {value}"),
            Comparison::NotEquals(value) => format!("{label} != {value}"),
            Comparison::Between(low, high) => format!("{label} between {low} and {high}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedEntities {
    pub fields: Vec<Column>,
    pub operators: Vec<String>,
    pub values: Vec<f64>,
    pub aggregations: Vec<Aggregation>,
    pub groups: Vec<Column>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug)]
struct ComparisonRule {
    kind: ComparisonKind,
    /// Operator followed by a number, searched after the alias.
    trailing: Vec<Regex>,
    /// Operator and number directly in front of the alias ("more than 20 hours").
    leading: Vec<Regex>,
}

impl ComparisonRule {
    fn new(kind: ComparisonKind, patterns: &[&str]) -> Result<Self> {
        let mut trailing = Vec::with_capacity(patterns.len());
        let mut leading = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            trailing.push(
                Regex::new(&format!(r"{pattern}\s*{NUMBER}"))
                    .with_context(|| format!("failed to compile {kind:?} pattern"))?,
            );
            leading.push(
                Regex::new(&format!(r"{pattern}\s*{NUMBER}\s+"))
                    .with_context(|| format!("failed to compile leading {kind:?} pattern"))?,
            );
        }
        Ok(Self {
            kind,
            trailing,
            leading,
        })
    }

    fn find_after(&self, remainder: &str) -> Option<f64> {
        self.trailing
            .iter()
            .find_map(|regex| capture_value(regex, remainder))
    }

    /// Value and byte span of the number in front of `alias`. The alias must
    /// end on a word boundary, so "3 days" does not bind to "day".
    fn find_before(&self, query: &str, alias: &str) -> Option<(f64, Range<usize>)> {
        self.leading.iter().find_map(|regex| {
            regex.captures_iter(query).find_map(|captures| {
                let whole = captures.get(0)?;
                if !alias_at(query, whole.end(), alias) {
                    return None;
                }
                let number = captures.name("value")?;
                Some((parse_value(number.as_str())?, number.range()))
            })
        })
    }
}

fn alias_at(query: &str, start: usize, alias: &str) -> bool {
    query[start..]
        .strip_prefix(alias)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric()))
}

fn capture_value(regex: &Regex, text: &str) -> Option<f64> {
    let captures = regex.captures(text)?;
    parse_value(captures.name("value")?.as_str())
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok()
}

/// Scans a query for column aliases, filter clauses, aggregation keywords and
/// grouping phrases. Matching is plain substring search on the lowered text.
#[derive(Debug)]
pub struct EntityExtractor {
    comparisons: Vec<ComparisonRule>,
    between: Regex,
    implied_age: Regex,
}

impl EntityExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            comparisons: vec![
                ComparisonRule::new(ComparisonKind::GreaterThan, GREATER_THAN_PATTERNS)?,
                ComparisonRule::new(ComparisonKind::LessThan, LESS_THAN_PATTERNS)?,
                ComparisonRule::new(ComparisonKind::Equals, EQUALS_PATTERNS)?,
                ComparisonRule::new(ComparisonKind::NotEquals, NOT_EQUALS_PATTERNS)?,
            ],
            between: Regex::new(r"between\s+(\d+(?:\.\d+)?)\s+(?:and|to)\s+(\d+(?:\.\d+)?)")
                .context("failed to compile between pattern")?,
            implied_age: Regex::new(r"(over|under|above|below)\s+(\d{2})\b\s*(years?|old)?")
                .context("failed to compile implied age pattern")?,
        })
    }

    pub fn extract(&self, query: &str) -> ExtractedEntities {
        let lowered = query.to_lowercase();
        let conditions = self.extract_conditions(&lowered);

        let mut operators = Vec::new();
        let mut values = Vec::new();
        for condition in &conditions {
            push_unique(&mut operators, condition.comparison.operator_name().to_string());
            values.extend(condition.comparison.operands());
        }

        ExtractedEntities {
            fields: collect_matches(&lowered, FIELD_ALIASES),
            operators,
            values,
            aggregations: collect_matches(&lowered, AGGREGATION_KEYWORDS),
            groups: collect_matches(&lowered, GROUP_KEYWORDS),
            conditions,
        }
    }

    fn extract_conditions(&self, query: &str) -> Vec<Condition> {
        let mut conditions = Vec::new();
        // numbers already bound to an alias by the leading form
        let mut consumed: Vec<Range<usize>> = Vec::new();

        for (alias, column) in FIELD_ALIASES {
            let Some(position) = query.find(alias) else {
                continue;
            };
            let remainder = &query[position..];

            for rule in &self.comparisons {
                let value = rule.find_after(remainder).or_else(|| {
                    let (value, span) = rule.find_before(query, alias)?;
                    consumed.push(span);
                    Some(value)
                });
                if let Some(value) = value {
                    push_unique(
                        &mut conditions,
                        Condition::new(*column, rule.kind.with_value(value)),
                    );
                }
            }

            if let Some(captures) = self.between.captures(remainder) {
                let low = captures.get(1).and_then(|m| parse_value(m.as_str()));
                let high = captures.get(2).and_then(|m| parse_value(m.as_str()));
                if let (Some(low), Some(high)) = (low, high) {
                    push_unique(
                        &mut conditions,
                        Condition::new(*column, Comparison::between(low, high)),
                    );
                }
            }
        }

        // "employees over 40" talks about age without naming it
        let age_targeted = conditions
            .iter()
            .any(|condition| condition.field == Column::Age);
        if age_targeted {
            return conditions;
        }

        let implied = self.implied_age.captures(query).and_then(|captures| {
            let number = captures.get(2)?;
            let reused = consumed
                .iter()
                .any(|span| span.start < number.end() && number.start() < span.end);
            if reused {
                return None;
            }
            let value = parse_value(number.as_str())?;
            Some(match captures.get(1).map(|m| m.as_str()) {
                Some("over" | "above") => Comparison::GreaterThan(value),
                _ => Comparison::LessThan(value),
            })
        });
        if let Some(comparison) = implied {
            conditions.push(Condition::new(Column::Age, comparison));
        }

        conditions
    }
}

fn collect_matches<T: Copy + PartialEq>(query: &str, table: &[(&str, T)]) -> Vec<T> {
    let mut found = Vec::new();
    for (phrase, value) in table {
        if query.contains(phrase) {
            push_unique(&mut found, *value);
        }
    }
    found
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new().expect("entity patterns should compile")
    }

    #[test]
    fn leading_comparison_binds_to_following_alias() {
        let entities = extractor().extract("Show employees with more than 20 hours of absence");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(
                Column::AbsenceHours,
                Comparison::GreaterThan(20.0)
            )]
        );
        assert_eq!(entities.fields, vec![Column::AbsenceHours]);
        assert_eq!(entities.operators, vec!["greater_than"]);
        assert_eq!(entities.values, vec![20.0]);
    }

    #[test]
    fn leading_comparison_requires_whole_alias_word() {
        let entities = extractor().extract("Show employees absent more than 3 days");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(
                Column::AbsenceHours,
                Comparison::GreaterThan(3.0)
            )]
        );
    }

    #[test]
    fn number_bound_by_leading_comparison_does_not_imply_age() {
        let entities = extractor().extract("workers over 10 years of service");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(
                Column::ServiceTime,
                Comparison::GreaterThan(10.0)
            )]
        );
    }

    #[test]
    fn alias_followed_by_greater_than_yields_one_condition() {
        for (query, column) in [
            ("age greater than 40", Column::Age),
            ("absence hours greater than 12.5", Column::AbsenceHours),
            ("distance greater than 30", Column::Distance),
        ] {
            let entities = extractor().extract(query);
            let expected_value = query
                .rsplit(' ')
                .next()
                .and_then(|raw| raw.parse::<f64>().ok())
                .expect("trailing number");
            assert_eq!(
                entities.conditions,
                vec![Condition::new(column, Comparison::GreaterThan(expected_value))],
                "query: {query}"
            );
        }
    }

    #[test]
    fn between_produces_ordered_range() {
        let entities = extractor().extract("service time between 5 and 10");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(
                Column::ServiceTime,
                Comparison::Between(5.0, 10.0)
            )]
        );

        let reversed = extractor().extract("service between 10 to 5");
        assert_eq!(
            reversed.conditions[0].comparison,
            Comparison::Between(5.0, 10.0)
        );
    }

    #[test]
    fn simple_and_between_conditions_on_same_field_are_both_kept() {
        let entities = extractor().extract("age over 30 and age between 25 and 50");
        assert_eq!(
            entities.conditions,
            vec![
                Condition::new(Column::Age, Comparison::GreaterThan(30.0)),
                Condition::new(Column::Age, Comparison::Between(25.0, 50.0)),
            ]
        );
    }

    #[test]
    fn bare_number_after_over_implies_age() {
        let entities = extractor().extract("list staff under 35");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(Column::Age, Comparison::LessThan(35.0))]
        );

        let entities = extractor().extract("show employees over 40 years old");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(Column::Age, Comparison::GreaterThan(40.0))]
        );
    }

    #[test]
    fn equals_ignores_compound_operators() {
        let entities = extractor().extract("bmi >= 30");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(Column::Bmi, Comparison::GreaterThan(30.0))]
        );
        assert!(!entities.conditions[0].comparison.matches(30.0));

        let entities = extractor().extract("education != 1");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(Column::Education, Comparison::NotEquals(1.0))]
        );

        let entities = extractor().extract("education is 3");
        assert_eq!(
            entities.conditions,
            vec![Condition::new(Column::Education, Comparison::Equals(3.0))]
        );
    }

    #[test]
    fn substring_aliases_match_inside_longer_words() {
        // "average" contains "age"; accepted precision trade-off
        let entities = extractor().extract("what is the average bmi");
        assert_eq!(entities.fields, vec![Column::Age, Column::Bmi]);
        assert_eq!(entities.aggregations, vec![Aggregation::Mean]);
    }

    #[test]
    fn aggregations_and_groups_follow_table_order() {
        let entities = extractor().extract("total and max absence by month and by education");
        assert_eq!(entities.aggregations, vec![Aggregation::Sum, Aggregation::Max]);
        assert_eq!(entities.groups, vec![Column::Education, Column::Month]);
        assert_eq!(
            entities.fields,
            vec![Column::AbsenceHours, Column::Education, Column::Month]
        );
    }

    #[test]
    fn condition_serializes_with_operator_and_value() {
        let between = Condition::new(Column::Age, Comparison::Between(30.0, 40.0));
        assert_eq!(
            serde_json::to_value(between).expect("json"),
            serde_json::json!({"field": "age", "operator": "between", "value": [30.0, 40.0]})
        );
        let greater = Condition::new(Column::AbsenceHours, Comparison::GreaterThan(20.0));
        assert_eq!(
            serde_json::to_value(greater).expect("json"),
            serde_json::json!({"field": "absence_hours", "operator": "greater_than", "value": 20.0})
        );
    }

    #[test]
    fn extraction_is_repeatable_and_handles_empty_input() {
        let extractor = extractor();
        let query = "average bmi of employees over 40 by education";
        assert_eq!(extractor.extract(query), extractor.extract(query));
        assert_eq!(extractor.extract(""), ExtractedEntities::default());
    }
}
