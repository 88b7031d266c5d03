use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

/// Query intents. Declaration order is the tie-break order when two intents
/// score the same.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Filter,
    Aggregate,
    Compare,
    Trend,
    Predict,
    General,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Aggregate => "aggregate",
            Self::Compare => "compare",
            Self::Trend => "trend",
            Self::Predict => "predict",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub intent: Intent,
    pub confidence: f64,
    pub matched_patterns: Vec<String>,
}

const PATTERN_WEIGHT: f64 = 1.0;
const KEYWORD_WEIGHT: f64 = 0.3;
const MIN_CONFIDENCE: f64 = 0.2;
const MIN_SCORE: f64 = 0.5;
const NO_MATCH_CONFIDENCE: f64 = 0.5;

type PatternSpec = (&'static str, &'static str);

const FILTER_PATTERNS: &[PatternSpec] = &[
    (
        "filter.list_people",
        r"\b(show|list|find|get|display|who)\b.*\b(employees?|workers?|staff)\b",
    ),
    (
        "filter.people_having",
        r"\b(employees?|workers?)\b.*(where|with|having|that have)\b",
    ),
    ("filter.who_has", r"\bwho (has|have|is|are)\b"),
    ("filter.verb", r"\b(filter|search)\b"),
    (
        "filter.comparison",
        r"\b(more|less|greater|fewer|above|below|over|under)\s+than\b",
    ),
    ("filter.at_risk", r"\bat[\s-]?risk\b"),
];

const AGGREGATE_PATTERNS: &[PatternSpec] = &[
    ("aggregate.mean", r"\b(average|avg|mean)\b"),
    ("aggregate.sum", r"\b(total|sum)\b"),
    ("aggregate.count", r"\b(count|how many|number of)\b"),
    ("aggregate.max", r"\b(maximum|max|highest|most)\b"),
    ("aggregate.min", r"\b(minimum|min|lowest|least)\b"),
    ("aggregate.median", r"\b(median|percentile)\b"),
    (
        "aggregate.what_is_the",
        r"\bwhat('s| is) the\b.*\b(average|total|count)\b",
    ),
];

const COMPARE_PATTERNS: &[PatternSpec] = &[
    ("compare.verb", r"\bcompare\b"),
    ("compare.difference", r"\bdifference\s+between\b"),
    ("compare.versus", r"\b(vs\.?|versus)\b"),
    ("compare.higher_or_lower", r"\b(higher|lower)\s+than\b.*\bor\b"),
    (
        "compare.between_groups",
        r"\bbetween\b.*\band\b.*\b(groups?|categories)\b",
    ),
    ("compare.by_dimension", r"\bby\s+(department|age|gender|education)\b"),
];

const TREND_PATTERNS: &[PatternSpec] = &[
    ("trend.word", r"\btrend\b"),
    ("trend.over_period", r"\bover\s+(time|months?|years?|weeks?)\b"),
    ("trend.periodic", r"\b(monthly|weekly|yearly|quarterly)\b"),
    ("trend.change_over", r"\bchange\b.*\bover\b"),
    ("trend.history", r"\bhistory\b"),
    ("trend.progression", r"\bprogression\b"),
];

const PREDICT_PATTERNS: &[PatternSpec] = &[
    ("predict.verb", r"\bpredict\b"),
    ("predict.forecast", r"\bforecast\b"),
    ("predict.estimate", r"\bestimate\b.*\babsence\b"),
    ("predict.what_will", r"\bwhat\s+(will|would)\b.*\babsence\b"),
    ("predict.expected", r"\bexpected\s+absence\b"),
    ("predict.risk_score", r"\brisk\s+(score|level|assessment)\b"),
];

const FILTER_KEYWORDS: &[&str] = &["show", "list", "find", "employees", "who", "where", "with"];
const AGGREGATE_KEYWORDS: &[&str] = &["average", "total", "count", "how many", "sum", "mean"];
const COMPARE_KEYWORDS: &[&str] = &["compare", "difference", "vs", "versus", "between"];
const TREND_KEYWORDS: &[&str] = &["trend", "over time", "monthly", "history", "progression"];
const PREDICT_KEYWORDS: &[&str] = &["predict", "forecast", "estimate", "risk", "expected"];

#[derive(Debug)]
struct IntentPattern {
    id: &'static str,
    regex: Regex,
}

#[derive(Debug)]
struct IntentRule {
    intent: Intent,
    patterns: Vec<IntentPattern>,
    keywords: &'static [&'static str],
}

impl IntentRule {
    fn new(
        intent: Intent,
        specs: &[PatternSpec],
        keywords: &'static [&'static str],
    ) -> Result<Self> {
        let mut patterns = Vec::with_capacity(specs.len());
        for (id, source) in specs {
            let regex = Regex::new(source)
                .with_context(|| format!("failed to compile intent pattern {id}"))?;
            patterns.push(IntentPattern { id, regex });
        }
        Ok(Self {
            intent,
            patterns,
            keywords,
        })
    }

    fn max_score(&self) -> f64 {
        self.patterns.len() as f64 * PATTERN_WEIGHT + self.keywords.len() as f64 * KEYWORD_WEIGHT
    }
}

/// Rule-based classifier: regex hits score 1.0, keyword substrings 0.3.
#[derive(Debug)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rules: vec![
                IntentRule::new(Intent::Filter, FILTER_PATTERNS, FILTER_KEYWORDS)?,
                IntentRule::new(Intent::Aggregate, AGGREGATE_PATTERNS, AGGREGATE_KEYWORDS)?,
                IntentRule::new(Intent::Compare, COMPARE_PATTERNS, COMPARE_KEYWORDS)?,
                IntentRule::new(Intent::Trend, TREND_PATTERNS, TREND_KEYWORDS)?,
                IntentRule::new(Intent::Predict, PREDICT_PATTERNS, PREDICT_KEYWORDS)?,
            ],
        })
    }

    pub fn classify(&self, query: &str) -> ClassificationResult {
        let lowered = query.trim().to_lowercase();

        let mut best: Option<(&IntentRule, f64, Vec<String>)> = None;
        for rule in &self.rules {
            let matched = rule
                .patterns
                .iter()
                .filter(|pattern| pattern.regex.is_match(&lowered))
                .map(|pattern| pattern.id.to_string())
                .collect::<Vec<String>>();
            let keyword_hits = rule
                .keywords
                .iter()
                .filter(|keyword| lowered.contains(*keyword))
                .count();
            let score = matched.len() as f64 * PATTERN_WEIGHT + keyword_hits as f64 * KEYWORD_WEIGHT;

            // strict comparison keeps the earlier intent on ties
            if best.as_ref().is_none_or(|(_, best_score, _)| score > *best_score) {
                best = Some((rule, score, matched));
            }
        }

        let Some((rule, score, matched)) = best.filter(|(_, score, _)| *score > 0.0) else {
            return ClassificationResult {
                intent: Intent::General,
                confidence: NO_MATCH_CONFIDENCE,
                matched_patterns: Vec::new(),
            };
        };

        let max_possible = rule.max_score();
        let confidence = if max_possible > 0.0 {
            (score / max_possible).clamp(0.0, 1.0)
        } else {
            0.0
        };

        if confidence < MIN_CONFIDENCE || score < MIN_SCORE {
            return ClassificationResult {
                intent: Intent::General,
                confidence: 1.0 - confidence,
                matched_patterns: Vec::new(),
            };
        }

        ClassificationResult {
            intent: rule.intent,
            confidence,
            matched_patterns: matched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new().expect("intent patterns should compile")
    }

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn filter_query_scores_patterns_and_keywords() {
        let result = classifier().classify("Show employees with more than 20 hours of absence");
        assert_eq!(result.intent, Intent::Filter);
        // three patterns plus "show", "employees", "with"
        assert!(approx(result.confidence, 3.9 / 8.1));
        assert_eq!(
            result.matched_patterns,
            vec!["filter.list_people", "filter.people_having", "filter.comparison"]
        );
    }

    #[test]
    fn average_with_field_selects_aggregate() {
        let result = classifier().classify("What is the average age?");
        assert_eq!(result.intent, Intent::Aggregate);
        assert!(approx(result.confidence, 2.3 / 8.8));
        assert_eq!(
            result.matched_patterns,
            vec!["aggregate.mean", "aggregate.what_is_the"]
        );
    }

    #[test]
    fn weak_aggregate_signal_escalates_to_general_with_inverted_confidence() {
        // one pattern and one keyword: 1.3 / 8.8 is below the 0.2 floor
        let result = classifier().classify("average bmi");
        assert_eq!(result.intent, Intent::General);
        assert!(approx(result.confidence, 1.0 - 1.3 / 8.8));
        assert!(result.matched_patterns.is_empty());

        let result = classifier().classify("How many employees have disciplinary failures?");
        assert_eq!(result.intent, Intent::General);
        assert!(approx(result.confidence, 1.0 - 1.3 / 8.8));
    }

    #[test]
    fn keyword_only_score_below_half_escalates() {
        // "list" keyword alone scores 0.3
        let result = classifier().classify("list");
        assert_eq!(result.intent, Intent::General);
        assert!(approx(result.confidence, 1.0 - 0.3 / 8.1));
    }

    #[test]
    fn compare_query_clears_threshold() {
        let result = classifier().classify("Compare absence between smokers and non-smokers");
        assert_eq!(result.intent, Intent::Compare);
        assert!(approx(result.confidence, 1.6 / 7.5));
        assert_eq!(result.matched_patterns, vec!["compare.verb"]);
    }

    #[test]
    fn trend_and_predict_queries_route() {
        assert_eq!(
            classifier().classify("Show monthly absence trends").intent,
            Intent::Trend
        );
        assert_eq!(
            classifier()
                .classify("Predict the expected absence for a new hire")
                .intent,
            Intent::Predict
        );
    }

    #[test]
    fn ties_resolve_to_first_declared_intent() {
        // filter and compare each fire two patterns and no keywords
        let result = classifier().classify("filter at risk higher than x or by age");
        assert_eq!(result.intent, Intent::Filter);
        assert!(approx(result.confidence, 2.0 / 8.1));
        assert_eq!(
            result.matched_patterns,
            vec!["filter.verb", "filter.at_risk"]
        );
    }

    #[test]
    fn empty_and_unmatched_queries_are_neutral_general() {
        for query in ["", "   ", "hello there"] {
            let result = classifier().classify(query);
            assert_eq!(result.intent, Intent::General);
            assert_eq!(result.confidence, 0.5);
            assert!(result.matched_patterns.is_empty());
        }
    }

    #[test]
    fn classification_is_repeatable() {
        let classifier = classifier();
        let query = "What's the average absence by education level?";
        let first = serde_json::to_string(&classifier.classify(query)).expect("json");
        let second = serde_json::to_string(&classifier.classify(query)).expect("json");
        assert_eq!(first, second);
    }
}
