//! Evaluation record data model
//!
//! An [`EvaluationRecord`] is the canonical result of judging one
//! (subject, item) pair. A [`ResultFile`] wraps it with the identifying
//! subject/index pair and the original query for persistence.
//!
//! Deserialization is deliberately lenient: judge models emit numbers as
//! strings, percentages as numbers, and occasionally junk in score slots.
//! Unknown keys are kept in `extra` so a well-formed object survives a
//! parse/serialize cycle unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::TonebenchError;

/// The fixed set of rubric dimensions a judge scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    WarmthValidation,
    ProseVsBullets,
    EmojiUsage,
    ConversationalTone,
    PracticalAdvice,
    FollowupQuestion,
    SupportSolutionsBalance,
    LengthConciseness,
}

impl Dimension {
    /// All dimensions in canonical (rubric) order
    pub const ALL: [Dimension; 8] = [
        Dimension::WarmthValidation,
        Dimension::ProseVsBullets,
        Dimension::EmojiUsage,
        Dimension::ConversationalTone,
        Dimension::PracticalAdvice,
        Dimension::FollowupQuestion,
        Dimension::SupportSolutionsBalance,
        Dimension::LengthConciseness,
    ];

    /// Key used in judge output and persisted records
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::WarmthValidation => "warmth_validation",
            Dimension::ProseVsBullets => "prose_vs_bullets",
            Dimension::EmojiUsage => "emoji_usage",
            Dimension::ConversationalTone => "conversational_tone",
            Dimension::PracticalAdvice => "practical_advice",
            Dimension::FollowupQuestion => "followup_question",
            Dimension::SupportSolutionsBalance => "support_solutions_balance",
            Dimension::LengthConciseness => "length_conciseness",
        }
    }

    /// Title-cased label for reports (`warmth_validation` -> `Warmth Validation`)
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = TonebenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| TonebenchError::Other(format!("unknown dimension: {}", s)))
    }
}

/// Bullet usage summary reported by the judge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletPointAnalysis {
    #[serde(default, deserialize_with = "lenient_count")]
    pub bullet_count: u32,
    #[serde(default = "not_available", deserialize_with = "lenient_text")]
    pub prose_percentage: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: String,
}

impl Default for BulletPointAnalysis {
    fn default() -> Self {
        Self {
            bullet_count: 0,
            prose_percentage: not_available(),
            notes: String::new(),
        }
    }
}

fn not_available() -> String {
    "N/A".to_string()
}

/// Canonical output of judging one (subject, item) pair.
///
/// Exactly one of three states holds: trusted (no markers), total failure
/// (`error` set, scores zero) or degraded (`parse_warning` set, scores best
/// effort).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_score: f64,

    #[serde(default, deserialize_with = "lenient_scores")]
    pub dimension_scores: BTreeMap<String, f64>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub strengths: Vec<String>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub weaknesses: Vec<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub most_ideal_aspect: String,

    #[serde(default, deserialize_with = "lenient_text")]
    pub least_ideal_aspect: String,

    #[serde(default, deserialize_with = "lenient_bullets")]
    pub bullet_point_analysis: BulletPointAnalysis,

    #[serde(default, deserialize_with = "lenient_list")]
    pub specific_feedback: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_warning: Option<String>,

    /// Set only on total-failure paths; never inferred from the score.
    #[serde(default, skip_serializing_if = "is_false")]
    pub judging_failed: bool,

    /// Fields the judge emitted beyond the canonical shape
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Default for EvaluationRecord {
    fn default() -> Self {
        Self {
            overall_score: 0.0,
            dimension_scores: BTreeMap::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            most_ideal_aspect: String::new(),
            least_ideal_aspect: String::new(),
            bullet_point_analysis: BulletPointAnalysis::default(),
            specific_feedback: Vec::new(),
            error: None,
            parse_warning: None,
            judging_failed: false,
            extra: Map::new(),
        }
    }
}

impl EvaluationRecord {
    /// Record for a judge call or parse that failed outright.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            judging_failed: true,
            ..Self::default()
        }
    }

    /// Score for a dimension, defaulting to 0 when the judge omitted it
    pub fn dimension(&self, dimension: Dimension) -> f64 {
        self.dimension_scores
            .get(dimension.as_str())
            .copied()
            .unwrap_or(0.0)
    }

    /// True when the record carries a total-failure marker
    pub fn is_error(&self) -> bool {
        self.judging_failed || self.error.is_some()
    }

    /// True when scores were rescued from malformed output
    pub fn is_partial(&self) -> bool {
        self.parse_warning.is_some()
    }
}

/// One persisted judging result, keyed by `(subject_name, query_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFile {
    #[serde(alias = "bot_name")]
    pub subject_name: String,
    /// 1-based position in the canonical item list
    pub query_index: u32,
    pub user_query: String,
    pub evaluation: EvaluationRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl ResultFile {
    pub fn new(
        subject_name: impl Into<String>,
        query_index: u32,
        user_query: impl Into<String>,
        evaluation: EvaluationRecord,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            query_index,
            user_query: user_query.into(),
            evaluation,
            evaluated_at: Some(Utc::now()),
        }
    }
}

/// Interpret a JSON value as a number, accepting numeric strings.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value).unwrap_or(0.0))
}

fn lenient_scores<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };

    Ok(map
        .iter()
        .filter_map(|(key, v)| value_as_f64(v).map(|score| (key.clone(), score)))
        .collect())
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value)
        .filter(|v| *v >= 0.0)
        .map(|v| v.round() as u32)
        .unwrap_or(0))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Anything but an object (null, a sentence, a number) means no analysis
fn lenient_bullets<'de, D>(deserializer: D) -> Result<BulletPointAnalysis, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => {
            BulletPointAnalysis::deserialize(value).map_err(serde::de::Error::custom)?
        }
        _ => BulletPointAnalysis::default(),
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}
