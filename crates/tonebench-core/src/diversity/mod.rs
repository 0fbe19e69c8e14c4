//! Response diversity analysis
//!
//! Works on one subject's raw responses, no judge involved. Measures how
//! varied the openings are, flags formulaic openers and folds both into a
//! 0-10 score with a qualitative grade.

mod report;

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

use crate::error::{Result, TonebenchError};
use crate::format::truncate_chars;

const OPENING_CHARS: usize = 50;
const EXCLAMATION_THRESHOLD: f64 = 0.5;
const EXCLAMATION_WEIGHT: f64 = 20.0;
const REPEATED_OPENING_THRESHOLD: f64 = 0.3;
const REPEATED_OPENING_WEIGHT: f64 = 15.0;
const RECOMMENDATION_BELOW: f64 = 7.0;
/// Trigrams must occur more often than this to be reported
const TRIGRAM_MIN_COUNT: usize = 5;

const OPENING_EMOJI: [char; 4] = ['😅', '😊', '💙', '🫂'];

/// First `n` whitespace-separated words, single-space joined
pub fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// First sentence up to and including its terminator, else the first 50 chars
pub fn first_sentence(text: &str, sentence: &Regex) -> String {
    match sentence.find(text) {
        Some(m) => m.as_str().trim().to_string(),
        None => truncate_chars(text, OPENING_CHARS).trim().to_string(),
    }
}

/// A repeated string and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
    pub text: String,
    pub count: usize,
}

/// Count occurrences, most common first; ties keep first-appearance order.
fn rank<I>(items: I) -> Vec<Ranked>
where
    I: IntoIterator<Item = String>,
{
    let mut order: Vec<Ranked> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for item in items {
        match position.get(&item) {
            Some(&i) => order[i].count += 1,
            None => {
                position.insert(item.clone(), order.len());
                order.push(Ranked {
                    text: item,
                    count: 1,
                });
            }
        }
    }

    order.sort_by(|a, b| b.count.cmp(&a.count));
    order
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversityMetrics {
    pub total: usize,
    pub unique_first_words: usize,
    pub unique_first_3_words: usize,
    pub unique_first_sentences: usize,
    pub first_word_diversity: f64,
    pub first_3_diversity: f64,
    pub first_sentence_diversity: f64,
    pub top_first_words: Vec<Ranked>,
    pub top_first_3: Vec<Ranked>,
    pub top_first_sentences: Vec<Ranked>,
}

/// One response matching a formulaic opener
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternHit {
    /// 0-based response position
    pub index: usize,
    pub matched: String,
    pub opening: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormulaicPatterns {
    pub starts_with_exclamation: Vec<PatternHit>,
    pub starts_with_apology: Vec<PatternHit>,
    pub thats_adjective: Vec<PatternHit>,
    pub emoji_in_opening: Vec<PatternHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Penalty {
    pub name: &'static str,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    ExcellentVariety,
    GoodVariety,
    SomeRepetition,
    QuiteFormulaic,
    ExtremelyRepetitive,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Grade::ExcellentVariety
        } else if score >= 6.0 {
            Grade::GoodVariety
        } else if score >= 4.0 {
            Grade::SomeRepetition
        } else if score >= 2.0 {
            Grade::QuiteFormulaic
        } else {
            Grade::ExtremelyRepetitive
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::ExcellentVariety => "Excellent variety",
            Grade::GoodVariety => "Good variety",
            Grade::SomeRepetition => "Some repetition",
            Grade::QuiteFormulaic => "Quite formulaic",
            Grade::ExtremelyRepetitive => "Extremely repetitive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversityReport {
    pub subject: String,
    pub metrics: DiversityMetrics,
    pub patterns: FormulaicPatterns,
    /// Trigrams across all responses occurring more than five times
    pub trigrams: Vec<Ranked>,
    pub base_score: f64,
    pub penalties: Vec<Penalty>,
    pub score: f64,
    pub grade: Grade,
    pub recommendations: Vec<String>,
}

struct Matchers {
    sentence: Regex,
    exclamation: Regex,
    apology: Regex,
    thats_adjective: Regex,
}

impl Matchers {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| TonebenchError::Other(format!("invalid pattern {}: {}", pattern, e)))
        };
        Ok(Self {
            sentence: compile(r"^[^.!?]+[.!?]")?,
            exclamation: compile(r"^(Ugh|Oh no|Oof|Yikes),?\s+")?,
            apology: compile(r"(?i)^I'm so sorry")?,
            thats_adjective: compile(r"^That's (?:so|such|really) \w+")?,
        })
    }
}

fn opening(text: &str) -> String {
    truncate_chars(text, OPENING_CHARS).to_string()
}

fn diversity_metrics(responses: &[String], matchers: &Matchers) -> DiversityMetrics {
    let total = responses.len();
    let ratio = |unique: usize| unique as f64 / total as f64;

    let first_words_ranked = rank(responses.iter().map(|r| first_words(r, 1)));
    let first_3_ranked = rank(responses.iter().map(|r| first_words(r, 3)));
    let sentences_ranked = rank(
        responses
            .iter()
            .map(|r| first_sentence(r, &matchers.sentence)),
    );

    DiversityMetrics {
        total,
        unique_first_words: first_words_ranked.len(),
        unique_first_3_words: first_3_ranked.len(),
        unique_first_sentences: sentences_ranked.len(),
        first_word_diversity: ratio(first_words_ranked.len()),
        first_3_diversity: ratio(first_3_ranked.len()),
        first_sentence_diversity: ratio(sentences_ranked.len()),
        top_first_words: first_words_ranked.into_iter().take(5).collect(),
        top_first_3: first_3_ranked.into_iter().take(10).collect(),
        top_first_sentences: sentences_ranked.into_iter().take(10).collect(),
    }
}

fn formulaic_patterns(responses: &[String], matchers: &Matchers) -> FormulaicPatterns {
    let mut patterns = FormulaicPatterns::default();

    for (index, response) in responses.iter().enumerate() {
        let hit = |matched: &str| PatternHit {
            index,
            matched: matched.to_string(),
            opening: opening(response),
        };

        if let Some(caps) = matchers.exclamation.captures(response) {
            let word = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            patterns.starts_with_exclamation.push(hit(word));
        }
        if let Some(m) = matchers.apology.find(response) {
            patterns.starts_with_apology.push(hit(m.as_str()));
        }
        if let Some(m) = matchers.thats_adjective.find(response) {
            patterns.thats_adjective.push(hit(m.as_str()));
        }
        if let Some(emoji) = truncate_chars(response, OPENING_CHARS)
            .chars()
            .find(|c| OPENING_EMOJI.contains(c))
        {
            patterns.emoji_in_opening.push(hit(&emoji.to_string()));
        }
    }

    patterns
}

/// Most common lower-cased word trigrams across all responses
fn repeated_trigrams(responses: &[String]) -> Vec<Ranked> {
    let trigrams = responses.iter().flat_map(|response| {
        let words: Vec<String> = response
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        words
            .windows(3)
            .map(|w| w.join(" "))
            .collect::<Vec<_>>()
    });

    rank(trigrams)
        .into_iter()
        .filter(|r| r.count > TRIGRAM_MIN_COUNT)
        .take(10)
        .collect()
}

fn penalties(metrics: &DiversityMetrics, patterns: &FormulaicPatterns) -> Vec<Penalty> {
    let total = metrics.total as f64;
    let mut penalties = Vec::new();

    let exclamation_share = patterns.starts_with_exclamation.len() as f64 / total;
    if exclamation_share > EXCLAMATION_THRESHOLD {
        penalties.push(Penalty {
            name: "exclamation_overuse",
            amount: (exclamation_share - EXCLAMATION_THRESHOLD) * EXCLAMATION_WEIGHT,
        });
    }

    let top_opening_share = metrics
        .top_first_3
        .first()
        .map(|r| r.count as f64 / total)
        .unwrap_or(0.0);
    if top_opening_share > REPEATED_OPENING_THRESHOLD {
        penalties.push(Penalty {
            name: "repeated_opening",
            amount: (top_opening_share - REPEATED_OPENING_THRESHOLD) * REPEATED_OPENING_WEIGHT,
        });
    }

    penalties
}

fn recommendations(
    metrics: &DiversityMetrics,
    patterns: &FormulaicPatterns,
    score: f64,
) -> Vec<String> {
    let mut out = Vec::new();
    if score >= RECOMMENDATION_BELOW {
        return out;
    }

    let total = metrics.total as f64;
    if patterns.starts_with_exclamation.len() as f64 / total > EXCLAMATION_THRESHOLD {
        out.push(
            "Reduce exclamation openings: too many responses start with 'Ugh', 'Oh no' and the like. \
             Vary with direct statements or questions."
                .to_string(),
        );
    }
    if let Some(top) = metrics.top_first_3.first() {
        if top.count as f64 / total > REPEATED_OPENING_THRESHOLD {
            out.push(format!(
                "'{}' is overused ({}x): find alternative ways to open responses.",
                top.text, top.count
            ));
        }
    }
    if metrics.first_sentence_diversity < 0.5 {
        out.push(
            "First sentences are too similar: vary sentence structure and opening phrases."
                .to_string(),
        );
    }

    out
}

/// Analyze one subject's responses.
///
/// Fails when there is nothing to analyze.
pub fn analyze(subject: &str, responses: &[String]) -> Result<DiversityReport> {
    if responses.is_empty() {
        return Err(TonebenchError::NoResponses {
            subject: subject.to_string(),
        });
    }

    let matchers = Matchers::new()?;
    let metrics = diversity_metrics(responses, &matchers);
    let patterns = formulaic_patterns(responses, &matchers);
    let trigrams = repeated_trigrams(responses);

    let base_score =
        (metrics.first_word_diversity + metrics.first_3_diversity + metrics.first_sentence_diversity)
            * 10.0
            / 3.0;
    let penalties = penalties(&metrics, &patterns);
    let total_penalty: f64 = penalties.iter().map(|p| p.amount).sum();
    let score = (base_score - total_penalty).clamp(0.0, 10.0);

    Ok(DiversityReport {
        subject: subject.to_string(),
        recommendations: recommendations(&metrics, &patterns, score),
        grade: Grade::from_score(score),
        metrics,
        patterns,
        trigrams,
        base_score,
        penalties,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_openings() {
        let sentence = Matchers::new().unwrap().sentence;
        assert_eq!(first_words("  Hey there,   friend! How", 3), "Hey there, friend!");
        assert_eq!(first_sentence("Oof. That's a lot.", &sentence), "Oof.");
        assert_eq!(
            first_sentence(&"no terminator ".repeat(10), &sentence),
            "no terminator no terminator no terminator no termi"
        );
    }

    #[test]
    fn test_rank_orders_by_count_then_first_seen() {
        let ranked = rank(strings(&["b", "a", "a", "c", "b", "d"]));
        let texts: Vec<&str> = ranked.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "c", "d"]);
        assert_eq!(ranked[0].count, 2);
    }

    #[test]
    fn test_repeated_opening_penalty() {
        let mut responses = vec!["That sounds hard, honestly.".to_string(); 6];
        for (i, word) in ["Alpha", "Bravo", "Charlie", "Delta"].iter().enumerate() {
            responses.push(format!("{} response number {}.", word, i));
        }
        // Make the six shared openings differ after the third word.
        for (i, r) in responses.iter_mut().take(6).enumerate() {
            r.push_str(&format!(" Variant {}.", i));
        }

        let report = analyze("GPTBot", &responses).unwrap();
        assert_eq!(report.metrics.first_3_diversity, 0.5);
        assert_eq!(report.metrics.top_first_3[0].count, 6);

        let penalty = report
            .penalties
            .iter()
            .find(|p| p.name == "repeated_opening")
            .unwrap();
        assert!((penalty.amount - 4.5).abs() < 1e-9);
        assert!((report.score - (report.base_score - 4.5)).abs() < 1e-9);
    }

    #[test]
    fn test_exclamation_overuse() {
        let responses = strings(&[
            "Ugh, that's the worst.",
            "Oh no, I'm sorry.",
            "Oof that hurts.",
            "Yikes, okay.",
            "Tell me more.",
        ]);
        let report = analyze("A", &responses).unwrap();
        assert_eq!(report.patterns.starts_with_exclamation.len(), 4);
        assert_eq!(report.patterns.starts_with_exclamation[1].matched, "Oh no");

        let penalty = report
            .penalties
            .iter()
            .find(|p| p.name == "exclamation_overuse")
            .unwrap();
        assert!((penalty.amount - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_other_patterns() {
        let responses = strings(&[
            "i'm so sorry you're dealing with this.",
            "That's so frustrating, right?",
            "Hey 💙 you matter.",
        ]);
        let patterns = analyze("A", &responses).unwrap().patterns;
        assert_eq!(patterns.starts_with_apology.len(), 1);
        assert_eq!(patterns.thats_adjective[0].matched, "That's so frustrating");
        assert_eq!(patterns.emoji_in_opening[0].matched, "💙");
        assert_eq!(patterns.emoji_in_opening[0].index, 2);
    }

    #[test]
    fn test_varied_responses_score_well() {
        let responses = strings(&[
            "Exams can feel huge.",
            "Breakups are rough.",
            "Your friend sounds stressed.",
            "Moving schools is a big change.",
        ]);
        let report = analyze("A", &responses).unwrap();
        assert_eq!(report.score, 10.0);
        assert_eq!(report.grade, Grade::ExcellentVariety);
        assert!(report.penalties.is_empty());
        assert!(report.recommendations.is_empty());
        assert!(report.trigrams.is_empty());
    }

    #[test]
    fn test_identical_responses_are_repetitive() {
        let responses = vec!["Ugh, that sucks so much. Want to talk?".to_string(); 8];
        let report = analyze("A", &responses).unwrap();
        assert_eq!(report.score, 0.0);
        assert_eq!(report.grade, Grade::ExtremelyRepetitive);
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.trigrams[0].count, 8);
    }

    #[test]
    fn test_no_responses_is_an_error() {
        assert!(matches!(
            analyze("A", &[]),
            Err(TonebenchError::NoResponses { .. })
        ));
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(8.0).label(), "Excellent variety");
        assert_eq!(Grade::from_score(6.0).label(), "Good variety");
        assert_eq!(Grade::from_score(4.0).label(), "Some repetition");
        assert_eq!(Grade::from_score(2.0).label(), "Quite formulaic");
        assert_eq!(Grade::from_score(1.99).label(), "Extremely repetitive");
    }
}
