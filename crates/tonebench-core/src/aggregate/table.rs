use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::format::truncate_chars;
use crate::record::{Dimension, ResultFile};

const MAX_QUERY_CHARS: usize = 100;
const MAX_ASPECT_CHARS: usize = 100;

#[derive(Serialize)]
struct Row<'a> {
    subject_name: &'a str,
    query_index: u32,
    user_query: String,
    overall_score: f64,
    warmth_validation: f64,
    prose_vs_bullets: f64,
    emoji_usage: f64,
    conversational_tone: f64,
    practical_advice: f64,
    followup_question: f64,
    support_solutions_balance: f64,
    length_conciseness: f64,
    bullet_count: u32,
    prose_percentage: &'a str,
    most_ideal_aspect: &'a str,
    least_ideal_aspect: &'a str,
}

fn short_query(query: &str) -> String {
    if query.chars().count() > MAX_QUERY_CHARS {
        format!("{}...", truncate_chars(query, MAX_QUERY_CHARS))
    } else {
        query.to_string()
    }
}

fn aspect(text: &str) -> &str {
    if text.is_empty() {
        "N/A"
    } else {
        truncate_chars(text, MAX_ASPECT_CHARS)
    }
}

/// Write one CSV row per result, sorted by subject then index.
pub fn write_csv<W: Write>(results: &[ResultFile], writer: W) -> Result<()> {
    let mut sorted: Vec<&ResultFile> = results.iter().collect();
    sorted.sort_by(|a, b| {
        a.subject_name
            .cmp(&b.subject_name)
            .then(a.query_index.cmp(&b.query_index))
    });

    let mut table = csv::Writer::from_writer(writer);
    for result in sorted {
        let e = &result.evaluation;
        table.serialize(Row {
            subject_name: &result.subject_name,
            query_index: result.query_index,
            user_query: short_query(&result.user_query),
            overall_score: e.overall_score,
            warmth_validation: e.dimension(Dimension::WarmthValidation),
            prose_vs_bullets: e.dimension(Dimension::ProseVsBullets),
            emoji_usage: e.dimension(Dimension::EmojiUsage),
            conversational_tone: e.dimension(Dimension::ConversationalTone),
            practical_advice: e.dimension(Dimension::PracticalAdvice),
            followup_question: e.dimension(Dimension::FollowupQuestion),
            support_solutions_balance: e.dimension(Dimension::SupportSolutionsBalance),
            length_conciseness: e.dimension(Dimension::LengthConciseness),
            bullet_count: e.bullet_point_analysis.bullet_count,
            prose_percentage: &e.bullet_point_analysis.prose_percentage,
            most_ideal_aspect: aspect(&e.most_ideal_aspect),
            least_ideal_aspect: aspect(&e.least_ideal_aspect),
        })?;
    }
    table.flush()?;
    Ok(())
}
