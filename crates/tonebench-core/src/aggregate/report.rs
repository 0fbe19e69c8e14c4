use std::fmt::Write;

use super::AggregateSummary;
use crate::format::score_bar;

const TITLE: &str = "CHATBOT TONE EVALUATION SUMMARY";

/// Render the narrative summary report.
pub fn render_report(summary: &AggregateSummary) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{}", TITLE);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);

    let _ = writeln!(out, "OVERALL SCORES COMPARISON");
    let _ = writeln!(out, "{}", "-".repeat(80));
    let _ = writeln!(out);
    for subject in summary.ranking() {
        let _ = writeln!(
            out,
            "{:<20} {:5.2}/10  {}",
            subject.subject,
            subject.average_overall,
            score_bar(subject.average_overall)
        );
    }
    let _ = writeln!(out);

    for subject in &summary.subjects {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "SUBJECT: {} ({} responses)", subject.subject, subject.count);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(out, "Overall Average Score: {:.2}/10", subject.average_overall);
        let _ = writeln!(out);
        let _ = writeln!(out, "Dimension Averages:");
        for (dimension, average) in subject.dimensions_descending() {
            let _ = writeln!(
                out,
                "  {:<35} {:.2}/10  {}",
                dimension.label(),
                average,
                score_bar(average)
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Average Bullet Points per Response: {:.1}",
            subject.average_bullets
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Strongest Dimension: {} ({:.2}/10)",
            subject.best.0.label(),
            subject.best.1
        );
        let _ = writeln!(
            out,
            "Weakest Dimension: {} ({:.2}/10)",
            subject.worst.0.label(),
            subject.worst.1
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "KEY INSIGHTS");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);

    match &summary.differentiator {
        Some(diff) => {
            let _ = writeln!(out, "Biggest Differentiator: {}", diff.dimension.label());
            let _ = writeln!(out, "  (Score range: {:.2} points)", diff.spread);
            let _ = writeln!(out);
            for (subject, score) in &diff.scores {
                let _ = writeln!(out, "  {:<20} {:.2}/10", subject, score);
            }
        }
        None => {
            let _ = writeln!(out, "Only one subject evaluated; no cross-subject comparison.");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::aggregate::tests::result;
    use crate::record::Dimension;

    #[test]
    fn test_report_orders_and_labels() {
        let results = vec![
            result("Beta", 1, 5.0, &[(Dimension::EmojiUsage, 2.0)]),
            result("Alpha", 1, 7.0, &[(Dimension::EmojiUsage, 9.0)]),
        ];
        let report = render_report(&summarize(&results));

        let alpha = report.find("Alpha                 7.00/10  ███████░░░").unwrap();
        let beta = report.find("Beta                  5.00/10  █████░░░░░").unwrap();
        assert!(alpha < beta);
        assert!(report.contains("SUBJECT: Alpha (1 responses)"));
        assert!(report.contains("Strongest Dimension: Emoji Usage (9.00/10)"));
        assert!(report.contains("Biggest Differentiator: Emoji Usage"));
        assert!(report.contains("(Score range: 7.00 points)"));
    }

    #[test]
    fn test_single_subject_has_no_differentiator() {
        let report = render_report(&summarize(&[result("Solo", 1, 6.0, &[])]));
        assert!(report.contains("no cross-subject comparison"));
    }
}
