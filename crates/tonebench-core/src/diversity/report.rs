use std::fmt::Write;

use super::{DiversityReport, PatternHit, Ranked};
use crate::format::score_bar;

fn percent(count: usize, total: usize) -> f64 {
    count as f64 / total as f64 * 100.0
}

fn share_bar(pct: f64) -> String {
    "█".repeat((pct / 2.0) as usize)
}

/// Counts per matched text, most common first
fn tally(hits: &[PatternHit]) -> Vec<Ranked> {
    super::rank(hits.iter().map(|h| h.matched.clone()))
}

impl DiversityReport {
    /// Plain-text report for terminal output
    pub fn render(&self) -> String {
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);
        let m = &self.metrics;
        let total = m.total;
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "REPETITIVENESS ANALYSIS: {}", self.subject);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(out, "Total responses: {}", total);
        let _ = writeln!(out);

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "DIVERSITY METRICS");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Unique first words: {}/{} ({:.1}%)",
            m.unique_first_words,
            total,
            m.first_word_diversity * 100.0
        );
        let _ = writeln!(
            out,
            "Unique first 3 words: {}/{} ({:.1}%)",
            m.unique_first_3_words,
            total,
            m.first_3_diversity * 100.0
        );
        let _ = writeln!(
            out,
            "Unique first sentences: {}/{} ({:.1}%)",
            m.unique_first_sentences,
            total,
            m.first_sentence_diversity * 100.0
        );

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", thin);
        let _ = writeln!(out, "MOST COMMON FIRST WORDS");
        let _ = writeln!(out, "{}", thin);
        for r in &m.top_first_words {
            let pct = percent(r.count, total);
            let _ = writeln!(out, "{:<20} {:3}x ({:5.1}%)  {}", r.text, r.count, pct, share_bar(pct));
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", thin);
        let _ = writeln!(out, "MOST COMMON FIRST 3 WORDS");
        let _ = writeln!(out, "{}", thin);
        for r in &m.top_first_3 {
            let pct = percent(r.count, total);
            let _ = writeln!(out, "{:<30} {:3}x ({:5.1}%)  {}", r.text, r.count, pct, share_bar(pct));
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", thin);
        let _ = writeln!(out, "MOST REPEATED FIRST SENTENCES");
        let _ = writeln!(out, "{}", thin);
        for r in m.top_first_sentences.iter().take(5).filter(|r| r.count > 1) {
            let _ = writeln!(out, "[{}x / {:.1}%] {}", r.count, percent(r.count, total), r.text);
        }

        self.render_patterns(&mut out);
        self.render_trigrams(&mut out);
        self.render_score(&mut out);
        out
    }

    fn render_patterns(&self, out: &mut String) {
        let rule = "=".repeat(80);
        let total = self.metrics.total;
        let p = &self.patterns;

        let _ = writeln!(out);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "FORMULAIC PATTERNS");
        let _ = writeln!(out, "{}", rule);

        let sections: [(&str, &[PatternHit], bool); 4] = [
            ("Starts with exclamation", &p.starts_with_exclamation, true),
            ("Starts with 'I'm so sorry'", &p.starts_with_apology, false),
            ("Uses 'That's [adjective]' pattern", &p.thats_adjective, false),
            ("Emoji in opening", &p.emoji_in_opening, true),
        ];

        let mut any = false;
        for (label, hits, breakdown) in sections {
            if hits.is_empty() {
                continue;
            }
            any = true;
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}: {}/{} ({:.1}%)",
                label,
                hits.len(),
                total,
                percent(hits.len(), total)
            );
            if breakdown {
                for r in tally(hits) {
                    let _ = writeln!(out, "  - '{}': {}x", r.text, r.count);
                }
            }
        }

        if !any {
            let _ = writeln!(out);
            let _ = writeln!(out, "No formulaic openers detected.");
        }
    }

    fn render_trigrams(&self, out: &mut String) {
        let rule = "=".repeat(80);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "MOST COMMON 3-WORD PHRASES (ACROSS ALL RESPONSES)");
        let _ = writeln!(out, "{}", rule);

        if self.trigrams.is_empty() {
            let _ = writeln!(out, "No significantly repeated 3-word phrases found (good!)");
            return;
        }
        for r in &self.trigrams {
            let _ = writeln!(
                out,
                "{:<40} {:3}x ({:5.1}%)",
                r.text,
                r.count,
                percent(r.count, self.metrics.total)
            );
        }
    }

    fn render_score(&self, out: &mut String) {
        let rule = "=".repeat(80);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "REPETITIVENESS SCORE");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out);
        let _ = writeln!(out, "Score: {:.1}/10  {}", self.score, score_bar(self.score));
        let _ = writeln!(out, "Grade: {}", self.grade.label());
        for penalty in &self.penalties {
            let _ = writeln!(out, "Penalty {}: -{:.2}", penalty.name, penalty.amount);
        }

        if !self.recommendations.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", rule);
            let _ = writeln!(out, "RECOMMENDATIONS");
            let _ = writeln!(out, "{}", rule);
            for (i, text) in self.recommendations.iter().enumerate() {
                let _ = writeln!(out);
                let _ = writeln!(out, "{}. {}", i + 1, text);
            }
        }
    }
}
