//! Keyword match scoring: how well a resume document covers a job description.
//!
//! Deterministic and local. Keywords are pulled from the JD text, then each
//! is looked up in the document:
//!
//! - skill item exact match (case-insensitive) → strength 1.0
//! - substring of any other document text → strength 0.6
//! - no match → strength 0.0
//!
//! `overall_score = Σ(strength × weight) / Σ(weight) × 100`, classified as
//! strong (≥0.8), partial (0.4–0.79) or gap (<0.4).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::export::text::render_plain;
use crate::models::resume::ResumeDocument;

/// Keywords kept per JD, highest weight first.
pub const MAX_KEYWORDS: usize = 25;

const STOP_WORDS: &[&str] = &[
    "a", "about", "across", "all", "an", "and", "any", "are", "as", "at", "be", "build", "by",
    "can", "candidate", "do", "etc", "experience", "for", "from", "have", "help", "in", "into",
    "is", "it", "its", "join", "looking", "more", "must", "new", "of", "on", "or", "our", "plus",
    "role", "strong", "team", "that", "the", "their", "this", "to", "using", "we", "will",
    "with", "work", "working", "years", "you", "your",
];

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub frequency: u32,
    /// 1.0 when the keyword shows up in the opening quarter of the JD.
    pub position_weight: f32,
    pub weighted_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub strength: f32,
    /// Section the match came from.
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub keyword: String,
    pub jd_frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub overall_score: u32,
    pub strong_matches: Vec<KeywordMatch>,
    pub partial_matches: Vec<KeywordMatch>,
    pub gaps: Vec<Gap>,
    pub recommendation: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Keyword extraction
// ────────────────────────────────────────────────────────────────────────────

fn normalize(raw: &str) -> Option<String> {
    let token = raw
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .to_lowercase();
    if token.chars().count() < 2 || token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if STOP_WORDS.contains(&token.as_str()) {
        return None;
    }
    Some(token)
}

pub fn extract_keywords(jd_text: &str) -> Vec<KeywordEntry> {
    let tokens: Vec<String> = jd_text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == '/' || c == '(' || c == ')')
        .filter_map(normalize)
        .collect();
    let head = tokens.len().div_ceil(4);

    let mut seen: HashMap<&str, (u32, usize)> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        let slot = seen.entry(token.as_str()).or_insert((0, position));
        slot.0 += 1;
    }

    let mut keywords: Vec<KeywordEntry> = seen
        .into_iter()
        .map(|(keyword, (frequency, first))| {
            let position_weight = if first < head { 1.0 } else { 0.7 };
            KeywordEntry {
                keyword: keyword.to_string(),
                frequency,
                position_weight,
                weighted_score: frequency as f32 * position_weight,
            }
        })
        .collect();

    keywords.sort_by(|a, b| {
        b.weighted_score
            .total_cmp(&a.weighted_score)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

pub fn score_document(doc: &ResumeDocument, jd_text: &str) -> MatchReport {
    let keywords = extract_keywords(jd_text);
    if keywords.is_empty() {
        return MatchReport {
            overall_score: 0,
            strong_matches: vec![],
            partial_matches: vec![],
            gaps: vec![],
            recommendation: "No keywords found in the job description; cannot score.".to_string(),
        };
    }

    let skills: Vec<String> = doc
        .skills
        .iter()
        .flat_map(|g| g.items.iter())
        .map(|s| s.trim().to_lowercase())
        .collect();
    let text = render_plain(doc).to_lowercase();

    let mut strong_matches = Vec::new();
    let mut partial_matches = Vec::new();
    let mut gaps = Vec::new();
    let mut total_weighted = 0.0_f32;
    let mut total_score = 0.0_f32;

    for entry in &keywords {
        total_weighted += entry.weighted_score;

        let (strength, evidence) = if skills.iter().any(|s| *s == entry.keyword) {
            (1.0, "skills")
        } else if text.contains(&entry.keyword) {
            (0.6, "resume text")
        } else {
            (0.0, "")
        };
        total_score += strength * entry.weighted_score;

        let found = KeywordMatch {
            keyword: entry.keyword.clone(),
            strength,
            evidence: evidence.to_string(),
        };
        if strength >= 0.8 {
            strong_matches.push(found);
        } else if strength >= 0.4 {
            partial_matches.push(found);
        } else {
            gaps.push(Gap {
                keyword: entry.keyword.clone(),
                jd_frequency: entry.frequency,
            });
        }
    }

    let overall_score = if total_weighted > 0.0 {
        ((total_score / total_weighted) * 100.0).round() as u32
    } else {
        0
    };

    MatchReport {
        overall_score,
        recommendation: build_recommendation(overall_score, &gaps),
        strong_matches,
        partial_matches,
        gaps,
    }
}

fn build_recommendation(score: u32, gaps: &[Gap]) -> String {
    let top_gaps: Vec<&str> = gaps.iter().take(3).map(|g| g.keyword.as_str()).collect();

    if score >= 80 {
        "Strong match. The resume covers the key requirements.".to_string()
    } else if score >= 60 {
        format!(
            "Moderate match ({score}/100). Consider adding: {}.",
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Low match ({score}/100). Missing: {}.",
            top_gaps.join(", ")
        )
    }
}
