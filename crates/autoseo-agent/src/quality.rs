//! Content quality scoring for generated drafts
//!
//! Scores are out of 100, built from length, keyword placement, meta
//! description fit and heading structure.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::types::Draft;

/// Points per signal
const LENGTH_POINTS: u32 = 30;
const TITLE_KEYWORD_POINTS: u32 = 15;
const SEO_TITLE_POINTS: u32 = 10;
const INTRO_KEYWORD_POINTS: u32 = 10;
const DENSITY_POINTS: u32 = 10;
const META_POINTS: u32 = 15;
const STRUCTURE_POINTS: u32 = 10;

/// Words at which the length signal is maxed out
const TARGET_WORDS: u32 = 1500;

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"))
}

fn h2_pattern() -> &'static Regex {
    static H2: OnceLock<Regex> = OnceLock::new();
    H2.get_or_init(|| Regex::new(r"(?i)<h2[\s>]").expect("h2 pattern is valid"))
}

/// Per-signal breakdown of a draft's score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub word_count: u32,
    pub length: u32,
    pub title_keyword: u32,
    pub seo_title: u32,
    pub intro_keyword: u32,
    pub keyword_density: u32,
    pub meta_description: u32,
    pub structure: u32,
}

impl QualityReport {
    pub fn overall(&self) -> u8 {
        let total = self.length
            + self.title_keyword
            + self.seo_title
            + self.intro_keyword
            + self.keyword_density
            + self.meta_description
            + self.structure;
        total.min(100) as u8
    }
}

/// Visible text of an HTML fragment
pub fn strip_tags(html: &str) -> String {
    tag_pattern().replace_all(html, " ").into_owned()
}

pub fn count_words(html: &str) -> u32 {
    strip_tags(html).split_whitespace().count() as u32
}

/// Score a draft against its target keyword
pub fn score_draft(keyword: &str, draft: &Draft) -> QualityReport {
    let keyword = keyword.trim().to_lowercase();
    let text = strip_tags(&draft.content).to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len() as u32;

    let mut report = QualityReport {
        word_count,
        length: LENGTH_POINTS * word_count.min(TARGET_WORDS) / TARGET_WORDS,
        ..Default::default()
    };

    if keyword.is_empty() {
        report.title_keyword = TITLE_KEYWORD_POINTS;
        report.intro_keyword = INTRO_KEYWORD_POINTS;
        report.keyword_density = DENSITY_POINTS;
    } else {
        if draft.title.to_lowercase().contains(&keyword) {
            report.title_keyword = TITLE_KEYWORD_POINTS;
        }

        let intro: String = words.iter().take(100).copied().collect::<Vec<_>>().join(" ");
        if intro.contains(&keyword) {
            report.intro_keyword = INTRO_KEYWORD_POINTS;
        }

        if word_count > 0 {
            let occurrences = text.matches(&keyword).count() as f64;
            let keyword_words = keyword.split_whitespace().count().max(1) as f64;
            let density = occurrences * keyword_words / word_count as f64 * 100.0;
            report.keyword_density = if (0.5..=2.5).contains(&density) {
                DENSITY_POINTS
            } else if density > 0.0 && density < 4.0 {
                DENSITY_POINTS / 2
            } else {
                0
            };
        }
    }

    let seo_len = draft.seo_title.chars().count();
    if (30..=60).contains(&seo_len) {
        report.seo_title = SEO_TITLE_POINTS;
    } else if seo_len > 0 {
        report.seo_title = SEO_TITLE_POINTS / 2;
    }

    let meta_len = draft.meta_description.chars().count();
    report.meta_description = if (120..=160).contains(&meta_len) {
        META_POINTS
    } else if (70..=170).contains(&meta_len) {
        META_POINTS / 2
    } else {
        0
    };

    let h2_count = h2_pattern().find_iter(&draft.content).count() as u32;
    report.structure = (h2_count.min(3) * STRUCTURE_POINTS) / 3;

    report
}
