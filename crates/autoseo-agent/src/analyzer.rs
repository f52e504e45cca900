//! On-page SEO health analysis
//!
//! Fetches a page and scores it from 100 downward, one deduction per issue.

use async_trait::async_trait;
use autoseo_core::{AutoSeoError, PageAnalysis, Result};
use autoseo_engine::PageAnalyzer;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

use crate::quality::count_words;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("autoseo/", env!("CARGO_PKG_VERSION"));

struct Patterns {
    title: Regex,
    meta_description: Regex,
    h1: Regex,
    h2: Regex,
    img: Regex,
    alt: Regex,
    body: Regex,
    noise: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        title: Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid"),
        meta_description: Regex::new(
            r#"(?is)<meta\s[^>]*name\s*=\s*["']description["'][^>]*>"#,
        )
        .expect("meta pattern is valid"),
        h1: Regex::new(r"(?i)<h1[\s>]").expect("h1 pattern is valid"),
        h2: Regex::new(r"(?i)<h2[\s>]").expect("h2 pattern is valid"),
        img: Regex::new(r"(?is)<img\s[^>]*>").expect("img pattern is valid"),
        alt: Regex::new(r#"(?i)\salt\s*=\s*["'][^"']+["']"#).expect("alt pattern is valid"),
        body: Regex::new(r"(?is)<body[^>]*>(.*)</body>").expect("body pattern is valid"),
        noise: Regex::new(
            r"(?is)<(script|style|nav|header|footer)[^>]*>.*?</(script|style|nav|header|footer)>",
        )
        .expect("noise pattern is valid"),
    })
}

fn content_attr(tag: &str) -> Option<String> {
    static CONTENT: OnceLock<Regex> = OnceLock::new();
    let pattern = CONTENT.get_or_init(|| {
        Regex::new(r#"(?is)\scontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("content pattern is valid")
    });
    pattern
        .captures(tag)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
}

/// Running score plus the issues that lowered it
struct Findings {
    score: u8,
    issues: Vec<String>,
    recommendations: Vec<String>,
}

impl Findings {
    fn flag(&mut self, points: u8, issue: impl Into<String>, recommendation: &str) {
        self.score = self.score.saturating_sub(points);
        self.issues.push(issue.into());
        self.recommendations.push(recommendation.to_string());
    }
}

/// Score a fetched page
pub fn analyze_html(url: &str, html: &str) -> PageAnalysis {
    let p = patterns();
    let mut found = Findings {
        score: 100,
        issues: Vec::new(),
        recommendations: Vec::new(),
    };

    let title = p
        .title
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let title_len = title.chars().count();
    if title.is_empty() {
        found.flag(
            20,
            "Missing <title>",
            "Add a descriptive title containing the target keyword",
        );
    } else if !(30..=60).contains(&title_len) {
        found.flag(
            10,
            format!("Title is {} characters", title_len),
            "Keep the title between 30 and 60 characters",
        );
    }

    let meta = p
        .meta_description
        .find(html)
        .and_then(|m| content_attr(m.as_str()))
        .unwrap_or_default();
    let meta_len = meta.chars().count();
    if meta.is_empty() {
        found.flag(
            15,
            "Missing meta description",
            "Write a meta description of 120 to 160 characters",
        );
    } else if !(120..=160).contains(&meta_len) {
        found.flag(
            5,
            format!("Meta description is {} characters", meta_len),
            "Keep the meta description between 120 and 160 characters",
        );
    }

    let h1_count = p.h1.find_iter(html).count();
    if h1_count == 0 {
        found.flag(
            15,
            "Missing <h1>",
            "Add a single h1 heading that states the page topic",
        );
    } else if h1_count > 1 {
        found.flag(
            5,
            format!("{} <h1> headings", h1_count),
            "Use exactly one h1 heading",
        );
    }

    let body = p
        .body
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(html);
    let words = count_words(&p.noise.replace_all(body, " "));
    if words < 300 {
        found.flag(
            25,
            format!("Thin content ({} words)", words),
            "Expand the page to at least 600 words of useful content",
        );
    } else if words < 600 {
        found.flag(
            10,
            format!("Short content ({} words)", words),
            "Expand the page to at least 600 words of useful content",
        );
    }

    if p.h2.find(html).is_none() {
        found.flag(
            10,
            "No <h2> subheadings",
            "Break the content into sections with h2 subheadings",
        );
    }

    let missing_alt = p
        .img
        .find_iter(html)
        .filter(|img| !p.alt.is_match(img.as_str()))
        .count();
    if missing_alt > 0 {
        found.flag(
            5,
            format!("{} images without alt text", missing_alt),
            "Describe every image with alt text",
        );
    }

    PageAnalysis {
        url: url.to_string(),
        health_score: found.score,
        issues: found.issues,
        recommendations: found.recommendations,
    }
}

/// Fetches pages over HTTP and scores them with [`analyze_html`]
#[derive(Debug, Clone)]
pub struct HtmlPageAnalyzer {
    http: reqwest::Client,
}

impl HtmlPageAnalyzer {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HtmlPageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageAnalyzer for HtmlPageAnalyzer {
    async fn analyze(&self, url: &str) -> Result<PageAnalysis> {
        let response = self
            .http
            .get(url)
            .header("user-agent", USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| AutoSeoError::Analyzer(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AutoSeoError::Analyzer(format!("{} returned {}", url, status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AutoSeoError::Analyzer(format!("Failed to read {}: {}", url, e)))?;

        let analysis = analyze_html(url, &html);
        tracing::debug!(
            url = %url,
            health = analysis.health_score,
            issues = analysis.issues.len(),
            "Page analyzed"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, meta: &str, body: &str) -> String {
        format!(
            r#"<html><head><title>{title}</title>
<meta name="description" content="{meta}"></head>
<body>{body}</body></html>"#
        )
    }

    fn healthy_body() -> String {
        format!(
            "<h1>Trail running</h1><p>{}</p><h2>Gear</h2><p>{}</p><img src=\"a.png\" alt=\"Shoes\">",
            "Trail running rewards patience and steady pacing. ".repeat(80),
            "Pick shoes with grip. ".repeat(40)
        )
    }

    #[test]
    fn test_healthy_page_scores_full() {
        let html = page(
            "Trail Running for Beginners: A Practical Guide",
            &"Everything a new trail runner needs to know. ".repeat(3),
            &healthy_body(),
        );
        let analysis = analyze_html("https://example.com/trail", &html);
        assert_eq!(analysis.health_score, 100, "issues: {:?}", analysis.issues);
        assert!(analysis.issues.is_empty());
    }

    #[test]
    fn test_bare_page_collects_issues() {
        let html = "<html><body><p>Hello</p><img src=\"x.png\"></body></html>";
        let analysis = analyze_html("https://example.com/bare", html);
        // title 20 + meta 15 + h1 15 + thin 25 + h2 10 + alt 5
        assert_eq!(analysis.health_score, 10);
        assert_eq!(analysis.issues.len(), 6);
        assert_eq!(analysis.recommendations.len(), 6);
    }

    #[test]
    fn test_multiple_h1_and_short_title() {
        let body = format!("<h1>A</h1><h1>B</h1>{}", healthy_body());
        let html = page(
            "Short",
            &"Everything a new trail runner needs to know. ".repeat(3),
            &body,
        );
        let analysis = analyze_html("https://example.com/x", &html);
        assert_eq!(analysis.health_score, 85);
        assert!(analysis.issues.iter().any(|i| i.contains("<h1>")));
    }

    #[test]
    fn test_scripts_do_not_count_as_content() {
        let body = format!("<script>{}</script><p>tiny</p>", "var x = 1; ".repeat(500));
        let analysis = analyze_html("https://example.com/js", &page("", "", &body));
        assert!(analysis.issues.iter().any(|i| i.starts_with("Thin content")));
    }
}
