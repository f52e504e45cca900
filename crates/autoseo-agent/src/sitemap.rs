//! Sitemap-backed URL discovery
//!
//! Follows one level of sitemap index, which covers the WordPress and Yoast layouts.

use async_trait::async_trait;
use autoseo_core::{AutoSeoError, Result};
use autoseo_engine::UrlSource;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

fn loc_pattern() -> &'static Regex {
    static LOC: OnceLock<Regex> = OnceLock::new();
    LOC.get_or_init(|| {
        Regex::new(r"(?is)<loc>\s*(?:<!\[CDATA\[)?\s*(.*?)\s*(?:\]\]>)?\s*</loc>")
            .expect("loc pattern is valid")
    })
}

/// `<loc>` values in document order
pub fn extract_locs(xml: &str) -> Vec<String> {
    loc_pattern()
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
        .filter(|loc| !loc.is_empty())
        .collect()
}

pub fn is_sitemap_index(xml: &str) -> bool {
    xml.contains("<sitemapindex")
}

fn decode_entities(s: &str) -> String {
    match quick_xml::escape::unescape(s) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::debug!("Keeping raw <loc> value {:?}: {}", s, e);
            s.to_string()
        }
    }
}

/// Discovers candidate pages from an XML sitemap
#[derive(Debug, Clone)]
pub struct SitemapSource {
    http: reqwest::Client,
    sitemap_url: String,
}

impl SitemapSource {
    pub fn new(sitemap_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            sitemap_url: sitemap_url.into(),
        }
    }

    pub fn sitemap_url(&self) -> &str {
        &self.sitemap_url
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| AutoSeoError::Scan(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AutoSeoError::Scan(format!(
                "Sitemap {} returned {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AutoSeoError::Scan(format!("Failed to read {}: {}", url, e)))
    }
}

#[async_trait]
impl UrlSource for SitemapSource {
    async fn discover(&self) -> Result<Vec<String>> {
        let root = self.fetch(&self.sitemap_url).await?;

        let pages = if is_sitemap_index(&root) {
            let children = extract_locs(&root);
            tracing::debug!("Sitemap index lists {} child sitemaps", children.len());

            let mut pages = Vec::new();
            for child in children {
                match self.fetch(&child).await {
                    Ok(xml) => pages.extend(extract_locs(&xml)),
                    Err(e) => tracing::warn!("Skipping child sitemap {}: {}", child, e),
                }
            }
            pages
        } else {
            extract_locs(&root)
        };

        let mut seen = HashSet::new();
        let pages: Vec<String> = pages
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        tracing::info!("Discovered {} pages from {}", pages.len(), self.sitemap_url);
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_locs_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc>
    https://example.com/blog/post?a=1&amp;b=2
  </loc></url>
  <url><loc><![CDATA[https://example.com/about]]></loc></url>
</urlset>"#;
        assert_eq!(
            extract_locs(xml),
            vec![
                "https://example.com/",
                "https://example.com/blog/post?a=1&b=2",
                "https://example.com/about",
            ]
        );
        assert!(!is_sitemap_index(xml));
    }

    #[test]
    fn test_detects_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/post-sitemap.xml</loc></sitemap>
  <sitemap><loc>https://example.com/page-sitemap.xml</loc></sitemap>
</sitemapindex>"#;
        assert!(is_sitemap_index(xml));
        assert_eq!(extract_locs(xml).len(), 2);
    }

    #[test]
    fn test_numeric_character_references() {
        let xml = "<urlset>\
<url><loc>https://example.com/?a=1&#38;b=2</loc></url>\
<url><loc>https://example.com/?c=3&#x26;d=4</loc></url>\
<url><loc>https://example.com/q&amp;a</loc></url>\
</urlset>";
        assert_eq!(
            extract_locs(xml),
            vec![
                "https://example.com/?a=1&b=2",
                "https://example.com/?c=3&d=4",
                "https://example.com/q&a",
            ]
        );
    }

    #[test]
    fn test_unknown_entity_keeps_raw_value() {
        let xml = "<urlset><url><loc>https://example.com/&nbsp;x</loc></url></urlset>";
        assert_eq!(extract_locs(xml), vec!["https://example.com/&nbsp;x"]);
    }

    #[test]
    fn test_empty_document() {
        assert!(extract_locs("").is_empty());
        assert!(extract_locs("<urlset><url><loc> </loc></url></urlset>").is_empty());
    }
}
