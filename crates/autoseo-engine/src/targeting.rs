//! URL exclusion and keyword derivation

use autoseo_core::SiteConfig;
use url::Url;

/// Whether a candidate URL is excluded by explicit URL or by category path segment
pub fn is_excluded(url: &str, site: &SiteConfig) -> bool {
    let normalized = url.trim_end_matches('/');
    if site
        .excluded_urls
        .iter()
        .any(|excluded| excluded.trim_end_matches('/') == normalized)
    {
        return true;
    }

    if site.excluded_categories.is_empty() {
        return false;
    }
    path_segments(url).iter().any(|segment| {
        site.excluded_categories
            .iter()
            .any(|category| category.eq_ignore_ascii_case(segment))
    })
}

/// Topic keyword for a URL: the last path segment, de-slugged
///
/// `https://example.com/blog/best-running_shoes.html` becomes `best running shoes`.
/// Falls back to the host name for root URLs.
pub fn derive_keyword(url: &str) -> String {
    let segments = path_segments(url);
    let Some(last) = segments.last() else {
        return Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| url.to_string());
    };

    let stem = match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            stem
        }
        _ => last.as_str(),
    };

    stem.split(['-', '_', '+'])
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn path_segments(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };
    parsed
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(percent_decode)
                .collect()
        })
        .unwrap_or_default()
}

fn percent_decode(segment: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        SiteConfig {
            excluded_urls: vec!["https://example.com/contact/".into()],
            excluded_categories: vec!["tag".into(), "Author".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_exclusion_ignores_trailing_slash() {
        assert!(is_excluded("https://example.com/contact", &site()));
        assert!(!is_excluded("https://example.com/contact-us", &site()));
    }

    #[test]
    fn test_category_exclusion_matches_whole_segment() {
        assert!(is_excluded("https://example.com/tag/rust", &site()));
        assert!(is_excluded("https://example.com/author/jo", &site()));
        assert!(!is_excluded("https://example.com/tagged/rust", &site()));
        assert!(!is_excluded("https://example.com/blog/rust", &site()));
    }

    #[test]
    fn test_keyword_from_slug() {
        assert_eq!(
            derive_keyword("https://example.com/blog/best-running_shoes.html"),
            "best running shoes"
        );
        assert_eq!(
            derive_keyword("https://example.com/guides/seo-basics/"),
            "seo basics"
        );
        assert_eq!(
            derive_keyword("https://example.com/caf%C3%A9-guide"),
            "café guide"
        );
    }

    #[test]
    fn test_encoded_category_segment_is_matched() {
        let site = SiteConfig {
            excluded_categories: vec!["été".into()],
            ..Default::default()
        };
        assert!(is_excluded("https://example.com/%C3%A9t%C3%A9/plage", &site));
        // Invalid UTF-8 decodes lossily instead of failing
        assert_eq!(derive_keyword("https://example.com/bad%FF-slug"), "bad\u{FFFD} slug");
    }

    #[test]
    fn test_keyword_falls_back_to_host() {
        assert_eq!(derive_keyword("https://www.example.com/"), "example.com");
    }
}
