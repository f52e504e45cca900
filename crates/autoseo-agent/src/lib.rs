//! # autoseo-agent
//!
//! Real-world collaborators for the AutoSEO engine.
//!
//! Each type implements one of the engine's collaborator traits:
//! - [`SitemapSource`] discovers candidate pages from an XML sitemap
//! - [`HtmlPageAnalyzer`] fetches a page and scores its on-page SEO health
//! - [`AnthropicGenerator`] drafts articles with Claude and scores them locally
//! - [`WordPressPublisher`] creates posts through the WordPress REST API
//! - [`EnvConfigSource`] reads credentials from the environment on every call

mod analyzer;
mod credentials;
mod generator;
pub mod quality;
mod sitemap;
mod types;
mod wordpress;

pub use analyzer::{analyze_html, HtmlPageAnalyzer};
pub use credentials::{
    EnvConfigSource, API_KEY_VAR, CMS_PASSWORD_VAR, CMS_URL_VAR, CMS_USERNAME_VAR, MODEL_VAR,
};
pub use generator::{build_prompt, parse_draft, AnthropicGenerator};
pub use quality::{score_draft, QualityReport};
pub use sitemap::{extract_locs, is_sitemap_index, SitemapSource};
pub use types::*;
pub use wordpress::WordPressPublisher;
