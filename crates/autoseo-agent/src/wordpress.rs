//! WordPress REST API publisher
//!
//! Authenticates with an application password over basic auth.

use async_trait::async_trait;
use autoseo_core::{AutoSeoError, CollaboratorSettings, PublishRequest, PublishResult, Result};
use autoseo_engine::Publisher;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const POSTS_PATH: &str = "wp-json/wp/v2/posts";
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(60);

/// Posts endpoint for a site base URL
pub fn endpoint(base: &str) -> Result<String> {
    let base = url::Url::parse(base.trim())
        .map_err(|e| AutoSeoError::Configuration(format!("Invalid CMS URL '{}': {}", base, e)))?;
    let mut root = base.as_str().trim_end_matches('/').to_string();
    root.push('/');
    Ok(format!("{}{}", root, POSTS_PATH))
}

/// JSON body for a new post
///
/// SEO fields go into Yoast's meta keys; sites without Yoast ignore them.
pub fn post_body(request: &PublishRequest) -> Value {
    json!({
        "title": request.title,
        "content": request.content,
        "status": request.status.to_string(),
        "excerpt": request.meta_description,
        "meta": {
            "_yoast_wpseo_title": request.seo_title,
            "_yoast_wpseo_metadesc": request.meta_description,
        },
    })
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: u64,
    #[serde(default)]
    link: String,
}

/// Publisher creating posts through `/wp-json/wp/v2/posts`
#[derive(Debug, Clone)]
pub struct WordPressPublisher {
    http: reqwest::Client,
}

impl WordPressPublisher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for WordPressPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for WordPressPublisher {
    async fn publish(
        &self,
        request: &PublishRequest,
        settings: &CollaboratorSettings,
    ) -> Result<PublishResult> {
        let base = settings.cms_url.as_deref().ok_or_else(|| {
            AutoSeoError::Configuration("No CMS URL configured. Set WORDPRESS_URL".to_string())
        })?;
        let (username, password) = match (&settings.cms_username, &settings.cms_app_password) {
            (Some(u), Some(p)) => (u, p),
            _ => {
                return Err(AutoSeoError::Auth(
                    "WORDPRESS_USERNAME and WORDPRESS_APP_PASSWORD are required to publish"
                        .to_string(),
                ))
            }
        };

        let url = endpoint(base)?;
        tracing::debug!("Publishing '{}' to {}", request.title, url);

        let response = self
            .http
            .post(&url)
            .basic_auth(username, Some(password))
            .timeout(PUBLISH_TIMEOUT)
            .json(&post_body(request))
            .send()
            .await
            .map_err(|e| AutoSeoError::Http(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AutoSeoError::Auth(format!(
                "WordPress rejected the credentials ({})",
                status
            )));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(AutoSeoError::Publisher(format!(
                "WordPress returned {}: {}",
                status, error_text
            )));
        }

        let post: CreatedPost = response
            .json()
            .await
            .map_err(|e| AutoSeoError::Publisher(format!("Unexpected WordPress response: {}", e)))?;

        tracing::info!("Created post {} for {}", post.id, request.source_url);
        Ok(PublishResult {
            remote_url: post.link,
            post_id: Some(post.id),
        })
    }
}
