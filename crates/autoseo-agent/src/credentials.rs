//! Collaborator credentials from the environment
//!
//! Read on every call so a rotated key or CMS password takes effect without
//! restarting the engine.

use autoseo_core::{CollaboratorSettings, Result};
use autoseo_engine::ConfigSource;
use std::env;

use crate::types::Model;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const MODEL_VAR: &str = "AUTOSEO_MODEL";
pub const CMS_URL_VAR: &str = "WORDPRESS_URL";
pub const CMS_USERNAME_VAR: &str = "WORDPRESS_USERNAME";
pub const CMS_PASSWORD_VAR: &str = "WORDPRESS_APP_PASSWORD";

/// Settings snapshot built from environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvConfigSource {
    /// CMS base URL used when `WORDPRESS_URL` is unset
    fallback_cms_url: Option<String>,
}

impl EnvConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the site URL from the config file when no CMS URL is exported
    pub fn with_fallback_cms_url(mut self, url: Option<String>) -> Self {
        self.fallback_cms_url = url;
        self
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl ConfigSource for EnvConfigSource {
    fn snapshot(&self) -> Result<CollaboratorSettings> {
        Ok(CollaboratorSettings {
            api_key: non_empty(API_KEY_VAR),
            model: Model::resolve(&non_empty(MODEL_VAR).unwrap_or_default()),
            cms_url: non_empty(CMS_URL_VAR).or_else(|| self.fallback_cms_url.clone()),
            cms_username: non_empty(CMS_USERNAME_VAR),
            cms_app_password: non_empty(CMS_PASSWORD_VAR),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent concurrent env var modifications
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env_vars<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap();

        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        let result = f();

        for (key, original) in originals {
            match original {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        result
    }

    #[test]
    fn test_snapshot_reads_environment() {
        with_env_vars(
            &[
                (API_KEY_VAR, Some("sk-test")),
                (MODEL_VAR, Some("haiku")),
                (CMS_URL_VAR, Some("https://blog.example.com")),
                (CMS_USERNAME_VAR, Some("editor")),
                (CMS_PASSWORD_VAR, Some("abcd efgh")),
            ],
            || {
                let settings = EnvConfigSource::new().snapshot().unwrap();
                assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
                assert_eq!(settings.model, Model::Haiku.api_name());
                assert_eq!(settings.cms_url.as_deref(), Some("https://blog.example.com"));
                assert_eq!(settings.cms_username.as_deref(), Some("editor"));
                assert_eq!(settings.cms_app_password.as_deref(), Some("abcd efgh"));
            },
        );
    }

    #[test]
    fn test_blank_values_are_missing() {
        with_env_vars(
            &[
                (API_KEY_VAR, Some("  ")),
                (MODEL_VAR, None),
                (CMS_URL_VAR, None),
            ],
            || {
                let settings = EnvConfigSource::new()
                    .with_fallback_cms_url(Some("https://example.com".into()))
                    .snapshot()
                    .unwrap();
                assert!(settings.api_key.is_none());
                assert_eq!(settings.model, Model::Sonnet.api_name());
                assert_eq!(settings.cms_url.as_deref(), Some("https://example.com"));
            },
        );
    }

    #[test]
    fn test_each_snapshot_is_fresh() {
        with_env_vars(&[(API_KEY_VAR, Some("first"))], || {
            let source = EnvConfigSource::new();
            assert_eq!(source.snapshot().unwrap().api_key.as_deref(), Some("first"));
            env::set_var(API_KEY_VAR, "second");
            assert_eq!(source.snapshot().unwrap().api_key.as_deref(), Some("second"));
        });
    }
}
