use std::env;

use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai";
pub const DEFAULT_MODEL: &str = "llama-4-scout-17b-16e-instruct";
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

const API_KEY_VAR: &str = "CEREBRAS_API_KEY";
const BASE_URL_VAR: &str = "CEREBRAS_BASE_URL";
const MODEL_VAR: &str = "CEREBRAS_MODEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CEREBRAS_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),
}

/// Settings for talking to the completion API.
///
/// Loaded from the process environment (after `.env` has been read by
/// `main`), then optionally overridden from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let raw_url = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: raw_url.clone(),
            source,
        })?;

        let model = lookup(MODEL_VAR)
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Apply command line overrides on top of the environment settings.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        temperature: Option<f32>,
    ) -> Result<Self, ConfigError> {
        if let Some(model) = model.filter(|model| !model.trim().is_empty()) {
            self.model = model;
        }
        if let Some(temperature) = temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
            self.temperature = temperature;
        }
        Ok(self)
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "csk-test")])).unwrap();
        assert_eq!(config.api_key, "csk-test");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(
            config.completions_url(),
            "https://api.cerebras.ai/v1/chat/completions"
        );
    }

    #[test]
    fn missing_or_blank_key_is_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[])),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[(API_KEY_VAR, "  ")])),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "csk-test"),
            (BASE_URL_VAR, "not a url"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "csk-test"),
            (BASE_URL_VAR, "http://localhost:8080/"),
        ]))
        .unwrap();
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn overrides_replace_model_and_temperature() {
        let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "csk-test")]))
            .unwrap()
            .with_overrides(Some("llama3.1-8b".to_string()), Some(0.25))
            .unwrap();
        assert_eq!(config.model, "llama3.1-8b");
        assert_eq!(config.temperature, 0.25);
    }

    #[test]
    fn blank_model_override_keeps_configured_model() {
        let config = Config::from_lookup(lookup_from(&[
            (API_KEY_VAR, "csk-test"),
            (MODEL_VAR, "llama3.1-8b"),
        ]))
        .unwrap()
        .with_overrides(Some("  ".to_string()), None)
        .unwrap();
        assert_eq!(config.model, "llama3.1-8b");
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "csk-test")]))
            .unwrap()
            .with_overrides(None, Some(3.5));
        assert!(matches!(result, Err(ConfigError::InvalidTemperature(_))));
    }
}
