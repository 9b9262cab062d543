use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::synthesis::generator::{GeneratorConfig, DEFAULT_MAX_STEPS};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_weights_path: PathBuf,
    pub styles_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    /// Lines generated concurrently.
    pub worker_limit: usize,
    /// Wall-clock budget per line. Unset means no deadline.
    pub generation_timeout: Option<Duration>,
    pub max_generation_steps: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let worker_default = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Ok(Config {
            model_weights_path: require(&lookup, "MODEL_WEIGHTS_PATH")?.into(),
            styles_dir: lookup("STYLES_DIR")
                .unwrap_or_else(|| "resources/styles".to_string())
                .into(),
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            worker_limit: parse_or(&lookup, "WORKER_LIMIT", worker_default)?.max(1),
            generation_timeout: lookup("GENERATION_TIMEOUT_SECS")
                .map(|raw| {
                    raw.parse::<f64>()
                        .ok()
                        .filter(|secs| *secs > 0.0)
                        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                        .with_context(|| {
                            format!("GENERATION_TIMEOUT_SECS must be a positive number of seconds, got '{raw}'")
                        })
                })
                .transpose()?,
            max_generation_steps: parse_or(&lookup, "MAX_GENERATION_STEPS", DEFAULT_MAX_STEPS)?,
        })
    }

    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            max_steps: self.max_generation_steps,
            ..GeneratorConfig::default()
        }
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(make_lookup(&[("MODEL_WEIGHTS_PATH", "weights.json")])).unwrap();
        assert_eq!(config.model_weights_path, PathBuf::from("weights.json"));
        assert_eq!(config.styles_dir, PathBuf::from("resources/styles"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert!(config.worker_limit >= 1);
        assert_eq!(config.generation_timeout, None);
        assert_eq!(config.max_generation_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn test_weights_path_is_required() {
        let err = Config::from_lookup(make_lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("MODEL_WEIGHTS_PATH"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(make_lookup(&[
            ("MODEL_WEIGHTS_PATH", "/models/w.json"),
            ("STYLES_DIR", "/styles"),
            ("PORT", "9000"),
            ("WORKER_LIMIT", "0"),
            ("GENERATION_TIMEOUT_SECS", "2.5"),
            ("MAX_GENERATION_STEPS", "1200"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.worker_limit, 1);
        assert_eq!(config.generation_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.generator().max_steps, 1200);
        assert_eq!(
            config.generator().max_steps_per_character,
            GeneratorConfig::default().max_steps_per_character
        );
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let bad_port = make_lookup(&[("MODEL_WEIGHTS_PATH", "w.json"), ("PORT", "eighty")]);
        assert!(Config::from_lookup(bad_port).unwrap_err().to_string().contains("PORT"));

        let bad_timeout = make_lookup(&[("MODEL_WEIGHTS_PATH", "w.json"), ("GENERATION_TIMEOUT_SECS", "-1")]);
        assert!(Config::from_lookup(bad_timeout)
            .unwrap_err()
            .to_string()
            .contains("GENERATION_TIMEOUT_SECS"));
    }

    #[test]
    fn test_timeout_beyond_duration_range_is_an_error() {
        for raw in ["1e300", "inf", "NaN"] {
            let lookup = make_lookup(&[("MODEL_WEIGHTS_PATH", "w.json"), ("GENERATION_TIMEOUT_SECS", raw)]);
            let err = Config::from_lookup(lookup).unwrap_err();
            assert!(err.to_string().contains("GENERATION_TIMEOUT_SECS"), "{raw}: {err}");
        }
    }
}
