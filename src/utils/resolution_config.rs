// src/utils/resolution_config.rs
//! Configuration for the resolution core: which columns form the composite
//! key and how dense a neighbourhood must be to form a group.

use anyhow::{bail, Result};
use log::{debug, info, warn};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::utils::constants::{DEFAULT_EPS, DEFAULT_KEY_FIELDS, DEFAULT_MIN_SAMPLES};

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionConfig {
    /// Ordered list of columns concatenated into the composite key.
    pub fields: Vec<String>,
    /// Neighbourhood radius, as a cosine distance.
    pub eps: f64,
    /// Minimum neighbourhood size, the point itself included.
    pub min_samples: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            fields: DEFAULT_KEY_FIELDS.iter().map(|f| f.to_string()).collect(),
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

impl ResolutionConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fields = env::var("RESOLUTION_FIELDS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|fields| !fields.is_empty())
            .unwrap_or(defaults.fields);

        let eps = parse_env_or("RESOLUTION_EPS", DEFAULT_EPS);
        let min_samples = parse_env_or("RESOLUTION_MIN_SAMPLES", DEFAULT_MIN_SAMPLES);

        debug!(
            "Resolution config: fields={:?}, eps={}, min_samples={}",
            fields, eps, min_samples
        );

        Self {
            fields,
            eps,
            min_samples,
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            bail!("At least one key field must be configured");
        }
        if !self.eps.is_finite() || self.eps < 0.0 {
            bail!("eps must be a finite, non-negative cosine distance (got {})", self.eps);
        }
        if self.min_samples == 0 {
            bail!("min_samples must be at least 1");
        }
        Ok(())
    }

    pub fn log_config(&self) {
        info!("🔑 Composite key fields ({}): {:?}", self.fields.len(), self.fields);
        info!(
            "🧭 Density grouping: eps={} (cosine distance), min_samples={}",
            self.eps, self.min_samples
        );
    }
}

/// Reads `name` and parses it. An unset variable yields `default` silently;
/// a set but unparseable one yields `default` with a warning.
fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "Ignoring {}={:?}: not a valid value, using default {}",
                    name, raw, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = ResolutionConfig::default();
        assert_eq!(config.fields.len(), 7);
        assert_eq!(config.fields[0], "company_name");
        assert_eq!(config.fields[6], "generated_business_tags");
        assert_eq!(config.eps, 0.2);
        assert_eq!(config.min_samples, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_config() {
        env::set_var("RESOLUTION_FIELDS", "company_name, short_description,,");
        env::set_var("RESOLUTION_EPS", "0.35");
        env::set_var("RESOLUTION_MIN_SAMPLES", "2");

        let config = ResolutionConfig::from_env();
        assert_eq!(config.fields, vec!["company_name", "short_description"]);
        assert_eq!(config.eps, 0.35);
        assert_eq!(config.min_samples, 2);

        env::set_var("RESOLUTION_EPS", "not-a-number");
        env::set_var("RESOLUTION_FIELDS", " , ");
        let config = ResolutionConfig::from_env();
        assert_eq!(config.eps, DEFAULT_EPS);
        assert_eq!(config.fields.len(), 7);

        // Clean up
        env::remove_var("RESOLUTION_FIELDS");
        env::remove_var("RESOLUTION_EPS");
        env::remove_var("RESOLUTION_MIN_SAMPLES");
    }

    #[test]
    fn test_parse_env_or_falls_back_on_unparseable_values() {
        let name = "RESOLUTION_CONFIG_TEST_VALUE";
        env::remove_var(name);
        assert_eq!(parse_env_or(name, 3usize), 3);

        env::set_var(name, " 5 ");
        assert_eq!(parse_env_or(name, 3usize), 5);

        env::set_var(name, "five");
        assert_eq!(parse_env_or(name, 3usize), 3);
        env::set_var(name, "-1");
        assert_eq!(parse_env_or(name, 3usize), 3);
        assert_eq!(parse_env_or(name, 0.2f64), -1.0);

        env::remove_var(name);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(ResolutionConfig::default().with_eps(-0.1).validate().is_err());
        assert!(ResolutionConfig::default().with_eps(f64::NAN).validate().is_err());
        assert!(ResolutionConfig::default().with_min_samples(0).validate().is_err());
        let no_fields: Vec<String> = Vec::new();
        assert!(ResolutionConfig::default().with_fields(no_fields).validate().is_err());
        assert!(ResolutionConfig::default()
            .with_fields(["company_name"])
            .with_eps(0.0)
            .with_min_samples(1)
            .validate()
            .is_ok());
    }
}
