use std::time::Duration;

use crate::errors::{EntropyError, Result};

/// Configuration for an entropy audit run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rpc_url: String,
    pub samples: usize,
    pub timeout: Duration,
    pub player: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            samples: 100,
            timeout: Duration::from_secs(30),
            player: None,
        }
    }
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Overlay the defaults with whatever `lookup` yields for each `JJ_*` key.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let rpc_url = lookup("JJ_RPC_URL").unwrap_or(defaults.rpc_url);

        let samples = match lookup("JJ_SAMPLES") {
            Some(raw) => parse_var("JJ_SAMPLES", &raw)?,
            None => defaults.samples,
        };

        let timeout = match lookup("JJ_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("JJ_TIMEOUT_SECS", &raw)?),
            None => defaults.timeout,
        };

        let player = lookup("JJ_PLAYER").or(defaults.player);

        Ok(Self {
            rpc_url,
            samples,
            timeout,
            player,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| EntropyError::Config(format!("{key}={raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_vars(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.samples, 100);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_vars(lookup_from(&[
            ("JJ_RPC_URL", "https://nova.arbitrum.io/rpc"),
            ("JJ_SAMPLES", "250"),
            ("JJ_TIMEOUT_SECS", " 5 "),
            ("JJ_PLAYER", "0x000000000000000000000000000000000000dEaD"),
        ]))
        .unwrap();

        assert_eq!(config.rpc_url, "https://nova.arbitrum.io/rpc");
        assert_eq!(config.samples, 250);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.player.as_deref(),
            Some("0x000000000000000000000000000000000000dEaD")
        );
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let err = Config::from_vars(lookup_from(&[("JJ_SAMPLES", "lots")])).unwrap_err();
        assert!(matches!(err, EntropyError::Config(_)));
        assert!(err.to_string().contains("JJ_SAMPLES"));
    }
}
