use memory_augment_retrieval::{RetryPolicy, ServiceConfig};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MAX_BLOCK_LENGTH: usize = 5000;
pub const DEFAULT_RESULT_LIMIT: usize = 5;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:21956";

/// Everything the pipeline and service need, built once at startup.
#[derive(Debug, Clone)]
pub struct AugmentConfig {
    pub graph: ServiceConfig,
    pub events: ServiceConfig,
    pub papers: ServiceConfig,
    pub store: ServiceConfig,
    pub retry: RetryPolicy,
    /// Character bound for every block value (before the truncation marker)
    pub max_block_length: usize,
    /// Snippets requested from each source
    pub result_limit: usize,
    /// Knowledge-graph groups to search; empty searches all groups
    pub group_filter: Vec<String>,
    pub bind_addr: String,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            graph: ServiceConfig::new("http://127.0.0.1:8000"),
            events: ServiceConfig::new("http://127.0.0.1:8001"),
            papers: ServiceConfig::new("http://127.0.0.1:8002"),
            store: ServiceConfig::new("http://127.0.0.1:8283"),
            retry: RetryPolicy::default(),
            max_block_length: DEFAULT_MAX_BLOCK_LENGTH,
            result_limit: DEFAULT_RESULT_LIMIT,
            group_filter: Vec::new(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AugmentConfig {
    /// Apply one timeout to every collaborator.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        for service in [
            &mut self.graph,
            &mut self.events,
            &mut self.papers,
            &mut self.store,
        ] {
            service.timeout = timeout;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_block_length == 0 {
            return Err(ConfigError::Zero("max_block_length"));
        }
        if self.result_limit == 0 {
            return Err(ConfigError::Zero("result_limit"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Zero("retry max_attempts"));
        }

        for (name, service) in [
            ("knowledge-graph", &self.graph),
            ("event-data", &self.events),
            ("paper-index", &self.papers),
            ("memory-store", &self.store),
        ] {
            if service.base_url.trim().is_empty() {
                return Err(ConfigError::EmptyUrl(name));
            }
            if service.timeout.is_zero() {
                return Err(ConfigError::Zero("timeout"));
            }
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AugmentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.graph.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_with_timeout_applies_everywhere() {
        let config = AugmentConfig::default().with_timeout(Duration::from_secs(10));
        for service in [&config.graph, &config.events, &config.papers, &config.store] {
            assert_eq!(service.timeout, Duration::from_secs(10));
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AugmentConfig {
            max_block_length: 0,
            ..AugmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero("max_block_length"))
        ));

        let mut config = AugmentConfig::default();
        config.papers.base_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyUrl("paper-index"))
        ));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }
}
