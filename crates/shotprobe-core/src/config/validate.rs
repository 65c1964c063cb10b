//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.target == 0 {
            return Err(ConfigError::ValidationError(
                "probe.target must be > 0".into(),
            ));
        }
        if self.probe.workers == 0 {
            return Err(ConfigError::ValidationError(
                "probe.workers must be > 0".into(),
            ));
        }
        if self.probe.id_length == 0 {
            return Err(ConfigError::ValidationError(
                "probe.id_length must be > 0".into(),
            ));
        }
        if self.probe.max_attempts == Some(0) {
            return Err(ConfigError::ValidationError(
                "probe.max_attempts must be > 0 when set".into(),
            ));
        }
        if self.remote.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "remote.base_url must not be empty".into(),
            ));
        }
        if self.limits.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.request_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.ocr_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.ocr_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.max_image_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_target() {
        let mut config = Config::default();
        config.probe.target = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("probe.target"));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.probe.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("probe.workers"));
    }

    #[test]
    fn test_validate_rejects_zero_max_attempts() {
        let mut config = Config::default();
        config.probe.max_attempts = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));

        config.probe.max_attempts = Some(50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.limits.request_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }
}
